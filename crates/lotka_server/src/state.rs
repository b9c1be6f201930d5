use lotka_core::dashboard::DashboardOptions;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub options: DashboardOptions,
    pub started: Instant,
}

impl AppState {
    pub fn new(options: DashboardOptions) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                options,
                started: Instant::now(),
            }),
        }
    }
}

impl Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
