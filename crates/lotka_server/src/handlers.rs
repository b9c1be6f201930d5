use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use lotka_core::dashboard::{slider_specs, ClickPoint, DashboardOutput, SliderSpec};
use lotka_core::equilibrium::{analyze_equilibria, EquilibriumReport};
use lotka_core::{update, DashboardInput, DashboardState, InitialConditions, Parameters};
use serde::{Deserialize, Serialize};
use tracing::info;

const INDEX_HTML: &str = include_str!("../assets/index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Slider layout at the default parameter values.
pub async fn controls() -> Json<Vec<SliderSpec>> {
    Json(slider_specs(&Parameters::default()))
}

/// The stored initial condition travels with every request and comes back
/// in the response, so the server keeps no per-session state.
#[derive(Debug, Deserialize)]
pub struct PhasePlotRequest {
    pub parameters: Parameters,
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub click: Option<ClickPoint>,
    /// Overrides the configured nullcline layer.
    #[serde(default)]
    pub nullclines: Option<bool>,
}

pub async fn phase_plot(
    State(state): State<AppState>,
    Json(request): Json<PhasePlotRequest>,
) -> Result<Json<DashboardOutput>, ApiError> {
    let mut options = state.options;
    if let Some(show) = request.nullclines {
        options.figure.nullclines = show;
    }
    let input = DashboardInput {
        parameters: request.parameters,
        click: request.click,
    };
    let store = DashboardState {
        initial_conditions: request.initial_conditions,
    };

    if let Some(point) = request.click {
        info!(x = point.x, y = point.y, "phase plot clicked");
    }

    let output = tokio::task::spawn_blocking(move || update(&input, &store, &options))
        .await
        .map_err(|err| ApiError::Internal(format!("solver task failed: {err}")))??;
    Ok(Json(output))
}

pub async fn equilibria(
    Query(parameters): Query<Parameters>,
) -> Result<Json<Vec<EquilibriumReport>>, ApiError> {
    Ok(Json(analyze_equilibria(&parameters)?))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Seconds since the server started.
    pub uptime: u64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started.elapsed().as_secs(),
    })
}
