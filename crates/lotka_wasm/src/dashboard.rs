//! Client-side dashboard session.

use lotka_core::dashboard::{Dashboard, DashboardOptions};
use lotka_core::figure::FigureOptions;
use lotka_core::model::ParameterKind;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmDashboard {
    inner: Dashboard,
}

#[wasm_bindgen]
impl WasmDashboard {
    #[wasm_bindgen(constructor)]
    pub fn new(show_nullclines: bool) -> WasmDashboard {
        console_error_panic_hook::set_once();

        let options = DashboardOptions {
            figure: FigureOptions {
                nullclines: show_nullclines,
                ..FigureOptions::default()
            },
            ..DashboardOptions::default()
        };
        WasmDashboard {
            inner: Dashboard::new(options),
        }
    }

    pub fn slider_specs(&self) -> Result<JsValue, JsValue> {
        to_value(&self.inner.sliders())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// `name` accepts `alpha`, `α` or a slider id such as `alpha-slider`.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), JsValue> {
        let kind: ParameterKind = name.parse().map_err(|e| js_error(&e))?;
        self.inner
            .set_parameter(kind, value)
            .map_err(|e| js_error(&e))
    }

    pub fn show_nullclines(&mut self, enabled: bool) {
        self.inner.options_mut().figure.nullclines = enabled;
    }

    pub fn render(&self) -> Result<JsValue, JsValue> {
        let output = self
            .inner
            .render()
            .map_err(|e| JsValue::from_str(&format!("Render failed: {:#}", e)))?;
        to_value(&output).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn click(&mut self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        let output = self
            .inner
            .click(x, y)
            .map_err(|e| JsValue::from_str(&format!("Click rejected: {:#}", e)))?;
        to_value(&output).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// `[prey, predators]` currently in the store.
    pub fn initial_conditions(&self) -> Vec<f64> {
        self.inner.state().initial_conditions.to_array().to_vec()
    }

    /// `[alpha, beta, gamma, delta]`
    pub fn parameters(&self) -> Vec<f64> {
        self.inner.parameters().to_array().to_vec()
    }
}

fn js_error(err: &dyn std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_dashboard_starts_from_defaults() {
        let dashboard = WasmDashboard::new(false);
        assert_eq!(dashboard.parameters(), vec![1.0, 0.1, 1.5, 0.075]);
        assert_eq!(dashboard.initial_conditions(), vec![10.0, 5.0]);
    }

    #[test]
    fn set_parameter_accepts_names_and_slider_ids() {
        let mut dashboard = WasmDashboard::new(false);
        dashboard.set_parameter("alpha", 1.5).expect("alpha");
        dashboard.set_parameter("delta-slider", 0.05).expect("delta");
        assert_eq!(dashboard.parameters(), vec![1.5, 0.1, 1.5, 0.05]);

        dashboard.reset();
        assert_eq!(dashboard.parameters(), vec![1.0, 0.1, 1.5, 0.075]);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn set_parameter_rejects_unknown_names() {
        let mut dashboard = WasmDashboard::new(false);
        assert!(dashboard.set_parameter("omega", 1.0).is_err());
        assert!(dashboard.set_parameter("beta", 3.0).is_err());
    }

    #[wasm_bindgen_test]
    fn click_updates_the_store() {
        let mut dashboard = WasmDashboard::new(true);
        assert!(dashboard.click(30.0, 20.0).is_ok());
        assert_eq!(dashboard.initial_conditions(), vec![30.0, 20.0]);
        assert!(dashboard.render().is_ok());
    }
}
