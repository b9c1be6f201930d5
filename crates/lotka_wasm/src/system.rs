//! Core WASM system wrapper and low-level utilities.

use lotka_core::analysis::conserved_quantity;
use lotka_core::equilibrium::{analyze_equilibria, jacobian};
use lotka_core::model::{LotkaVolterra, Parameters};
use lotka_core::solvers::{Tsit5, RK4};
use lotka_core::traits::Steppable;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSystem {
    system: LotkaVolterra,
    state: Vec<f64>,
    t: f64,
    solver: SolverType,
}

enum SolverType {
    RK4(RK4<f64>),
    Tsit5(Tsit5<f64>),
}

/// Reads `[alpha, beta, gamma, delta]` and validates the ranges.
pub(crate) fn parameters_from_slice(values: &[f64]) -> Result<Parameters, String> {
    match values {
        [alpha, beta, gamma, delta] => {
            Parameters::new(*alpha, *beta, *gamma, *delta).map_err(|e| e.to_string())
        }
        _ => Err(format!(
            "Expected 4 parameters [alpha, beta, gamma, delta], got {}.",
            values.len()
        )),
    }
}

pub(crate) fn state_from_slice(values: &[f64]) -> Result<[f64; 2], String> {
    match values {
        [prey, predators] => Ok([*prey, *predators]),
        _ => Err(format!(
            "Expected state [prey, predators], got {} values.",
            values.len()
        )),
    }
}

#[wasm_bindgen]
impl WasmSystem {
    #[wasm_bindgen(constructor)]
    pub fn new(params: Vec<f64>, solver_name: &str) -> Result<WasmSystem, JsValue> {
        console_error_panic_hook::set_once();

        let params = parameters_from_slice(&params).map_err(|e| JsValue::from_str(&e))?;
        let system = LotkaVolterra::new(params).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let solver = match solver_name {
            "rk4" => SolverType::RK4(RK4::new(2)),
            "tsit5" => SolverType::Tsit5(Tsit5::new(2)),
            _ => return Err(JsValue::from_str("Unknown solver")),
        };

        Ok(WasmSystem {
            system,
            state: vec![0.0; 2],
            t: 0.0,
            solver,
        })
    }

    /// Expects `[prey, predators]`.
    pub fn set_state(&mut self, state: &[f64]) -> Result<(), JsValue> {
        let state = state_from_slice(state).map_err(|e| JsValue::from_str(&e))?;
        self.state = state.to_vec();
        Ok(())
    }

    pub fn get_state(&self) -> Vec<f64> {
        self.state.clone()
    }

    pub fn set_t(&mut self, t: f64) {
        self.t = t;
    }

    pub fn get_t(&self) -> f64 {
        self.t
    }

    pub fn step(&mut self, dt: f64) {
        match &mut self.solver {
            SolverType::RK4(s) => s.step(&self.system, &mut self.t, &mut self.state, dt),
            SolverType::Tsit5(s) => s.step(&self.system, &mut self.t, &mut self.state, dt),
        }
    }

    /// Row-major 2x2 Jacobian at the current state.
    pub fn compute_jacobian(&self) -> Vec<f64> {
        let j = jacobian(self.system.params(), [self.state[0], self.state[1]]);
        vec![j[0][0], j[0][1], j[1][0], j[1][1]]
    }

    /// First integral at the current state; NaN off the positive quadrant.
    pub fn conserved_quantity(&self) -> f64 {
        conserved_quantity(self.system.params(), self.state[0], self.state[1])
    }

    pub fn equilibria(&self) -> Result<JsValue, JsValue> {
        let reports = analyze_equilibria(self.system.params())
            .map_err(|e| JsValue::from_str(&format!("Equilibrium analysis failed: {}", e)))?;
        to_value(&reports).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
