//! Stateless helpers: trajectories and equilibria for a parameter vector.

use crate::system::parameters_from_slice;
use lotka_core::equilibrium::analyze_equilibria;
use lotka_core::model::InitialConditions;
use lotka_core::trajectory::{solve_trajectory as core_solve, SolverChoice, TimeGrid};
use js_sys::Float64Array;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

/// Samples a trajectory and returns it interleaved as `[t0, x0, y0, t1, x1, y1, ...]`.
#[wasm_bindgen]
pub fn solve_trajectory(
    params: Vec<f64>,
    prey: f64,
    predators: f64,
    t_end: f64,
    samples: u32,
) -> Result<Float64Array, JsValue> {
    let flat = interleaved_trajectory(&params, prey, predators, t_end, samples as usize)
        .map_err(|e| JsValue::from_str(&e))?;
    Ok(Float64Array::from(flat.as_slice()))
}

#[wasm_bindgen]
pub fn equilibria(params: Vec<f64>) -> Result<JsValue, JsValue> {
    let params = parameters_from_slice(&params).map_err(|e| JsValue::from_str(&e))?;
    let reports = analyze_equilibria(&params)
        .map_err(|e| JsValue::from_str(&format!("Equilibrium analysis failed: {}", e)))?;
    to_value(&reports).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn interleaved_trajectory(
    params: &[f64],
    prey: f64,
    predators: f64,
    t_end: f64,
    samples: usize,
) -> Result<Vec<f64>, String> {
    let params = parameters_from_slice(params)?;
    let initial = InitialConditions::new(prey, predators).map_err(|e| e.to_string())?;
    let grid = TimeGrid {
        start: 0.0,
        end: t_end,
        samples,
    };
    let trajectory = core_solve(&params, &initial, &grid, SolverChoice::default())
        .map_err(|e| format!("Trajectory computation failed: {:#}", e))?;
    Ok(trajectory
        .points()
        .flat_map(|(t, x, y)| [t, x, y])
        .collect())
}
