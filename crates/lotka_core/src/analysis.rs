//! Checks and summaries computed from a solved [`Trajectory`].

use crate::model::Parameters;
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// First integral of the model, constant along every orbit with `x, y > 0`:
/// `H = delta*x - gamma*ln(x) + beta*y - alpha*ln(y)`.
///
/// Returns NaN outside the open positive quadrant.
pub fn conserved_quantity(params: &Parameters, prey: f64, predators: f64) -> f64 {
    if !(prey > 0.0 && predators > 0.0) {
        return f64::NAN;
    }
    params.delta * prey - params.gamma * prey.ln() + params.beta * predators
        - params.alpha * predators.ln()
}

/// Largest deviation of `H` from its initial value, relative to `max(|H(0)|, 1)`.
///
/// Returns NaN when the trajectory touches an axis (where `H` is undefined).
pub fn invariant_drift(params: &Parameters, trajectory: &Trajectory) -> f64 {
    let mut points = trajectory.points();
    let Some((_, x0, y0)) = points.next() else {
        return 0.0;
    };
    let h0 = conserved_quantity(params, x0, y0);
    if h0.is_nan() {
        return f64::NAN;
    }
    let scale = h0.abs().max(1.0);
    let mut drift = 0.0f64;
    for (_, x, y) in points {
        let deviation = (conserved_quantity(params, x, y) - h0).abs() / scale;
        if deviation.is_nan() {
            return f64::NAN;
        }
        drift = drift.max(deviation);
    }
    drift
}

/// Period of small oscillations around the coexistence point, `2*pi / sqrt(alpha*gamma)`.
pub fn linearized_period(params: &Parameters) -> f64 {
    2.0 * PI / (params.alpha * params.gamma).sqrt()
}

/// Estimates the oscillation period from upward crossings of the prey
/// series through its equilibrium value `gamma / delta`.
///
/// Needs at least two crossings.
pub fn estimate_period(trajectory: &Trajectory, params: &Parameters) -> Option<f64> {
    let level = params.gamma / params.delta;
    let mut crossings = Vec::new();
    for i in 1..trajectory.len() {
        let (a, b) = (trajectory.prey[i - 1], trajectory.prey[i]);
        if a < level && b >= level {
            let (t0, t1) = (trajectory.times[i - 1], trajectory.times[i]);
            let fraction = (level - a) / (b - a);
            crossings.push(t0 + fraction * (t1 - t0));
        }
    }
    match (crossings.first(), crossings.last()) {
        (Some(first), Some(last)) if crossings.len() >= 2 => {
            Some((last - first) / (crossings.len() - 1) as f64)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub prey_min: f64,
    pub prey_max: f64,
    pub predator_min: f64,
    pub predator_max: f64,
    pub period: Option<f64>,
}

pub fn summarize(trajectory: &Trajectory, params: &Parameters) -> PopulationSummary {
    let (prey_min, prey_max) = min_max(&trajectory.prey);
    let (predator_min, predator_max) = min_max(&trajectory.predators);
    PopulationSummary {
        prey_min,
        prey_max,
        predator_min,
        predator_max,
        period: estimate_period(trajectory, params),
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
