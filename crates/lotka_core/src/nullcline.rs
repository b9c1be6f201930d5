//! Zero-growth lines of each species, clipped to the plotted region.
//!
//! Prey stop growing on `x = 0` and `y = alpha / beta`; predators on
//! `y = 0` and `x = gamma / delta`. The axis lines coincide with the plot
//! frame and are left out.

use crate::figure::Viewport;
use crate::model::Parameters;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Prey,
    Predator,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nullcline {
    pub species: Species,
    pub start: [f64; 2],
    pub end: [f64; 2],
}

pub fn nullclines(params: &Parameters, viewport: &Viewport) -> Vec<Nullcline> {
    let mut lines = Vec::with_capacity(2);

    let prey_level = params.alpha / params.beta;
    if prey_level.is_finite() && (0.0..=viewport.y_max).contains(&prey_level) {
        lines.push(Nullcline {
            species: Species::Prey,
            start: [0.0, prey_level],
            end: [viewport.x_max, prey_level],
        });
    }

    let predator_level = params.gamma / params.delta;
    if predator_level.is_finite() && (0.0..=viewport.x_max).contains(&predator_level) {
        lines.push(Nullcline {
            species: Species::Predator,
            start: [predator_level, 0.0],
            end: [predator_level, viewport.y_max],
        });
    }

    lines
}
