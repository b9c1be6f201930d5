//! The dashboard callback: slider values and phase-plot clicks in, figure
//! and updated initial-condition store out.

use crate::analysis::{summarize, PopulationSummary};
use crate::figure::{phase_figure, Figure, FigureOptions, Viewport};
use crate::model::{InitialConditions, ParameterKind, Parameters};
use crate::trajectory::{solve_trajectory, SolverChoice, TimeGrid};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderMark {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderSpec {
    pub id: String,
    pub parameter: ParameterKind,
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub value: f64,
    pub marks: Vec<SliderMark>,
}

/// One slider per parameter, positioned at the values in `current`.
pub fn slider_specs(current: &Parameters) -> Vec<SliderSpec> {
    ParameterKind::ALL
        .iter()
        .map(|&kind| {
            let range = kind.range();
            SliderSpec {
                id: format!("{}-slider", kind.name()),
                parameter: kind,
                label: kind.label().to_string(),
                min: range.min,
                max: range.max,
                step: range.step,
                value: current.get(kind),
                marks: range
                    .marks()
                    .into_iter()
                    .map(|value| SliderMark {
                        value,
                        label: value.to_string(),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// A point picked on the phase plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickPoint {
    pub x: f64,
    pub y: f64,
}

/// Client-held store of the initial condition the plot was last drawn from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub initial_conditions: InitialConditions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashboardInput {
    pub parameters: Parameters,
    #[serde(default)]
    pub click: Option<ClickPoint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardOptions {
    pub grid: TimeGrid,
    pub solver: SolverChoice,
    pub viewport: Viewport,
    pub figure: FigureOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardOutput {
    pub figure: Figure,
    /// New value of the store.
    pub initial_conditions: InitialConditions,
    pub summary: PopulationSummary,
}

/// Recomputes the plot. A click replaces the stored initial condition;
/// without one the stored value is reused.
pub fn update(
    input: &DashboardInput,
    state: &DashboardState,
    options: &DashboardOptions,
) -> Result<DashboardOutput> {
    input.parameters.validate()?;

    let initial = match input.click {
        Some(point) => InitialConditions::new(point.x, point.y).inspect_err(|err| {
            warn!(x = point.x, y = point.y, %err, "rejected phase plot click");
        })?,
        None => state.initial_conditions,
    };

    let trajectory = solve_trajectory(&input.parameters, &initial, &options.grid, options.solver)
        .context("Failed to solve the Lotka-Volterra system.")?;
    let summary = summarize(&trajectory, &input.parameters);
    let figure = phase_figure(
        &trajectory,
        &initial,
        &input.parameters,
        &options.viewport,
        &options.figure,
    );

    debug!(
        prey = initial.prey,
        predators = initial.predators,
        clicked = input.click.is_some(),
        "dashboard updated"
    );

    Ok(DashboardOutput {
        figure,
        initial_conditions: initial,
        summary,
    })
}

/// Stateful front for clients that keep the session on this side, such as
/// the WASM bridge.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    parameters: Parameters,
    state: DashboardState,
    options: DashboardOptions,
}

impl Dashboard {
    pub fn new(options: DashboardOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn options_mut(&mut self) -> &mut DashboardOptions {
        &mut self.options
    }

    pub fn sliders(&self) -> Vec<SliderSpec> {
        slider_specs(&self.parameters)
    }

    pub fn set_parameter(&mut self, kind: ParameterKind, value: f64) -> Result<()> {
        self.parameters.set(kind, value)?;
        Ok(())
    }

    /// Redraws from the stored initial condition.
    pub fn render(&self) -> Result<DashboardOutput> {
        let input = DashboardInput {
            parameters: self.parameters,
            click: None,
        };
        update(&input, &self.state, &self.options)
    }

    /// Redraws from a clicked point and commits it to the store on success.
    pub fn click(&mut self, x: f64, y: f64) -> Result<DashboardOutput> {
        let input = DashboardInput {
            parameters: self.parameters,
            click: Some(ClickPoint { x, y }),
        };
        let output = update(&input, &self.state, &self.options)?;
        self.state.initial_conditions = output.initial_conditions;
        Ok(output)
    }

    /// Back to default parameters and the default initial condition.
    pub fn reset(&mut self) {
        self.parameters = Parameters::default();
        self.state = DashboardState::default();
    }
}
