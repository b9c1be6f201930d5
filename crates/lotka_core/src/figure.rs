//! Phase-space figure in Plotly's JSON schema.
//!
//! The front end hands the serialized [`Figure`] straight to `Plotly.react`,
//! so field names here follow Plotly, not Rust conventions.

use crate::model::{InitialConditions, Parameters};
use crate::nullcline::{nullclines, Species};
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};

pub const TITLE: &str = "Lotka-Volterra Phase Space";
pub const X_AXIS_TITLE: &str = "Prey Population";
pub const Y_AXIS_TITLE: &str = "Predator Population";

/// Visible region of the phase plane and density of the click grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x_max: f64,
    pub y_max: f64,
    /// Click targets per axis.
    pub grid: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x_max: 100.0,
            y_max: 100.0,
            grid: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureOptions {
    /// Invisible markers that make any point of the plane clickable.
    pub click_grid: bool,
    pub nullclines: bool,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            click_grid: true,
            nullclines: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<ScatterTrace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
    Markers,
    Lines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterTrace {
    #[serde(rename = "type")]
    pub trace_type: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub mode: TraceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showlegend: Option<bool>,
}

impl ScatterTrace {
    fn new(x: Vec<f64>, y: Vec<f64>, mode: TraceMode) -> Self {
        Self {
            trace_type: "scatter".to_string(),
            x,
            y,
            mode,
            name: None,
            marker: None,
            line: None,
            showlegend: None,
        }
    }

    fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub color: String,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
}

impl From<&str> for Title {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: Title,
    pub range: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub showlegend: bool,
    pub clickmode: String,
}

fn linspace(max: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..count)
            .map(|i| max * i as f64 / (count - 1) as f64)
            .collect(),
    }
}

/// Row-major flattening of the `grid x grid` mesh over the viewport.
fn click_grid(viewport: &Viewport) -> ScatterTrace {
    let xs = linspace(viewport.x_max, viewport.grid);
    let ys = linspace(viewport.y_max, viewport.grid);
    let mut x = Vec::with_capacity(xs.len() * ys.len());
    let mut y = Vec::with_capacity(xs.len() * ys.len());
    for &gy in &ys {
        for &gx in &xs {
            x.push(gx);
            y.push(gy);
        }
    }
    let mut trace = ScatterTrace::new(x, y, TraceMode::Markers);
    trace.marker = Some(Marker {
        color: "rgba(0,0,0,0)".to_string(),
        size: 1.0,
    });
    trace.showlegend = Some(false);
    trace
}

pub fn phase_figure(
    trajectory: &Trajectory,
    initial: &InitialConditions,
    params: &Parameters,
    viewport: &Viewport,
    options: &FigureOptions,
) -> Figure {
    let mut data = Vec::with_capacity(5);

    if options.click_grid {
        data.push(click_grid(viewport));
    }

    let mut path = ScatterTrace::new(
        trajectory.prey.clone(),
        trajectory.predators.clone(),
        TraceMode::Lines,
    )
    .named("Trajectory");
    path.line = Some(Line {
        color: "blue".to_string(),
        dash: None,
    });
    data.push(path);

    let mut start = ScatterTrace::new(
        vec![initial.prey],
        vec![initial.predators],
        TraceMode::Markers,
    )
    .named("Initial Condition");
    start.marker = Some(Marker {
        color: "red".to_string(),
        size: 10.0,
    });
    data.push(start);

    if options.nullclines {
        for line in nullclines(params, viewport) {
            let (name, color) = match line.species {
                Species::Prey => ("Prey Nullcline", "green"),
                Species::Predator => ("Predator Nullcline", "orange"),
            };
            let mut trace = ScatterTrace::new(
                vec![line.start[0], line.end[0]],
                vec![line.start[1], line.end[1]],
                TraceMode::Lines,
            )
            .named(name);
            trace.line = Some(Line {
                color: color.to_string(),
                dash: Some("dash".to_string()),
            });
            data.push(trace);
        }
    }

    Figure {
        data,
        layout: Layout {
            title: TITLE.into(),
            xaxis: Axis {
                title: X_AXIS_TITLE.into(),
                range: [0.0, viewport.x_max],
            },
            yaxis: Axis {
                title: Y_AXIS_TITLE.into(),
                range: [0.0, viewport.y_max],
            },
            showlegend: true,
            clickmode: "event".to_string(),
        },
    }
}
