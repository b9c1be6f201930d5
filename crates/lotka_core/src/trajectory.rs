use crate::model::{InitialConditions, LotkaVolterra, Parameters};
use crate::solvers::{AdaptiveSettings, AdaptiveTsit5, Tsit5, RK4};
use crate::traits::{DynamicalSystem, Steppable};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Evenly spaced output times, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeGrid {
    pub start: f64,
    pub end: f64,
    pub samples: usize,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 100.0,
            samples: 1000,
        }
    }
}

impl TimeGrid {
    pub fn validate(&self) -> Result<()> {
        if self.samples < 2 {
            bail!("Time grid needs at least 2 samples, got {}.", self.samples);
        }
        if !self.start.is_finite() || !self.end.is_finite() || self.end <= self.start {
            bail!(
                "Time grid bounds must be finite with end > start (got [{}, {}]).",
                self.start,
                self.end
            );
        }
        Ok(())
    }

    pub fn time(&self, index: usize) -> f64 {
        if index + 1 >= self.samples {
            return self.end;
        }
        let spacing = (self.end - self.start) / (self.samples - 1) as f64;
        self.start + index as f64 * spacing
    }

    pub fn times(&self) -> Vec<f64> {
        (0..self.samples).map(|i| self.time(i)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SolverChoice {
    /// Fixed-step RK4 with `substeps` steps per output interval.
    Rk4 { substeps: usize },
    /// Fixed-step Tsit5 with `substeps` steps per output interval.
    Tsit5 { substeps: usize },
    Adaptive(AdaptiveSettings),
}

impl Default for SolverChoice {
    fn default() -> Self {
        SolverChoice::Adaptive(AdaptiveSettings::default())
    }
}

impl SolverChoice {
    pub fn name(&self) -> &'static str {
        match self {
            SolverChoice::Rk4 { .. } => "rk4",
            SolverChoice::Tsit5 { .. } => "tsit5",
            SolverChoice::Adaptive(_) => "adaptive-tsit5",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            SolverChoice::Rk4 { substeps } | SolverChoice::Tsit5 { substeps } if *substeps == 0 => {
                bail!("Fixed-step solvers need at least one substep per sample.")
            }
            SolverChoice::Rk4 { .. } | SolverChoice::Tsit5 { .. } => Ok(()),
            SolverChoice::Adaptive(settings) => settings.validate(),
        }
    }
}

enum Integrator {
    Rk4(RK4<f64>, usize),
    Tsit5(Tsit5<f64>, usize),
    Adaptive(AdaptiveTsit5),
}

impl Integrator {
    fn build(choice: SolverChoice, dim: usize) -> Result<Self> {
        choice.validate()?;
        match choice {
            SolverChoice::Rk4 { substeps } => Ok(Integrator::Rk4(RK4::new(dim), substeps)),
            SolverChoice::Tsit5 { substeps } => Ok(Integrator::Tsit5(Tsit5::new(dim), substeps)),
            SolverChoice::Adaptive(settings) => {
                Ok(Integrator::Adaptive(AdaptiveTsit5::new(dim, settings)?))
            }
        }
    }

    fn advance(
        &mut self,
        system: &impl DynamicalSystem<f64>,
        t: &mut f64,
        state: &mut [f64],
        t_end: f64,
    ) -> Result<()> {
        match self {
            Integrator::Rk4(s, substeps) => fixed_steps(s, *substeps, system, t, state, t_end),
            Integrator::Tsit5(s, substeps) => fixed_steps(s, *substeps, system, t, state, t_end),
            Integrator::Adaptive(s) => s.integrate_to(system, t, state, t_end).map(|_| ()),
        }
    }
}

fn fixed_steps(
    solver: &mut impl Steppable<f64>,
    substeps: usize,
    system: &impl DynamicalSystem<f64>,
    t: &mut f64,
    state: &mut [f64],
    t_end: f64,
) -> Result<()> {
    let dt = (t_end - *t) / substeps as f64;
    for _ in 0..substeps {
        solver.step(system, t, state, dt);
    }
    // Pin to the grid so rounding does not accumulate across samples.
    *t = t_end;
    Ok(())
}

/// Sampled solution of the model on a [`TimeGrid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub prey: Vec<f64>,
    pub predators: Vec<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// `(t, prey, predators)` per sample.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.times
            .iter()
            .zip(&self.prey)
            .zip(&self.predators)
            .map(|((&t, &x), &y)| (t, x, y))
    }

    pub fn last(&self) -> Option<(f64, f64, f64)> {
        self.points().last()
    }
}

/// Integrates the model from `initial` and samples it on `grid`.
///
/// Sample 0 is the initial condition itself.
pub fn solve_trajectory(
    params: &Parameters,
    initial: &InitialConditions,
    grid: &TimeGrid,
    solver: SolverChoice,
) -> Result<Trajectory> {
    grid.validate()?;
    initial.validate()?;
    let system = LotkaVolterra::new(*params)?;
    let mut integrator = Integrator::build(solver, 2)?;

    let mut times = Vec::with_capacity(grid.samples);
    let mut prey = Vec::with_capacity(grid.samples);
    let mut predators = Vec::with_capacity(grid.samples);

    let mut t = grid.start;
    let mut state = initial.to_array();
    times.push(t);
    prey.push(state[0]);
    predators.push(state[1]);

    for index in 1..grid.samples {
        let target = grid.time(index);
        integrator
            .advance(&system, &mut t, &mut state, target)
            .with_context(|| format!("Integration failed between t = {} and t = {}.", t, target))?;
        if state.iter().any(|v| !v.is_finite()) {
            bail!("Integration diverged at t = {}: state is no longer finite.", target);
        }
        times.push(target);
        prey.push(state[0]);
        predators.push(state[1]);
    }

    debug!(
        solver = solver.name(),
        samples = grid.samples,
        t_end = grid.end,
        "solved Lotka-Volterra trajectory"
    );

    Ok(Trajectory {
        times,
        prey,
        predators,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn time_grid_is_inclusive_linspace() {
        let grid = TimeGrid::default();
        let times = grid.times();
        assert_eq!(times.len(), 1000);
        assert_eq!(times[0], 0.0);
        assert_eq!(times[999], 100.0);
        assert!((times[1] - 100.0 / 999.0).abs() < 1e-12);
    }

    #[test]
    fn trajectory_starts_at_initial_condition() {
        let trajectory = solve_trajectory(
            &Parameters::default(),
            &InitialConditions::default(),
            &TimeGrid::default(),
            SolverChoice::default(),
        )
        .expect("trajectory");
        assert_eq!(trajectory.len(), 1000);
        assert_eq!(trajectory.prey[0], 10.0);
        assert_eq!(trajectory.predators[0], 5.0);
        let (t_last, _, _) = trajectory.last().expect("non-empty");
        assert_eq!(t_last, 100.0);
    }

    #[test]
    fn populations_stay_positive_and_bounded() {
        let trajectory = solve_trajectory(
            &Parameters::default(),
            &InitialConditions::default(),
            &TimeGrid::default(),
            SolverChoice::default(),
        )
        .expect("trajectory");
        for (_, x, y) in trajectory.points() {
            assert!(x > 0.0 && y > 0.0);
            assert!(x < 200.0 && y < 200.0);
        }
    }

    #[test]
    fn equilibrium_start_stays_put() {
        let params = Parameters::default();
        let initial = InitialConditions::new(params.gamma / params.delta, params.alpha / params.beta)
            .expect("valid");
        let trajectory =
            solve_trajectory(&params, &initial, &TimeGrid::default(), SolverChoice::default())
                .expect("trajectory");
        for (_, x, y) in trajectory.points() {
            assert!((x - 20.0).abs() < 1e-9);
            assert!((y - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn prey_grow_exponentially_without_predators() {
        let params = Parameters::default();
        let initial = InitialConditions::new(1.0, 0.0).expect("valid");
        let grid = TimeGrid {
            start: 0.0,
            end: 5.0,
            samples: 51,
        };
        let trajectory =
            solve_trajectory(&params, &initial, &grid, SolverChoice::default()).expect("trajectory");
        let (_, x, y) = trajectory.last().expect("non-empty");
        assert_eq!(y, 0.0);
        assert!((x - 5.0_f64.exp()).abs() / 5.0_f64.exp() < 1e-7);
    }

    #[test]
    fn fixed_and_adaptive_solvers_agree() {
        let params = Parameters::default();
        let initial = InitialConditions::default();
        let grid = TimeGrid {
            start: 0.0,
            end: 20.0,
            samples: 201,
        };
        let adaptive =
            solve_trajectory(&params, &initial, &grid, SolverChoice::default()).expect("adaptive");
        let rk4 = solve_trajectory(&params, &initial, &grid, SolverChoice::Rk4 { substeps: 20 })
            .expect("rk4");
        let tsit5 = solve_trajectory(&params, &initial, &grid, SolverChoice::Tsit5 { substeps: 10 })
            .expect("tsit5");
        for i in 0..grid.samples {
            assert!((adaptive.prey[i] - rk4.prey[i]).abs() < 1e-4);
            assert!((adaptive.predators[i] - tsit5.predators[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn rejects_invalid_inputs() {
        let params = Parameters::default();
        let initial = InitialConditions::default();
        assert_err_contains(
            solve_trajectory(
                &params,
                &initial,
                &TimeGrid {
                    samples: 1,
                    ..TimeGrid::default()
                },
                SolverChoice::default(),
            ),
            "at least 2 samples",
        );
        assert_err_contains(
            solve_trajectory(
                &params,
                &initial,
                &TimeGrid::default(),
                SolverChoice::Rk4 { substeps: 0 },
            ),
            "at least one substep",
        );
        let bad_params = Parameters {
            beta: 5.0,
            ..params
        };
        assert_err_contains(
            solve_trajectory(
                &bad_params,
                &initial,
                &TimeGrid::default(),
                SolverChoice::default(),
            ),
            "beta = 5",
        );
        let bad_initial = InitialConditions {
            prey: -3.0,
            predators: 1.0,
        };
        assert_err_contains(
            solve_trajectory(
                &params,
                &bad_initial,
                &TimeGrid::default(),
                SolverChoice::default(),
            ),
            "prey population",
        );
    }

    #[test]
    fn solver_choice_validation_catches_bad_settings() {
        assert!(SolverChoice::default().validate().is_ok());
        assert!(SolverChoice::Rk4 { substeps: 4 }.validate().is_ok());
        let err = SolverChoice::Tsit5 { substeps: 0 }
            .validate()
            .expect_err("zero substeps");
        assert!(err.to_string().contains("substep"));
        let adaptive = SolverChoice::Adaptive(AdaptiveSettings {
            rtol: 0.0,
            ..AdaptiveSettings::default()
        });
        assert!(adaptive.validate().is_err());
    }

    #[test]
    fn partial_time_grid_fills_in_defaults() {
        let grid: TimeGrid = serde_json::from_str(r#"{ "end": 50.0 }"#).expect("grid");
        assert_eq!(
            grid,
            TimeGrid {
                start: 0.0,
                end: 50.0,
                samples: 1000
            }
        );
        let json = r#"{ "method": "adaptive", "rtol": 1e-6 }"#;
        let choice: SolverChoice = serde_json::from_str(json).expect("solver");
        match choice {
            SolverChoice::Adaptive(settings) => {
                assert_eq!(settings.rtol, 1e-6);
                assert_eq!(settings.atol, AdaptiveSettings::default().atol);
            }
            other => panic!("unexpected solver {other:?}"),
        }
    }

    #[test]
    fn solver_choice_serializes_with_method_tag() {
        let json = serde_json::to_value(SolverChoice::Rk4 { substeps: 4 }).expect("json");
        assert_eq!(json["method"], "rk4");
        assert_eq!(json["substeps"], 4);
    }
}
