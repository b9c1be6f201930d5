//! The Lotka-Volterra vector field and its parameters.
//!
//! ```text
//! dx/dt =  alpha * x - beta  * x * y     (prey)
//! dy/dt = -gamma * y + delta * x * y     (predators)
//! ```

use crate::traits::{DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Slack on range checks so slider values like `0.1 * 3` still pass.
const RANGE_TOLERANCE: f64 = 1e-9;

/// Population of prey and predators used when no point has been picked yet.
pub const DEFAULT_INITIAL_CONDITIONS: InitialConditions = InitialConditions {
    prey: 10.0,
    predators: 5.0,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("{kind} must be a finite number, got {value}")]
    NotFinite { kind: ParameterKind, value: f64 },
    #[error("{kind} = {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        kind: ParameterKind,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("unknown parameter '{0}', expected one of alpha, beta, gamma, delta")]
    UnknownParameter(String),
    #[error("{name} population must be finite and non-negative, got {value}")]
    InvalidPopulation { name: &'static str, value: f64 },
}

/// Slider geometry of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
    /// Distance between labelled slider marks.
    pub mark_spacing: f64,
}

impl ParameterRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min - RANGE_TOLERANCE && value <= self.max + RANGE_TOLERANCE
    }

    /// Mark positions, `min, min + spacing, ...` strictly below `max + step`.
    pub fn marks(&self) -> Vec<f64> {
        let stop = self.max + self.step;
        let count = ((stop - self.min) / self.mark_spacing - RANGE_TOLERANCE).ceil() as usize;
        (0..count)
            .map(|i| round_mark(self.min + i as f64 * self.mark_spacing))
            .collect()
    }
}

fn round_mark(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Alpha,
    Beta,
    Gamma,
    Delta,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 4] = [
        ParameterKind::Alpha,
        ParameterKind::Beta,
        ParameterKind::Gamma,
        ParameterKind::Delta,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParameterKind::Alpha => "alpha",
            ParameterKind::Beta => "beta",
            ParameterKind::Gamma => "gamma",
            ParameterKind::Delta => "delta",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ParameterKind::Alpha => "α",
            ParameterKind::Beta => "β",
            ParameterKind::Gamma => "γ",
            ParameterKind::Delta => "δ",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ParameterKind::Alpha => "α (Prey Growth Rate):",
            ParameterKind::Beta => "β (Predation Rate):",
            ParameterKind::Gamma => "γ (Predator Death Rate):",
            ParameterKind::Delta => "δ (Predator Growth Rate):",
        }
    }

    pub fn range(self) -> ParameterRange {
        match self {
            ParameterKind::Alpha => ParameterRange {
                min: 0.1,
                max: 2.0,
                step: 0.1,
                default: 1.0,
                mark_spacing: 0.5,
            },
            ParameterKind::Beta => ParameterRange {
                min: 0.01,
                max: 0.5,
                step: 0.01,
                default: 0.1,
                mark_spacing: 0.1,
            },
            ParameterKind::Gamma => ParameterRange {
                min: 0.1,
                max: 2.0,
                step: 0.1,
                default: 1.5,
                mark_spacing: 0.5,
            },
            ParameterKind::Delta => ParameterRange {
                min: 0.01,
                max: 0.2,
                step: 0.01,
                default: 0.075,
                mark_spacing: 0.05,
            },
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParameterKind {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed.strip_suffix("-slider").unwrap_or(trimmed);
        match name.to_lowercase().as_str() {
            "alpha" | "α" => Ok(ParameterKind::Alpha),
            "beta" | "β" => Ok(ParameterKind::Beta),
            "gamma" | "γ" => Ok(ParameterKind::Gamma),
            "delta" | "δ" => Ok(ParameterKind::Delta),
            _ => Err(ParameterError::UnknownParameter(s.to_string())),
        }
    }
}

/// The four rate constants of the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub delta: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            alpha: ParameterKind::Alpha.range().default,
            beta: ParameterKind::Beta.range().default,
            gamma: ParameterKind::Gamma.range().default,
            delta: ParameterKind::Delta.range().default,
        }
    }
}

impl Parameters {
    pub fn new(alpha: f64, beta: f64, gamma: f64, delta: f64) -> Result<Self, ParameterError> {
        let params = Self {
            alpha,
            beta,
            gamma,
            delta,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn get(&self, kind: ParameterKind) -> f64 {
        match kind {
            ParameterKind::Alpha => self.alpha,
            ParameterKind::Beta => self.beta,
            ParameterKind::Gamma => self.gamma,
            ParameterKind::Delta => self.delta,
        }
    }

    /// Sets one parameter, leaving `self` untouched if the value is rejected.
    pub fn set(&mut self, kind: ParameterKind, value: f64) -> Result<(), ParameterError> {
        check_value(kind, value)?;
        match kind {
            ParameterKind::Alpha => self.alpha = value,
            ParameterKind::Beta => self.beta = value,
            ParameterKind::Gamma => self.gamma = value,
            ParameterKind::Delta => self.delta = value,
        }
        Ok(())
    }

    pub fn with(mut self, kind: ParameterKind, value: f64) -> Result<Self, ParameterError> {
        self.set(kind, value)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        for kind in ParameterKind::ALL {
            check_value(kind, self.get(kind))?;
        }
        Ok(())
    }

    /// `[alpha, beta, gamma, delta]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.alpha, self.beta, self.gamma, self.delta]
    }
}

fn check_value(kind: ParameterKind, value: f64) -> Result<(), ParameterError> {
    if !value.is_finite() {
        return Err(ParameterError::NotFinite { kind, value });
    }
    let range = kind.range();
    if !range.contains(value) {
        return Err(ParameterError::OutOfRange {
            kind,
            value,
            min: range.min,
            max: range.max,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    pub prey: f64,
    pub predators: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        DEFAULT_INITIAL_CONDITIONS
    }
}

impl InitialConditions {
    pub fn new(prey: f64, predators: f64) -> Result<Self, ParameterError> {
        let ic = Self { prey, predators };
        ic.validate()?;
        Ok(ic)
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        check_population("prey", self.prey)?;
        check_population("predator", self.predators)
    }

    pub fn to_array(&self) -> [f64; 2] {
        [self.prey, self.predators]
    }
}

fn check_population(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ParameterError::InvalidPopulation { name, value })
    }
}

/// Predator-prey vector field over state `[prey, predators]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotkaVolterra {
    params: Parameters,
}

impl LotkaVolterra {
    pub fn new(params: Parameters) -> Result<Self, ParameterError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }
}

impl<T: Scalar> DynamicalSystem<T> for LotkaVolterra {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let p = &self.params;
        let (prey, predators) = (x[0], x[1]);
        let encounters = prey * predators;
        out[0] = T::lit(p.alpha) * prey - T::lit(p.beta) * encounters;
        out[1] = T::lit(p.delta) * encounters - T::lit(p.gamma) * predators;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_slider_defaults() {
        let params = Parameters::default();
        assert_eq!(params.to_array(), [1.0, 0.1, 1.5, 0.075]);
        assert!(params.validate().is_ok());
        assert_eq!(InitialConditions::default().to_array(), [10.0, 5.0]);
    }

    #[test]
    fn vector_field_matches_equations() {
        let system = LotkaVolterra::new(Parameters::default()).expect("system");
        let mut out = [0.0f64; 2];
        system.apply(0.0, &[10.0, 5.0], &mut out);
        // 1.0 * 10 - 0.1 * 50 = 5, -1.5 * 5 + 0.075 * 50 = -3.75
        assert!((out[0] - 5.0).abs() < 1e-12);
        assert!((out[1] + 3.75).abs() < 1e-12);
    }

    #[test]
    fn vector_field_vanishes_on_extinction() {
        let system = LotkaVolterra::new(Parameters::default()).expect("system");
        let mut out = [1.0f32; 2];
        system.apply(0.0f32, &[0.0, 0.0], &mut out);
        assert_eq!(out, [0.0, 0.0]);
    }

    #[test]
    fn set_rejects_out_of_range_and_keeps_previous_value() {
        let mut params = Parameters::default();
        let err = params.set(ParameterKind::Beta, 0.9).expect_err("out of range");
        assert_eq!(
            err,
            ParameterError::OutOfRange {
                kind: ParameterKind::Beta,
                value: 0.9,
                min: 0.01,
                max: 0.5
            }
        );
        assert_eq!(params.beta, 0.1);

        let err = params
            .set(ParameterKind::Gamma, f64::NAN)
            .expect_err("nan rejected");
        assert!(matches!(err, ParameterError::NotFinite { .. }));
    }

    #[test]
    fn range_check_accepts_slider_float_noise() {
        let params = Parameters::default()
            .with(ParameterKind::Alpha, 0.1 * 20.0)
            .expect("upper bound");
        assert!((params.alpha - 2.0).abs() < 1e-12);
        assert!(Parameters::new(0.1, 0.01, 0.1, 0.01).is_ok());
    }

    #[test]
    fn parameter_kind_parses_names_symbols_and_slider_ids() {
        assert_eq!("alpha".parse::<ParameterKind>(), Ok(ParameterKind::Alpha));
        assert_eq!("BETA".parse::<ParameterKind>(), Ok(ParameterKind::Beta));
        assert_eq!("γ".parse::<ParameterKind>(), Ok(ParameterKind::Gamma));
        assert_eq!(
            "delta-slider".parse::<ParameterKind>(),
            Ok(ParameterKind::Delta)
        );
        assert_eq!(
            "omega".parse::<ParameterKind>(),
            Err(ParameterError::UnknownParameter("omega".to_string()))
        );
    }

    #[test]
    fn marks_follow_slider_layout() {
        assert_eq!(ParameterKind::Alpha.range().marks(), vec![0.1, 0.6, 1.1, 1.6]);
        assert_eq!(
            ParameterKind::Beta.range().marks(),
            vec![0.01, 0.11, 0.21, 0.31, 0.41]
        );
        assert_eq!(
            ParameterKind::Delta.range().marks(),
            vec![0.01, 0.06, 0.11, 0.16]
        );
    }

    #[test]
    fn initial_conditions_reject_negative_and_non_finite() {
        assert!(InitialConditions::new(0.0, 0.0).is_ok());
        assert_eq!(
            InitialConditions::new(-1.0, 2.0),
            Err(ParameterError::InvalidPopulation {
                name: "prey",
                value: -1.0
            })
        );
        assert!(InitialConditions::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn error_messages_name_the_parameter() {
        let err = Parameters::new(1.0, 0.1, 3.0, 0.075).expect_err("gamma too large");
        assert_eq!(
            err.to_string(),
            "gamma = 3 is outside the allowed range [0.1, 2]"
        );
    }
}
