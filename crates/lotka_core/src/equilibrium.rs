use crate::model::Parameters;
use anyhow::{bail, Result};
use nalgebra::Matrix2;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Real parts at or below this magnitude are treated as zero.
const ZERO_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquilibriumKind {
    /// Both species extinct.
    Extinction,
    /// Both species at constant nonzero population.
    Coexistence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    Saddle,
    Center,
    StableNode,
    UnstableNode,
    StableFocus,
    UnstableFocus,
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexNumber {
    pub re: f64,
    pub im: f64,
}

impl From<Complex<f64>> for ComplexNumber {
    fn from(value: Complex<f64>) -> Self {
        Self {
            re: value.re,
            im: value.im,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumReport {
    pub kind: EquilibriumKind,
    pub state: [f64; 2],
    /// Row-major.
    pub jacobian: [[f64; 2]; 2],
    pub eigenvalues: Vec<ComplexNumber>,
    pub stability: Stability,
}

/// The two fixed points: `(0, 0)` and `(gamma / delta, alpha / beta)`.
pub fn equilibria(params: &Parameters) -> [(EquilibriumKind, [f64; 2]); 2] {
    [
        (EquilibriumKind::Extinction, [0.0, 0.0]),
        (
            EquilibriumKind::Coexistence,
            [params.gamma / params.delta, params.alpha / params.beta],
        ),
    ]
}

/// Analytic Jacobian of the vector field at `state`.
pub fn jacobian(params: &Parameters, state: [f64; 2]) -> [[f64; 2]; 2] {
    let [x, y] = state;
    [
        [params.alpha - params.beta * y, -params.beta * x],
        [params.delta * y, params.delta * x - params.gamma],
    ]
}

pub fn eigenvalues(jacobian: &[[f64; 2]; 2]) -> [Complex<f64>; 2] {
    let matrix = Matrix2::new(
        jacobian[0][0],
        jacobian[0][1],
        jacobian[1][0],
        jacobian[1][1],
    );
    let values = matrix.complex_eigenvalues();
    let mut pair = [values[0], values[1]];
    pair.sort_by(|a, b| {
        b.re.partial_cmp(&a.re)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.im.partial_cmp(&a.im).unwrap_or(std::cmp::Ordering::Equal))
    });
    pair
}

pub fn classify(eigenvalues: &[Complex<f64>; 2]) -> Stability {
    let is_zero = |v: f64| v.abs() <= ZERO_TOLERANCE;
    let [a, b] = eigenvalues;

    if !is_zero(a.im) || !is_zero(b.im) {
        // Complex conjugate pair share a real part.
        let re = 0.5 * (a.re + b.re);
        return if is_zero(re) {
            Stability::Center
        } else if re < 0.0 {
            Stability::StableFocus
        } else {
            Stability::UnstableFocus
        };
    }

    if is_zero(a.re) || is_zero(b.re) {
        return Stability::Degenerate;
    }
    match (a.re > 0.0, b.re > 0.0) {
        (true, true) => Stability::UnstableNode,
        (false, false) => Stability::StableNode,
        _ => Stability::Saddle,
    }
}

/// Locates, linearizes and classifies both fixed points.
pub fn analyze_equilibria(params: &Parameters) -> Result<Vec<EquilibriumReport>> {
    params.validate()?;
    let mut reports = Vec::with_capacity(2);
    for (kind, state) in equilibria(params) {
        if state.iter().any(|v| !v.is_finite()) {
            bail!("Equilibrium {:?} is not finite for the given parameters.", kind);
        }
        let jacobian = jacobian(params, state);
        let values = eigenvalues(&jacobian);
        reports.push(EquilibriumReport {
            kind,
            state,
            jacobian,
            eigenvalues: values.iter().copied().map(ComplexNumber::from).collect(),
            stability: classify(&values),
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LotkaVolterra;
    use crate::traits::DynamicalSystem;

    #[test]
    fn coexistence_point_is_a_zero_of_the_vector_field() {
        let params = Parameters::default();
        let system = LotkaVolterra::new(params).expect("system");
        for (_, state) in equilibria(&params) {
            let mut out = [0.0f64; 2];
            system.apply(0.0, &state, &mut out);
            assert!(out[0].abs() < 1e-12 && out[1].abs() < 1e-12);
        }
        let (_, coexistence) = equilibria(&params)[1];
        assert!((coexistence[0] - 20.0).abs() < 1e-12);
        assert!((coexistence[1] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let params = Parameters::new(0.7, 0.2, 1.1, 0.05).expect("params");
        let system = LotkaVolterra::new(params).expect("system");
        let state = [12.0, 4.0];
        let analytic = jacobian(&params, state);
        let h = 1e-6;
        for j in 0..2 {
            let mut plus = state;
            let mut minus = state;
            plus[j] += h;
            minus[j] -= h;
            let (mut f_plus, mut f_minus) = ([0.0f64; 2], [0.0f64; 2]);
            system.apply(0.0, &plus, &mut f_plus);
            system.apply(0.0, &minus, &mut f_minus);
            for i in 0..2 {
                let numeric = (f_plus[i] - f_minus[i]) / (2.0 * h);
                assert!((analytic[i][j] - numeric).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn extinction_is_saddle_and_coexistence_is_center() {
        let reports = analyze_equilibria(&Parameters::default()).expect("reports");
        assert_eq!(reports.len(), 2);

        assert_eq!(reports[0].kind, EquilibriumKind::Extinction);
        assert_eq!(reports[0].stability, Stability::Saddle);
        assert!((reports[0].eigenvalues[0].re - 1.0).abs() < 1e-12);
        assert!((reports[0].eigenvalues[1].re + 1.5).abs() < 1e-12);

        assert_eq!(reports[1].kind, EquilibriumKind::Coexistence);
        assert_eq!(reports[1].stability, Stability::Center);
        let omega = (1.0_f64 * 1.5).sqrt();
        for value in &reports[1].eigenvalues {
            assert!(value.re.abs() < 1e-9);
            assert!((value.im.abs() - omega).abs() < 1e-9);
        }
    }

    #[test]
    fn classify_covers_real_and_complex_cases() {
        let c = |re: f64, im: f64| Complex::new(re, im);
        assert_eq!(classify(&[c(-1.0, 0.0), c(-2.0, 0.0)]), Stability::StableNode);
        assert_eq!(classify(&[c(2.0, 0.0), c(1.0, 0.0)]), Stability::UnstableNode);
        assert_eq!(classify(&[c(1.0, 0.0), c(-1.0, 0.0)]), Stability::Saddle);
        assert_eq!(classify(&[c(-0.5, 1.0), c(-0.5, -1.0)]), Stability::StableFocus);
        assert_eq!(classify(&[c(0.5, 1.0), c(0.5, -1.0)]), Stability::UnstableFocus);
        assert_eq!(classify(&[c(0.0, 1.0), c(0.0, -1.0)]), Stability::Center);
        assert_eq!(classify(&[c(0.0, 0.0), c(-1.0, 0.0)]), Stability::Degenerate);
    }

    #[test]
    fn report_serializes_for_the_front_end() {
        let reports = analyze_equilibria(&Parameters::default()).expect("reports");
        let json = serde_json::to_value(&reports[1]).expect("json");
        assert_eq!(json["kind"], "coexistence");
        assert_eq!(json["stability"], "center");
        assert!(json["eigenvalues"][0]["im"].is_number());
    }
}
