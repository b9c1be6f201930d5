use crate::traits::{DynamicalSystem, Scalar, Steppable};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Classic Runge-Kutta 4th Order Solver
#[derive(Debug)]
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let half = T::lit(0.5);
        let sixth = T::lit(1.0 / 6.0);
        let two = T::lit(2.0);
        let t0 = *t;

        system.apply(t0, state, &mut self.k1);

        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

// Tsitouras 5(4) tableau. Row `s` holds the coefficients used to build the
// input of stage `s`; the last row doubles as the 5th order weights (FSAL).
const TSIT5_C: [f64; 7] = [0.0, 0.161, 0.327, 0.9, 0.9800255409045097, 1.0, 1.0];

const TSIT5_A: [[f64; 6]; 7] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.161, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.008480655492356989, 0.335480655492357, 0.0, 0.0, 0.0, 0.0],
    [2.897153057105493, -6.359448489975075, 4.3622954328695815, 0.0, 0.0, 0.0],
    [
        5.325864828439257,
        -11.748883564062828,
        7.4955393428898365,
        -0.09249506636175525,
        0.0,
        0.0,
    ],
    [
        5.86145544294642,
        -12.92096931784711,
        8.159367898576159,
        -0.071584973281401,
        -0.028269050394068383,
        0.0,
    ],
    [
        0.09646076681806523,
        0.01,
        0.4798896504144996,
        1.379008574103742,
        -3.290069515436081,
        2.324710524099774,
    ],
];

// Difference between the 5th and the embedded 4th order weights.
const TSIT5_BTILDE: [f64; 7] = [
    -0.00178001105222577714,
    -0.0008164344596567469,
    0.007880878010261995,
    -0.1447110071732629,
    0.5823571654525552,
    -0.45808210592918697,
    0.015151515151515152,
];

/// Tsitouras 5/4 Solver
#[derive(Debug)]
pub struct Tsit5<T: Scalar> {
    k: [Vec<T>; 7],
    tmp: Vec<T>,
}

impl<T: Scalar> Tsit5<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::zero();
        Self {
            k: std::array::from_fn(|_| vec![z; dim]),
            tmp: vec![z; dim],
        }
    }

    /// Evaluates stages k1..k6 at `(t0, state)`.
    fn stages(&mut self, system: &impl DynamicalSystem<T>, t0: T, state: &[T], dt: T) {
        system.apply(t0, state, &mut self.k[0]);
        for stage in 1..6 {
            let row = &TSIT5_A[stage];
            for i in 0..state.len() {
                let mut acc = T::zero();
                for (j, &a) in row.iter().enumerate().take(stage) {
                    acc = acc + T::lit(a) * self.k[j][i];
                }
                self.tmp[i] = state[i] + dt * acc;
            }
            system.apply(t0 + T::lit(TSIT5_C[stage]) * dt, &self.tmp, &mut self.k[stage]);
        }
    }

    /// Writes the 5th order solution `state + dt * sum(b_j k_j)` into `out`.
    fn combine(&self, state: &[T], dt: T, out: &mut [T]) {
        let weights = &TSIT5_A[6];
        for i in 0..state.len() {
            let mut acc = T::zero();
            for (j, &b) in weights.iter().enumerate() {
                acc = acc + T::lit(b) * self.k[j][i];
            }
            out[i] = state[i] + dt * acc;
        }
    }
}

impl<T: Scalar> Steppable<T> for Tsit5<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let t0 = *t;
        self.stages(system, t0, state, dt);
        let mut next = std::mem::take(&mut self.tmp);
        self.combine(state, dt, &mut next);
        state.copy_from_slice(&next);
        self.tmp = next;
        *t = t0 + dt;
    }
}

/// Error control settings for [`AdaptiveTsit5`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveSettings {
    pub rtol: f64,
    pub atol: f64,
    pub initial_dt: f64,
    pub min_dt: f64,
    pub max_dt: f64,
    /// Step attempts allowed per `integrate_to` call.
    pub max_steps: usize,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-10,
            initial_dt: 1e-2,
            min_dt: 1e-12,
            max_dt: 1.0,
            max_steps: 100_000,
        }
    }
}

impl AdaptiveSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.rtol > 0.0) || !(self.atol > 0.0) {
            bail!("Tolerances rtol and atol must be positive.");
        }
        if !(self.min_dt > 0.0) || !(self.initial_dt > 0.0) || !(self.max_dt > 0.0) {
            bail!("Step sizes min_dt, initial_dt and max_dt must be positive.");
        }
        if self.min_dt > self.max_dt {
            bail!("min_dt must not exceed max_dt.");
        }
        if self.max_steps == 0 {
            bail!("max_steps must be greater than zero.");
        }
        Ok(())
    }
}

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Tsit5 with embedded error estimation and step size control.
///
/// The proposed step size is carried across `integrate_to` calls, so
/// integrating over a dense output grid does not restart the controller at
/// every sample.
#[derive(Debug)]
pub struct AdaptiveTsit5 {
    inner: Tsit5<f64>,
    next: Vec<f64>,
    error: Vec<f64>,
    dt: f64,
    settings: AdaptiveSettings,
}

impl AdaptiveTsit5 {
    pub fn new(dim: usize, settings: AdaptiveSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            inner: Tsit5::new(dim),
            next: vec![0.0; dim],
            error: vec![0.0; dim],
            dt: settings.initial_dt.clamp(settings.min_dt, settings.max_dt),
            settings,
        })
    }

    pub fn settings(&self) -> &AdaptiveSettings {
        &self.settings
    }

    /// Step size the controller will try next.
    pub fn proposed_dt(&self) -> f64 {
        self.dt
    }

    /// Integrates from `*t` to exactly `t_end`, returning the number of
    /// accepted steps.
    pub fn integrate_to(
        &mut self,
        system: &impl DynamicalSystem<f64>,
        t: &mut f64,
        state: &mut [f64],
        t_end: f64,
    ) -> Result<usize> {
        if !t_end.is_finite() || t_end < *t {
            bail!("Target time {} must be finite and not before t = {}.", t_end, *t);
        }

        let mut accepted = 0usize;
        let mut attempts = 0usize;

        while *t < t_end {
            if attempts >= self.settings.max_steps {
                bail!(
                    "Adaptive integrator exceeded {} step attempts before reaching t = {}.",
                    self.settings.max_steps,
                    t_end
                );
            }
            attempts += 1;

            let remaining = t_end - *t;
            let last = self.dt >= remaining;
            let h = if last { remaining } else { self.dt };

            let err = self.trial(system, *t, state, h);
            let factor = if err == 0.0 {
                MAX_FACTOR
            } else if err.is_finite() {
                (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
            } else {
                MIN_FACTOR
            };

            if err <= 1.0 {
                state.copy_from_slice(&self.next);
                *t = if last { t_end } else { *t + h };
                accepted += 1;
                let proposal = (h * factor).min(self.settings.max_dt);
                // A step clipped to hit t_end says nothing about larger steps.
                self.dt = if last && h < self.dt {
                    self.dt.max(proposal)
                } else {
                    proposal
                };
            } else {
                self.dt = h * factor;
                if self.dt < self.settings.min_dt {
                    bail!(
                        "Step size underflow at t = {} (dt = {:e} < min_dt = {:e}).",
                        *t,
                        self.dt,
                        self.settings.min_dt
                    );
                }
            }
        }

        if state.iter().any(|v| !v.is_finite()) {
            bail!("Integration produced a non-finite state at t = {}.", *t);
        }
        Ok(accepted)
    }

    /// Computes a candidate step into `self.next` and returns the scaled
    /// RMS error norm (accept when <= 1).
    fn trial(&mut self, system: &impl DynamicalSystem<f64>, t0: f64, state: &[f64], h: f64) -> f64 {
        self.inner.stages(system, t0, state, h);
        self.inner.combine(state, h, &mut self.next);
        system.apply(t0 + h, &self.next, &mut self.inner.k[6]);

        for i in 0..state.len() {
            let mut acc = 0.0;
            for (j, &bt) in TSIT5_BTILDE.iter().enumerate() {
                acc += bt * self.inner.k[j][i];
            }
            self.error[i] = h * acc;
        }

        if self.next.iter().any(|v| !v.is_finite()) {
            return f64::INFINITY;
        }

        let dim = state.len().max(1) as f64;
        let sum: f64 = (0..state.len())
            .map(|i| {
                let scale = self.settings.atol
                    + self.settings.rtol * state[i].abs().max(self.next[i].abs());
                let r = self.error[i] / scale;
                r * r
            })
            .sum();
        (sum / dim).sqrt()
    }
}
