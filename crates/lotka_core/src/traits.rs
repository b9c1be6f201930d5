use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Numeric type the model and the integrators are generic over.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {
    /// Converts an `f64` literal (a coefficient or a parameter) into `Self`.
    /// Yields NaN if the conversion is not representable, which the
    /// integrators then report as a non-finite state.
    fn lit(value: f64) -> Self {
        Self::from_f64(value).unwrap_or_else(Self::nan)
    }
}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// An autonomous or time-dependent vector field `dx/dt = f(t, x)`.
pub trait DynamicalSystem<T: Scalar> {
    /// Number of state variables.
    fn dimension(&self) -> usize;

    /// Writes `f(t, x)` into `out`. `x` and `out` have length `dimension()`.
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// Fixed-step integrators.
pub trait Steppable<T: Scalar> {
    /// Advances `state` from `t` to `t + dt` and updates `t`.
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}
