pub mod analysis;
pub mod dashboard;
pub mod equilibrium;
pub mod figure;
pub mod model;
pub mod nullcline;
pub mod solvers;
pub mod trajectory;
/// The `lotka_core` crate is the numerical engine behind the Lotka-Volterra
/// phase explorer. It is shared by the HTTP dashboard and the WASM bridge.
///
/// Key components:
/// - **Traits**: `Scalar`, `DynamicalSystem` (vector fields), `Steppable` (fixed-step solvers).
/// - **Model**: the predator-prey vector field, its parameters and their slider ranges.
/// - **Solvers**: RK4, Tsit5 and an adaptive Tsit5 with error control.
/// - **Trajectory / Analysis**: sampled solutions, the conserved quantity, period estimates.
/// - **Figure / Dashboard**: Plotly figure model and the slider/click update callback.
pub mod traits;

pub use dashboard::{update, Dashboard, DashboardInput, DashboardOutput, DashboardState};
pub use model::{InitialConditions, LotkaVolterra, ParameterError, ParameterKind, Parameters};
