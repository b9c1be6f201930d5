//! Browser bindings for the Lotka-Volterra engine.
//!
//! `WasmDashboard` runs the whole slider/click callback client-side;
//! `WasmSystem` exposes raw stepping for custom front ends.

mod analysis;
mod dashboard;
mod system;

pub use analysis::{equilibria, solve_trajectory};
pub use dashboard::WasmDashboard;
pub use system::WasmSystem;
