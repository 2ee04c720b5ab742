//! Simulated three-phase electrical panel dashboard for campus buildings.

pub mod advisor;
#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod io;
pub mod logging;
/// Live session: shared simulator and the recurring tick task.
pub mod session;
/// Simulation engine, phase random walk, history, and derived metrics.
pub mod sim;
pub mod view;
#[cfg(feature = "tui")]
pub mod tui;
