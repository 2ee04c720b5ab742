/// Simulation engine owning building state.
pub mod engine;
/// Bounded history and backfill.
pub mod history;
pub mod metrics;
pub mod phase;
pub mod types;
