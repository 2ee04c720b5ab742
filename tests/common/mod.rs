//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use panel_sim::config::DashboardConfig;
use panel_sim::sim::engine::Simulator;

/// Fixed registration instant so backfilled timestamps are reproducible.
pub fn registered_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Campus preset with the given seed.
pub fn campus_config(seed: u64) -> DashboardConfig {
    let mut config = DashboardConfig::campus();
    config.simulation.seed = Some(seed);
    config
}

/// Simulator built from `config`, registered at [`registered_at`].
pub fn simulator(config: &DashboardConfig) -> Simulator {
    let mut sim = Simulator::new(config.sim_config());
    for spec in config.building_specs() {
        sim.register_at(spec, &registered_at())
            .expect("preset building names are unique");
    }
    sim
}

/// Campus simulator (three buildings) with seed 42.
pub fn campus() -> Simulator {
    simulator(&campus_config(42))
}
