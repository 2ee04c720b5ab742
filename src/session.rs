//! Live simulation session: shared state plus the recurring tick task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::sim::engine::Simulator;

/// Handle to the simulator shared between the tick task and readers.
///
/// The tick task holds the write lock for one whole tick, so readers never see
/// a partially updated building.
pub type SharedSimulator = Arc<RwLock<Simulator>>;

/// Wraps a simulator for sharing.
pub fn shared(sim: Simulator) -> SharedSimulator {
    Arc::new(RwLock::new(sim))
}

/// Running session. Dropping it stops the timer.
pub struct Session {
    state: SharedSimulator,
    task: JoinHandle<()>,
}

impl Session {
    /// Spawns the tick task on the current tokio runtime.
    ///
    /// The first tick fires one full `period` after start.
    pub fn start(state: SharedSimulator, period: Duration) -> Self {
        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut sim = task_state.write().await;
                sim.tick();
                debug!(tick = sim.ticks(), "session tick");
            }
        });
        info!(period_ms = period.as_millis() as u64, "session started");
        Self { state, task }
    }

    /// Shared simulator handle.
    pub fn state(&self) -> &SharedSimulator {
        &self.state
    }

    /// Stops the timer. Building state stays readable through any cloned handle.
    pub fn end(self) {}
}

impl Drop for Session {
    fn drop(&mut self) {
        self.task.abort();
        info!("session ended");
    }
}
