//! Simulation engine that owns every tracked building and advances them per tick.

use chrono::{DateTime, Local, TimeDelta, TimeZone};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{debug, trace};

use super::history::{backfill, push_bounded, timestamp_label};
use super::metrics::PanelMetrics;
use super::phase::{advance, settle};
use super::types::{BuildingSpec, BuildingState, HistoryPoint, SimConfig};

/// Registration failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    /// A building with this name is already tracked.
    #[error("building \"{0}\" is already registered")]
    Duplicate(String),
}

/// Simulation engine owning all building state and the random source.
///
/// The engine is the single writer of building state. Each [`tick`] updates
/// every building to completion before returning, so any reader holding a
/// shared reference sees a consistent snapshot.
///
/// [`tick`]: Simulator::tick
pub struct Simulator {
    config: SimConfig,
    /// Buildings in registration order.
    buildings: Vec<BuildingState>,
    rng: StdRng,
    ticks: u64,
}

impl Simulator {
    /// Creates an engine with no buildings.
    ///
    /// Seeds the RNG from `config.seed`, or from the OS when unset.
    pub fn new(config: SimConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            buildings: Vec::new(),
            rng,
            ticks: 0,
        }
    }

    /// Creates an engine and registers every building, backfilled to now.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::Duplicate`] if two specs share a name.
    pub fn with_buildings(
        config: SimConfig,
        specs: impl IntoIterator<Item = BuildingSpec>,
    ) -> Result<Self, RegisterError> {
        let mut sim = Self::new(config);
        let now = Local::now();
        for spec in specs {
            sim.register_at(spec, &now)?;
        }
        Ok(sim)
    }

    /// Registers a building and backfills its history ending at `now`.
    ///
    /// Seed readings are clamped like any ticked reading: voltage to
    /// 190..=250 V, current to the configured band.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::Duplicate`] if the name is already tracked.
    pub fn register_at<Tz>(
        &mut self,
        mut spec: BuildingSpec,
        now: &DateTime<Tz>,
    ) -> Result<(), RegisterError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if self.building(&spec.name).is_some() {
            return Err(RegisterError::Duplicate(spec.name));
        }

        for phase in &mut spec.phases {
            settle(phase, self.config.current_band);
        }

        let spacing =
            TimeDelta::from_std(self.config.backfill_spacing).unwrap_or(TimeDelta::zero());
        let history = backfill(
            spec.base_power_kw,
            now,
            self.config.backfill_points.min(self.config.history_capacity),
            spacing,
            &mut self.rng,
        );

        debug!(building = %spec.name, points = history.len(), "registered building");
        self.buildings.push(BuildingState {
            name: spec.name,
            phases: spec.phases,
            history,
        });
        Ok(())
    }

    /// Advances every building by one step, stamping history with the local time.
    pub fn tick(&mut self) {
        self.tick_at(&Local::now());
    }

    /// Advances every building by one step, stamping history with `now`.
    ///
    /// Every phase of every building takes one random-walk step; then each
    /// building appends one history point built from its updated phases.
    pub fn tick_at<Tz>(&mut self, now: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let label = timestamp_label(now);
        let band = self.config.current_band;
        let capacity = self.config.history_capacity;

        for building in &mut self.buildings {
            for phase in &mut building.phases {
                advance(phase, &mut self.rng, band);
            }
            let point = HistoryPoint::from_phases(label.clone(), &building.phases);
            push_bounded(&mut building.history, point, capacity);
            trace!(building = %building.name, "{}", PanelMetrics::from_phases(&building.phases));
        }

        self.ticks += 1;
        debug!(tick = self.ticks, buildings = self.buildings.len(), at = %label, "tick");
    }

    /// Returns the building with the given name, if tracked.
    pub fn building(&self, name: &str) -> Option<&BuildingState> {
        self.buildings.iter().find(|b| b.name == name)
    }

    /// Iterates buildings in registration order.
    pub fn buildings(&self) -> impl Iterator<Item = &BuildingState> {
        self.buildings.iter()
    }

    /// Number of tracked buildings.
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    /// Returns `true` when no buildings are tracked.
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Number of ticks applied since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns a reference to the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
