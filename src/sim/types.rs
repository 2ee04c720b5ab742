//! Core simulation types: phases, readings, history points, and building state.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::phase::{CurrentBand, classify_voltage, power_kw, round1};

/// Centralized simulation configuration.
///
/// # Examples
///
/// ```
/// use panel_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::default();
/// assert_eq!(cfg.tick_interval.as_millis(), 3000);
/// assert_eq!(cfg.history_capacity, 20);
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Period of the recurring tick.
    pub tick_interval: Duration,
    /// Maximum number of history points kept per building.
    pub history_capacity: usize,
    /// Number of synthetic points produced at registration.
    pub backfill_points: usize,
    /// Spacing between synthetic points.
    pub backfill_spacing: Duration,
    /// Bounds applied to simulated current.
    pub current_band: CurrentBand,
    /// Random seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(3000),
            history_capacity: 20,
            backfill_points: 11,
            backfill_spacing: Duration::from_secs(5),
            current_band: CurrentBand::default(),
            seed: None,
        }
    }
}

/// Initial values for a building at registration time.
#[derive(Debug, Clone)]
pub struct BuildingSpec {
    /// Unique building name.
    pub name: String,
    /// Nominal per-phase power used to backfill history (kW).
    pub base_power_kw: f64,
    /// Seed readings, one per phase in R/S/T order.
    pub phases: [PhaseReading; 3],
}

impl BuildingSpec {
    /// Standard panel seed: R 220 V/15 A, S 221 V/14.5 A, T 219 V/15.2 A.
    pub fn standard(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_power_kw: 3.3,
            phases: [
                PhaseReading::new(PhaseId::R, 220.0, 15.0, 0.95),
                PhaseReading::new(PhaseId::S, 221.0, 14.5, 0.94),
                PhaseReading::new(PhaseId::T, 219.0, 15.2, 0.96),
            ],
        }
    }
}

/// One conductor of a three-phase supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhaseId {
    R,
    S,
    T,
}

impl PhaseId {
    /// All phases in panel order.
    pub const ALL: [PhaseId; 3] = [PhaseId::R, PhaseId::S, PhaseId::T];

    /// Position of the phase within a building's phase array.
    pub fn index(self) -> usize {
        match self {
            Self::R => 0,
            Self::S => 1,
            Self::T => 2,
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::R => "R",
            Self::S => "S",
            Self::T => "T",
        };
        f.pad(name)
    }
}

/// Health classification shared by individual phases and whole buildings.
///
/// Variants are ordered by severity, so `max()` over a set of statuses yields
/// the most severe one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl Status {
    /// Short human-readable label used by the dashboards.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Operational",
            Self::Warning => "Warning",
            Self::Critical => "Critical Alert",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        };
        f.pad(name)
    }
}

/// Instantaneous state of one phase.
///
/// `power` and `status` are derived from the other fields; construct through
/// [`PhaseReading::new`] so they stay consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseReading {
    /// Phase identifier.
    pub name: PhaseId,
    /// Phase-to-neutral voltage (V, one decimal).
    pub voltage: f64,
    /// Line current (A, one decimal).
    pub current: f64,
    /// Real power (kW, two decimals).
    pub power: f64,
    /// Power factor, fixed for the lifetime of the simulation.
    pub power_factor: f64,
    /// Voltage-derived status.
    pub status: Status,
}

impl PhaseReading {
    /// Creates a reading and derives `power` and `status`.
    ///
    /// Voltage and current are rounded to one decimal; voltage is not clamped
    /// here, the engine clamps on registration and on every tick.
    pub fn new(name: PhaseId, voltage: f64, current: f64, power_factor: f64) -> Self {
        let voltage = round1(voltage);
        let current = round1(current);
        Self {
            name,
            voltage,
            current,
            power: power_kw(voltage, current, power_factor),
            power_factor,
            status: classify_voltage(voltage),
        }
    }
}

/// One timestamped sample of the three phase powers, used for trend charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Wall-clock label (`HH:MM:SS`).
    pub timestamp: String,
    #[serde(rename = "power_R")]
    pub power_r: f64,
    #[serde(rename = "power_S")]
    pub power_s: f64,
    #[serde(rename = "power_T")]
    pub power_t: f64,
}

impl HistoryPoint {
    /// Samples the current power of each phase.
    pub fn from_phases(timestamp: impl Into<String>, phases: &[PhaseReading; 3]) -> Self {
        Self {
            timestamp: timestamp.into(),
            power_r: phases[PhaseId::R.index()].power,
            power_s: phases[PhaseId::S.index()].power,
            power_t: phases[PhaseId::T.index()].power,
        }
    }

    /// Power of the given phase at this sample.
    pub fn power(&self, phase: PhaseId) -> f64 {
        match phase {
            PhaseId::R => self.power_r,
            PhaseId::S => self.power_s,
            PhaseId::T => self.power_t,
        }
    }
}

/// Electrical state of one tracked building.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingState {
    /// Unique building name.
    pub name: String,
    /// Exactly one reading per phase, indexed by [`PhaseId::index`].
    pub phases: [PhaseReading; 3],
    /// Rolling power history, oldest first.
    pub history: VecDeque<HistoryPoint>,
}

impl BuildingState {
    /// Returns the reading for one phase.
    pub fn phase(&self, id: PhaseId) -> &PhaseReading {
        &self.phases[id.index()]
    }

    /// Returns up to the `n` most recent history points, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<HistoryPoint> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).cloned().collect()
    }
}

impl fmt::Display for BuildingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<20}", self.name)?;
        for p in &self.phases {
            write!(
                f,
                " | {} {:>5.1}V {:>4.1}A {:>5.2}kW {:<8}",
                p.name, p.voltage, p.current, p.power, p.status
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building_with_history(len: usize) -> BuildingState {
        let phases = [
            PhaseReading::new(PhaseId::R, 220.0, 15.0, 0.95),
            PhaseReading::new(PhaseId::S, 221.0, 14.5, 0.94),
            PhaseReading::new(PhaseId::T, 219.0, 15.2, 0.96),
        ];
        let history = (0..len)
            .map(|i| HistoryPoint {
                timestamp: format!("t{i}"),
                power_r: i as f64,
                power_s: 0.0,
                power_t: 0.0,
            })
            .collect();
        BuildingState {
            name: "Library".to_string(),
            phases,
            history,
        }
    }

    #[test]
    fn new_reading_derives_power_and_status() {
        let p = PhaseReading::new(PhaseId::R, 230.04, 10.01, 0.9);
        assert_eq!(p.voltage, 230.0);
        assert_eq!(p.current, 10.0);
        assert_eq!(p.power, 2.07);
        assert_eq!(p.status, Status::Normal);
    }

    #[test]
    fn status_orders_by_severity() {
        assert!(Status::Critical > Status::Warning);
        assert!(Status::Warning > Status::Normal);
        let worst = [Status::Normal, Status::Critical, Status::Warning]
            .into_iter()
            .max();
        assert_eq!(worst, Some(Status::Critical));
    }

    #[test]
    fn phase_reading_serializes_camel_case() {
        let p = PhaseReading::new(PhaseId::S, 240.0, 10.0, 0.9);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["name"], "S");
        assert_eq!(json["powerFactor"], 0.9);
        assert_eq!(json["status"], "warning");
    }

    #[test]
    fn history_point_uses_phase_column_names() {
        let b = building_with_history(0);
        let point = HistoryPoint::from_phases("12:00:00", &b.phases);
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["power_R"], b.phases[0].power);
        assert_eq!(json["power_S"], b.phases[1].power);
        assert_eq!(json["power_T"], b.phases[2].power);
        assert_eq!(point.power(PhaseId::T), b.phases[2].power);
    }

    #[test]
    fn recent_history_keeps_order_and_limit() {
        let b = building_with_history(15);
        let recent = b.recent_history(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].timestamp, "t5");
        assert_eq!(recent[9].timestamp, "t14");

        let short = building_with_history(3).recent_history(10);
        assert_eq!(short.len(), 3);
    }

    #[test]
    fn building_display_does_not_panic() {
        let s = format!("{}", building_with_history(1));
        assert!(s.contains("Library"));
    }
}
