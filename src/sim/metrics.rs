//! Derived panel metrics computed on read from a phase snapshot.

use std::fmt;

use serde::Serialize;

use super::phase::{round1, round2};
use super::types::{PhaseReading, Status};

/// Imbalance above this percentage escalates health to critical.
const IMBALANCE_CRITICAL_PCT: f64 = 20.0;
/// Imbalance above this percentage escalates health to warning.
const IMBALANCE_WARNING_PCT: f64 = 10.0;

/// Aggregate view of one building's panel.
///
/// Always computed from the current readings; never stored alongside them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelMetrics {
    /// Sum of phase power (kW, two decimals).
    pub total_power: f64,
    /// Mean phase voltage (V, one decimal).
    pub avg_voltage: f64,
    /// Sum of phase current (A, one decimal).
    pub total_current: f64,
    /// Spread between highest and lowest phase power, as % of the highest.
    pub load_imbalance_pct: f64,
    /// Overall health classification.
    pub health: Status,
}

impl PanelMetrics {
    /// Computes every metric from the three phase readings.
    ///
    /// # Examples
    ///
    /// ```
    /// use panel_sim::sim::metrics::PanelMetrics;
    /// use panel_sim::sim::types::{PhaseId, PhaseReading, Status};
    ///
    /// let phases = [
    ///     PhaseReading::new(PhaseId::R, 220.0, 15.0, 1.0),
    ///     PhaseReading::new(PhaseId::S, 220.0, 15.0, 1.0),
    ///     PhaseReading::new(PhaseId::T, 220.0, 15.0, 1.0),
    /// ];
    /// let m = PanelMetrics::from_phases(&phases);
    /// assert_eq!(m.total_power, 9.9);
    /// assert_eq!(m.health, Status::Normal);
    /// ```
    pub fn from_phases(phases: &[PhaseReading; 3]) -> Self {
        Self {
            total_power: total_power(phases),
            avg_voltage: avg_voltage(phases),
            total_current: total_current(phases),
            load_imbalance_pct: load_imbalance_pct(phases),
            health: overall_health(phases),
        }
    }
}

impl fmt::Display for PanelMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={:.2} kW  avgV={:.1} V  totalI={:.1} A  imbalance={:.1}%  health={}",
            self.total_power,
            self.avg_voltage,
            self.total_current,
            self.load_imbalance_pct,
            self.health,
        )
    }
}

/// Total power across phases (kW, two decimals).
pub fn total_power(phases: &[PhaseReading]) -> f64 {
    round2(phases.iter().map(|p| p.power).sum())
}

/// Mean phase voltage (V, one decimal). Zero for an empty slice.
pub fn avg_voltage(phases: &[PhaseReading]) -> f64 {
    if phases.is_empty() {
        return 0.0;
    }
    round1(phases.iter().map(|p| p.voltage).sum::<f64>() / phases.len() as f64)
}

/// Total current across phases (A, one decimal).
pub fn total_current(phases: &[PhaseReading]) -> f64 {
    round1(phases.iter().map(|p| p.current).sum())
}

/// Load imbalance as a percentage of the highest phase power.
///
/// Returns 0 when no phase draws positive power.
pub fn load_imbalance_pct(phases: &[PhaseReading]) -> f64 {
    let max = phases
        .iter()
        .map(|p| p.power)
        .fold(f64::NEG_INFINITY, f64::max);
    let min = phases.iter().map(|p| p.power).fold(f64::INFINITY, f64::min);
    if max > 0.0 {
        (max - min) / max * 100.0
    } else {
        0.0
    }
}

/// Overall health: imbalance thresholds and the worst phase status, whichever
/// is more severe.
pub fn overall_health(phases: &[PhaseReading]) -> Status {
    let imbalance = load_imbalance_pct(phases);
    let worst_phase = phases
        .iter()
        .map(|p| p.status)
        .max()
        .unwrap_or_default();

    if imbalance > IMBALANCE_CRITICAL_PCT || worst_phase == Status::Critical {
        Status::Critical
    } else if imbalance > IMBALANCE_WARNING_PCT || worst_phase == Status::Warning {
        Status::Warning
    } else {
        Status::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::PhaseId;

    /// Builds a reading with an explicit power value, bypassing derivation.
    fn reading(name: PhaseId, voltage: f64, power: f64) -> PhaseReading {
        let mut p = PhaseReading::new(name, voltage, 15.0, 0.95);
        p.power = power;
        p
    }

    fn phases(powers: [f64; 3], voltages: [f64; 3]) -> [PhaseReading; 3] {
        [
            reading(PhaseId::R, voltages[0], powers[0]),
            reading(PhaseId::S, voltages[1], powers[1]),
            reading(PhaseId::T, voltages[2], powers[2]),
        ]
    }

    #[test]
    fn small_imbalance_is_normal() {
        let p = phases([3.3, 3.2, 3.3], [220.0, 221.0, 219.0]);
        let pct = load_imbalance_pct(&p);
        assert!((pct - 3.0303).abs() < 1e-3, "got {pct}");
        assert_eq!(overall_health(&p), Status::Normal);
    }

    #[test]
    fn critical_phase_escalates_with_zero_imbalance() {
        let p = phases([3.3, 3.3, 3.3], [250.0, 220.0, 220.0]);
        assert_eq!(p[0].status, Status::Critical);
        assert_eq!(load_imbalance_pct(&p), 0.0);
        assert_eq!(overall_health(&p), Status::Critical);
    }

    #[test]
    fn warning_phase_escalates_with_zero_imbalance() {
        let p = phases([3.0, 3.0, 3.0], [220.0, 240.0, 220.0]);
        assert_eq!(overall_health(&p), Status::Warning);
    }

    #[test]
    fn imbalance_alone_escalates() {
        // 15% spread, all phases normal
        let p = phases([4.0, 3.4, 4.0], [220.0, 220.0, 220.0]);
        assert_eq!(overall_health(&p), Status::Warning);

        // 25% spread
        let p = phases([4.0, 3.0, 4.0], [220.0, 220.0, 220.0]);
        assert_eq!(overall_health(&p), Status::Critical);
    }

    #[test]
    fn critical_imbalance_beats_warning_phase() {
        let p = phases([4.0, 2.0, 4.0], [240.0, 220.0, 220.0]);
        assert_eq!(overall_health(&p), Status::Critical);
    }

    #[test]
    fn zero_power_has_no_imbalance() {
        let p = phases([0.0, 0.0, 0.0], [220.0, 220.0, 220.0]);
        assert_eq!(load_imbalance_pct(&p), 0.0);
        assert_eq!(overall_health(&p), Status::Normal);
    }

    #[test]
    fn aggregates_are_rounded() {
        let p = [
            PhaseReading::new(PhaseId::R, 220.0, 15.0, 0.95),
            PhaseReading::new(PhaseId::S, 221.0, 14.5, 0.94),
            PhaseReading::new(PhaseId::T, 219.1, 15.2, 0.96),
        ];
        let m = PanelMetrics::from_phases(&p);
        assert_eq!(m.avg_voltage, 220.0);
        assert_eq!(m.total_current, 44.7);
        assert_eq!(m.total_power, round2(p[0].power + p[1].power + p[2].power));
    }

    #[test]
    fn metrics_display_does_not_panic() {
        let p = phases([3.3, 3.2, 3.3], [220.0, 221.0, 219.0]);
        let s = format!("{}", PanelMetrics::from_phases(&p));
        assert!(s.contains("health=normal"));
    }
}
