//! Per-phase random-walk update and voltage classification.

use rand::Rng;

use super::types::{PhaseReading, Status};

/// Lowest voltage the panel simulation will report (V).
pub const VOLTAGE_MIN: f64 = 190.0;
/// Highest voltage the panel simulation will report (V).
pub const VOLTAGE_MAX: f64 = 250.0;

/// Full width of the per-tick voltage step; deltas fall in `[-2, +2]` V.
const VOLTAGE_STEP_SPAN: f64 = 4.0;
/// Full width of the per-tick current step; deltas fall in `[-0.75, +0.75]` A.
const CURRENT_STEP_SPAN: f64 = 1.5;

/// Outside this band a phase is critical.
const CRITICAL_LOW_V: f64 = 195.0;
const CRITICAL_HIGH_V: f64 = 245.0;
/// Outside this band (but inside the critical band) a phase is a warning.
const WARNING_LOW_V: f64 = 205.0;
const WARNING_HIGH_V: f64 = 235.0;

/// Inclusive bounds applied to the simulated current after each step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentBand {
    /// Lower bound (A).
    pub min_a: f64,
    /// Upper bound (A).
    pub max_a: f64,
}

impl Default for CurrentBand {
    fn default() -> Self {
        Self {
            min_a: 0.0,
            max_a: 30.0,
        }
    }
}

/// Rounds to one decimal place.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Rounds to two decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Real power in kW, rounded to two decimals.
pub fn power_kw(voltage: f64, current: f64, power_factor: f64) -> f64 {
    round2(voltage * current * power_factor / 1000.0)
}

/// Classifies a phase voltage. Critical is checked before warning.
///
/// # Examples
///
/// ```
/// use panel_sim::sim::phase::classify_voltage;
/// use panel_sim::sim::types::Status;
///
/// assert_eq!(classify_voltage(220.0), Status::Normal);
/// assert_eq!(classify_voltage(240.0), Status::Warning);
/// assert_eq!(classify_voltage(250.0), Status::Critical);
/// ```
pub fn classify_voltage(voltage: f64) -> Status {
    if voltage > CRITICAL_HIGH_V || voltage < CRITICAL_LOW_V {
        Status::Critical
    } else if voltage > WARNING_HIGH_V || voltage < WARNING_LOW_V {
        Status::Warning
    } else {
        Status::Normal
    }
}

/// Advances one phase by a single random-walk step.
///
/// Voltage moves by up to ±2 V and is clamped to
/// [`VOLTAGE_MIN`]..=[`VOLTAGE_MAX`]; current moves by up to ±0.75 A and is
/// clamped to `band`. Power and status are re-derived from the new values.
pub fn advance<R: Rng + ?Sized>(phase: &mut PhaseReading, rng: &mut R, band: CurrentBand) {
    let voltage_delta = (rng.random::<f64>() - 0.5) * VOLTAGE_STEP_SPAN;
    let current_delta = (rng.random::<f64>() - 0.5) * CURRENT_STEP_SPAN;

    phase.voltage += voltage_delta;
    phase.current += current_delta;
    settle(phase, band);
}

/// Rounds and clamps voltage and current, then re-derives power and status.
///
/// Applied to every reading the engine stores, seed readings included.
pub fn settle(phase: &mut PhaseReading, band: CurrentBand) {
    phase.voltage = round1(phase.voltage).clamp(VOLTAGE_MIN, VOLTAGE_MAX);
    phase.current = round1(phase.current).clamp(band.min_a, band.max_a);
    phase.power = power_kw(phase.voltage, phase.current, phase.power_factor);
    phase.status = classify_voltage(phase.voltage);
}
