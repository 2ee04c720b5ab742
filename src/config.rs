//! TOML-based dashboard configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::logging::LogFormat;
use crate::sim::phase::{CurrentBand, VOLTAGE_MAX, VOLTAGE_MIN};
use crate::sim::types::{BuildingSpec, PhaseId, PhaseReading, SimConfig};

/// Top-level dashboard configuration parsed from TOML.
///
/// All sections have defaults matching the `campus` preset except
/// `buildings`, which the preset fills in. Load from TOML with
/// [`DashboardConfig::from_toml_file`] or use [`DashboardConfig::campus`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Tick timing, history sizing, and randomness.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// AI advisor collaborator.
    #[serde(default)]
    pub advisor: AdvisorConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Tracked buildings, in display order.
    #[serde(default)]
    pub buildings: Vec<BuildingConfig>,
}

/// Tick timing, history sizing, and randomness.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Period of the recurring tick in milliseconds (must be > 0).
    pub tick_interval_ms: u64,
    /// Random seed; absent means OS entropy.
    pub seed: Option<u64>,
    /// Maximum history points kept per building (must be > 0).
    pub history_capacity: usize,
    /// Synthetic history points produced at startup.
    pub backfill_points: usize,
    /// Spacing between synthetic points in seconds.
    pub backfill_spacing_secs: u64,
    /// Lower current bound (A).
    pub current_min_a: f64,
    /// Upper current bound (A).
    pub current_max_a: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 3000,
            seed: None,
            history_capacity: 20,
            backfill_points: 11,
            backfill_spacing_secs: 5,
            current_min_a: 0.0,
            current_max_a: 30.0,
        }
    }
}

/// AI advisor collaborator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdvisorConfig {
    /// Environment variable holding the API credential.
    pub api_key_env: String,
    /// Text-generation model identifier.
    pub model: String,
    /// Base URL of the text-generation service.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Site name used in the prompt.
    pub site_name: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key_env: "API_KEY".to_string(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 30,
            site_name: "UNUGHA campus".to_string(),
        }
    }
}

/// Log output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Line format.
    pub format: LogFormat,
    /// Write logs to a file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
}

/// One building and its seed readings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingConfig {
    /// Unique display name.
    pub name: String,
    /// Nominal per-phase power used to backfill history (kW).
    #[serde(default = "default_base_power_kw")]
    pub base_power_kw: f64,
    /// Seed readings; defaults to the standard R/S/T panel.
    #[serde(default = "default_phases")]
    pub phases: Vec<PhaseConfig>,
}

/// Seed reading for one phase.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhaseConfig {
    /// Phase identifier (`R`, `S`, or `T`).
    pub name: PhaseId,
    /// Initial voltage (V).
    pub voltage: f64,
    /// Initial current (A).
    pub current: f64,
    /// Fixed power factor, in (0, 1].
    pub power_factor: f64,
}

fn default_base_power_kw() -> f64 {
    3.3
}

fn default_phases() -> Vec<PhaseConfig> {
    vec![
        PhaseConfig {
            name: PhaseId::R,
            voltage: 220.0,
            current: 15.0,
            power_factor: 0.95,
        },
        PhaseConfig {
            name: PhaseId::S,
            voltage: 221.0,
            current: 14.5,
            power_factor: 0.94,
        },
        PhaseConfig {
            name: PhaseId::T,
            voltage: 219.0,
            current: 15.2,
            power_factor: 0.96,
        },
    ]
}

impl BuildingConfig {
    /// Standard panel with the given name.
    pub fn standard(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_power_kw: default_base_power_kw(),
            phases: default_phases(),
        }
    }

    /// Converts to an engine spec, ordering phases R/S/T.
    ///
    /// Returns `None` unless exactly one entry per phase is present; call
    /// [`DashboardConfig::validate`] first.
    pub fn to_spec(&self) -> Option<BuildingSpec> {
        let mut slots: [Option<PhaseReading>; 3] = [None, None, None];
        for p in &self.phases {
            let slot = &mut slots[p.name.index()];
            if slot.is_some() {
                return None;
            }
            *slot = Some(PhaseReading::new(p.name, p.voltage, p.current, p.power_factor));
        }
        let [Some(r), Some(s), Some(t)] = slots else {
            return None;
        };
        Some(BuildingSpec {
            name: self.name.clone(),
            base_power_kw: self.base_power_kw,
            phases: [r, s, t],
        })
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field} — {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.tick_interval_ms"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl DashboardConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["campus", "single"];

    /// Returns the multi-building campus preset.
    pub fn campus() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            advisor: AdvisorConfig::default(),
            logging: LoggingConfig::default(),
            buildings: vec![
                BuildingConfig::standard("Rectorate"),
                BuildingConfig {
                    base_power_kw: 3.6,
                    phases: vec![
                        PhaseConfig {
                            name: PhaseId::R,
                            voltage: 222.0,
                            current: 16.4,
                            power_factor: 0.93,
                        },
                        PhaseConfig {
                            name: PhaseId::S,
                            voltage: 219.5,
                            current: 15.8,
                            power_factor: 0.95,
                        },
                        PhaseConfig {
                            name: PhaseId::T,
                            voltage: 220.5,
                            current: 17.1,
                            power_factor: 0.94,
                        },
                    ],
                    ..BuildingConfig::standard("Engineering Faculty")
                },
                BuildingConfig {
                    base_power_kw: 2.6,
                    phases: vec![
                        PhaseConfig {
                            name: PhaseId::R,
                            voltage: 221.0,
                            current: 12.0,
                            power_factor: 0.97,
                        },
                        PhaseConfig {
                            name: PhaseId::S,
                            voltage: 220.0,
                            current: 11.6,
                            power_factor: 0.96,
                        },
                        PhaseConfig {
                            name: PhaseId::T,
                            voltage: 218.5,
                            current: 12.3,
                            power_factor: 0.97,
                        },
                    ],
                    ..BuildingConfig::standard("Library")
                },
            ],
        }
    }

    /// Returns the single-building preset (one panel, no selector needed).
    pub fn single() -> Self {
        Self {
            buildings: vec![BuildingConfig::standard("Main Panel")],
            ..Self::campus()
        }
    }

    /// Loads configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "campus" => Ok(Self::campus()),
            "single" => Ok(Self::single()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Engine configuration derived from the `[simulation]` section.
    pub fn sim_config(&self) -> SimConfig {
        let s = &self.simulation;
        SimConfig {
            tick_interval: Duration::from_millis(s.tick_interval_ms),
            history_capacity: s.history_capacity,
            backfill_points: s.backfill_points,
            backfill_spacing: Duration::from_secs(s.backfill_spacing_secs),
            current_band: CurrentBand {
                min_a: s.current_min_a,
                max_a: s.current_max_a,
            },
            seed: s.seed,
        }
    }

    /// Engine building specs, skipping any that fail validation.
    pub fn building_specs(&self) -> Vec<BuildingSpec> {
        self.buildings
            .iter()
            .filter_map(BuildingConfig::to_spec)
            .collect()
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.tick_interval_ms == 0 {
            errors.push(ConfigError::new("simulation.tick_interval_ms", "must be > 0"));
        }
        if s.history_capacity == 0 {
            errors.push(ConfigError::new("simulation.history_capacity", "must be > 0"));
        }
        if s.backfill_points > s.history_capacity {
            errors.push(ConfigError::new(
                "simulation.backfill_points",
                "must be <= simulation.history_capacity",
            ));
        }
        if !(s.current_min_a >= 0.0 && s.current_min_a < s.current_max_a) {
            errors.push(ConfigError::new(
                "simulation.current_min_a",
                "must be >= 0 and < simulation.current_max_a",
            ));
        }

        let a = &self.advisor;
        if a.api_key_env.trim().is_empty() {
            errors.push(ConfigError::new("advisor.api_key_env", "must not be empty"));
        }
        if a.model.trim().is_empty() {
            errors.push(ConfigError::new("advisor.model", "must not be empty"));
        }
        if a.timeout_secs == 0 {
            errors.push(ConfigError::new("advisor.timeout_secs", "must be > 0"));
        }

        if self.buildings.is_empty() {
            errors.push(ConfigError::new("buildings", "at least one building is required"));
        }

        let mut names = HashSet::new();
        for (i, b) in self.buildings.iter().enumerate() {
            let prefix = format!("buildings[{i}]");
            if b.name.trim().is_empty() {
                errors.push(ConfigError::new(format!("{prefix}.name"), "must not be empty"));
            } else if !names.insert(b.name.as_str()) {
                errors.push(ConfigError::new(
                    format!("{prefix}.name"),
                    format!("duplicate building name \"{}\"", b.name),
                ));
            }
            if b.base_power_kw < 0.0 {
                errors.push(ConfigError::new(format!("{prefix}.base_power_kw"), "must be >= 0"));
            }

            let mut seen = HashSet::new();
            for p in &b.phases {
                let field = format!("{prefix}.phases.{}", p.name);
                if !seen.insert(p.name) {
                    errors.push(ConfigError::new(field.clone(), "phase listed more than once"));
                }
                if !(p.power_factor > 0.0 && p.power_factor <= 1.0) {
                    errors.push(ConfigError::new(
                        format!("{field}.power_factor"),
                        "must be in (0.0, 1.0]",
                    ));
                }
                if !(VOLTAGE_MIN..=VOLTAGE_MAX).contains(&p.voltage) {
                    errors.push(ConfigError::new(
                        format!("{field}.voltage"),
                        format!("must be in [{VOLTAGE_MIN}, {VOLTAGE_MAX}]"),
                    ));
                }
                if p.current < s.current_min_a || p.current > s.current_max_a {
                    errors.push(ConfigError::new(
                        format!("{field}.current"),
                        "must be within the simulation current band",
                    ));
                }
            }
            if seen.len() != PhaseId::ALL.len() {
                errors.push(ConfigError::new(
                    format!("{prefix}.phases"),
                    "must list phases R, S and T exactly once",
                ));
            }
        }

        errors
    }
}
