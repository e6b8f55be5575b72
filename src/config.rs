//! TOML-based site configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Top-level site configuration parsed from TOML.
///
/// All fields have defaults matching the baseline installation. Load from
/// TOML with [`SiteConfig::from_toml_file`] or use [`SiteConfig::baseline`]
/// for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Seed, smoothing, and feed parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Solar production parameters.
    #[serde(default)]
    pub production: ProductionConfig,
    /// Household consumption parameters.
    #[serde(default)]
    pub consumption: ConsumptionConfig,
    /// Battery parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
}

/// Seed, smoothing, and feed parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed.
    pub seed: u64,
    /// Weight of the fresh sample when blending updates (must be in (0, 1]).
    pub smoothing: f32,
    /// Per-tick probability of a full regeneration instead of a blended
    /// update (must be in [0, 1]).
    pub resync_probability: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            smoothing: 0.2,
            resync_probability: 0.03,
        }
    }
}

/// Solar production parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductionConfig {
    /// Baseline daily yield (kWh) before seasonal scaling.
    pub base_daily_kwh: f32,
    /// Monthly production multipliers, January through December.
    pub seasonal: [f32; 12],
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            base_daily_kwh: 25.0,
            seasonal: crate::sim::profile::PRODUCTION_SEASONAL,
        }
    }
}

/// Household consumption parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumptionConfig {
    /// Baseline daily consumption (kWh) before seasonal scaling.
    pub base_daily_kwh: f32,
    /// Multiplier applied on Saturdays and Sundays.
    pub weekend_factor: f32,
    /// Monthly consumption multipliers, January through December.
    pub seasonal: [f32; 12],
    /// Fixed category percentages (must sum to 100).
    pub breakdown: BreakdownConfig,
}

impl Default for ConsumptionConfig {
    fn default() -> Self {
        Self {
            base_daily_kwh: 18.0,
            weekend_factor: 1.15,
            seasonal: crate::sim::profile::CONSUMPTION_SEASONAL,
            breakdown: BreakdownConfig::default(),
        }
    }
}

/// Fixed consumption-category percentages.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreakdownConfig {
    pub appliances: u8,
    pub hvac: u8,
    pub lights: u8,
    pub other: u8,
}

impl Default for BreakdownConfig {
    fn default() -> Self {
        Self {
            appliances: 40,
            hvac: 30,
            lights: 15,
            other: 15,
        }
    }
}

impl BreakdownConfig {
    /// Sum of the four category percentages.
    pub fn total(self) -> u16 {
        u16::from(self.appliances) + u16::from(self.hvac) + u16::from(self.lights) + u16::from(self.other)
    }
}

/// Battery parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Lowest state of charge the model will report (percent).
    pub floor_percent: u8,
    /// Maximum power the battery contributes to the solar share when
    /// production falls short (kW).
    pub assist_max_kw: f32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            floor_percent: 20,
            assist_max_kw: 2.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.smoothing"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl SiteConfig {
    /// Returns the baseline site: Kenyan seasonal tables, 25/18 kWh daily
    /// production and consumption baselines.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            production: ProductionConfig::default(),
            consumption: ConsumptionConfig::default(),
            battery: BatteryConfig::default(),
        }
    }

    /// Returns the equatorial preset: flat seasonal tables, otherwise the
    /// baseline parameters.
    pub fn equatorial() -> Self {
        Self {
            production: ProductionConfig {
                seasonal: [1.0; 12],
                ..ProductionConfig::default()
            },
            consumption: ConsumptionConfig {
                seasonal: [1.0; 12],
                ..ConsumptionConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "equatorial"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "equatorial" => Ok(Self::equatorial()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if !(s.smoothing > 0.0 && s.smoothing <= 1.0) {
            errors.push(ConfigError {
                field: "simulation.smoothing".into(),
                message: "must be in (0.0, 1.0]".into(),
            });
        }
        if !(0.0..=1.0).contains(&s.resync_probability) {
            errors.push(ConfigError {
                field: "simulation.resync_probability".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }

        let p = &self.production;
        if p.base_daily_kwh <= 0.0 {
            errors.push(ConfigError {
                field: "production.base_daily_kwh".into(),
                message: "must be > 0".into(),
            });
        }
        if p.seasonal.iter().any(|f| *f <= 0.0) {
            errors.push(ConfigError {
                field: "production.seasonal".into(),
                message: "every monthly factor must be > 0".into(),
            });
        }

        let c = &self.consumption;
        if c.base_daily_kwh <= 0.0 {
            errors.push(ConfigError {
                field: "consumption.base_daily_kwh".into(),
                message: "must be > 0".into(),
            });
        }
        if c.weekend_factor <= 0.0 {
            errors.push(ConfigError {
                field: "consumption.weekend_factor".into(),
                message: "must be > 0".into(),
            });
        }
        if c.seasonal.iter().any(|f| *f <= 0.0) {
            errors.push(ConfigError {
                field: "consumption.seasonal".into(),
                message: "every monthly factor must be > 0".into(),
            });
        }
        if c.breakdown.total() != 100 {
            errors.push(ConfigError {
                field: "consumption.breakdown".into(),
                message: format!("percentages must sum to 100, got {}", c.breakdown.total()),
            });
        }

        let b = &self.battery;
        if b.floor_percent > 100 {
            errors.push(ConfigError {
                field: "battery.floor_percent".into(),
                message: "must be <= 100".into(),
            });
        }
        if b.assist_max_kw < 0.0 {
            errors.push(ConfigError {
                field: "battery.assist_max_kw".into(),
                message: "must be >= 0".into(),
            });
        }

        errors
    }
}
