//! Data model for energy-system snapshots.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection state between the installation and the utility grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridStatus {
    /// Drawing from or exporting to the utility grid.
    Connected,
    /// Running islanded on solar plus battery.
    Disconnected,
}

impl GridStatus {
    /// Returns `true` when the system runs islanded from the grid.
    pub fn is_islanded(self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Lowercase wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Condition rating for one subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Good,
    Warning,
    Critical,
}

impl HealthState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// One operator-facing notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Stable identifier ("1".."4" for pool alerts, named ids for triggers).
    pub id: String,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Cumulative production figures for the running calendar periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionTotals {
    pub today_kwh: f32,
    pub this_month_kwh: f32,
    pub this_year_kwh: f32,
}

/// Battery pack state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// State of charge in percent. Held in [20, 100] by construction.
    pub level: u8,
    /// Estimated runtime on battery alone at the current consumption.
    pub backup_hours: f32,
    /// Charging power (kW, >= 0; zero while discharging).
    pub charge_rate_kw: f32,
    /// Lifetime charge cycles.
    pub cycle_count: u32,
    /// Pack health in percent.
    pub health_percent: u8,
}

/// Percentage attribution of consumption to load categories.
///
/// The four fields sum to 100; configuration validation enforces this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionBreakdown {
    pub appliances: u8,
    pub hvac: u8,
    pub lights: u8,
    pub other: u8,
}

impl ConsumptionBreakdown {
    /// Sum of the four category percentages.
    pub fn total(self) -> u16 {
        u16::from(self.appliances) + u16::from(self.hvac) + u16::from(self.lights) + u16::from(self.other)
    }
}

/// Percentage attribution of current consumption to self-generated vs
/// utility-supplied power. The two fields always sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSplit {
    pub solar: u8,
    pub grid: u8,
}

impl SourceSplit {
    /// Builds a split from the solar share, clamped to [0, 100].
    pub fn from_solar(solar_percent: u8) -> Self {
        let solar = solar_percent.min(100);
        Self {
            solar,
            grid: 100 - solar,
        }
    }
}

/// Instantaneous consumption with its category and source attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    pub current_kw: f32,
    pub breakdown: ConsumptionBreakdown,
    pub split: SourceSplit,
}

/// Per-subsystem condition ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub panels: HealthState,
    pub inverter: HealthState,
    pub battery: HealthState,
    pub wiring: HealthState,
}

impl SystemHealth {
    /// Derives subsystem ratings from battery level and grid state.
    ///
    /// Panels and inverter report `Good`; the battery degrades to `Warning`
    /// below 30%; wiring is `Good` while islanded, and otherwise carries the
    /// supplied spot-check result.
    pub fn derive(battery_level: u8, grid: GridStatus, wiring_flagged: bool) -> Self {
        let wiring = if grid.is_islanded() || !wiring_flagged {
            HealthState::Good
        } else {
            HealthState::Warning
        };
        Self {
            panels: HealthState::Good,
            inverter: HealthState::Good,
            battery: battery_state_for_level(battery_level),
            wiring,
        }
    }
}

/// Battery subsystem rating for a state-of-charge percentage.
pub fn battery_state_for_level(level: u8) -> HealthState {
    if level < 30 {
        HealthState::Warning
    } else {
        HealthState::Good
    }
}

/// One point on the intraday production curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyProduction {
    /// Hour of day, 6 through 19.
    pub hour: u32,
    pub kw: f32,
}

/// Daily energy totals for the trailing-week chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEnergy {
    /// Display label, e.g. "Mar 04".
    pub day: String,
    pub consumption_kwh: f32,
    pub production_kwh: f32,
}

/// Weather conditions affecting production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherImpact {
    pub sunlight_hours: f32,
    pub cloud_cover_percent: u8,
    pub temperature_c: f32,
}

/// One complete, internally consistent view of the energy system at a point
/// in time.
///
/// Snapshots are plain values: the generator creates them, the updater blends
/// a previous snapshot with a fresh one, and the feed replaces its current
/// snapshot wholesale. Nothing mutates a snapshot in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySnapshot {
    pub generated_at: DateTime<Utc>,
    pub current_production_kw: f32,
    pub totals: ProductionTotals,
    pub battery: BatteryStatus,
    pub grid: GridStatus,
    pub consumption: Consumption,
    pub health: SystemHealth,
    /// Newest-relevant-first; trigger alerts are prepended at generation time.
    pub alerts: Vec<Alert>,
    /// Exactly one entry per daylight hour, 6 through 19.
    pub hourly_production: Vec<HourlyProduction>,
    /// Trailing seven days, oldest first.
    pub daily_consumption: Vec<DailyEnergy>,
    pub weather: WeatherImpact,
}

impl EnergySnapshot {
    /// Instantaneous production minus consumption (kW).
    pub fn energy_balance_kw(&self) -> f32 {
        self.current_production_kw - self.consumption.current_kw
    }
}

impl fmt::Display for EnergySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | prod={:>4.1} kW  cons={:>4.1} kW | battery={:>3}% \
             (backup {:.1} h, charge {:.1} kW) | grid={}  split={}%/{}% | alerts={}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.current_production_kw,
            self.consumption.current_kw,
            self.battery.level,
            self.battery.backup_hours,
            self.battery.charge_rate_kw,
            self.grid.as_str(),
            self.consumption.split.solar,
            self.consumption.split.grid,
            self.alerts.len(),
        )
    }
}
