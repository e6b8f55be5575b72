//! Incremental snapshot refresh: exponential smoothing over a previous
//! snapshot, with battery/grid/split re-derived from the blended figures.

use chrono::{DateTime, Utc};

use crate::snapshot::{
    BatteryStatus, Consumption, EnergySnapshot, GridStatus, SourceSplit, SystemHealth,
    battery_state_for_level,
};

use super::generator::{SnapshotGenerator, backup_hours};
use super::profile::round1;

impl SnapshotGenerator {
    /// Produces the next snapshot from a previous one.
    ///
    /// Generates a fresh snapshot internally, blends the headline production
    /// and consumption figures (`(1-a)*previous + a*fresh`, smoothing factor
    /// from the configuration) to avoid visible jumps on a polling cadence,
    /// then re-derives battery level, grid status, and the solar/grid split
    /// from the blended energy balance. Cumulative totals, charts, weather,
    /// and alerts carry over from the previous snapshot unchanged.
    pub fn refresh(&mut self, previous: &EnergySnapshot, now: DateTime<Utc>) -> EnergySnapshot {
        let fresh = self.generate_at(now);
        let alpha = self.cfg.simulation.smoothing;

        let production_kw = round1(
            previous.current_production_kw * (1.0 - alpha) + fresh.current_production_kw * alpha,
        );
        let consumption_kw = round1(
            previous.consumption.current_kw * (1.0 - alpha) + fresh.consumption.current_kw * alpha,
        );
        let balance_kw = production_kw - consumption_kw;

        // Cap the floor so an unvalidated config cannot invert the clamp.
        let floor = (self.cfg.battery.floor_percent as f32).min(100.0);
        let previous_level = previous.battery.level as f32;
        let (level_raw, charge_rate_kw) = if balance_kw > 0.0 {
            ((previous_level + balance_kw * 0.5).min(100.0), round1(balance_kw))
        } else {
            ((previous_level + balance_kw).max(floor), 0.0)
        };
        let level = level_raw.clamp(floor, 100.0).round() as u8;

        // Hysteresis: island on a charged surplus, reconnect on a low battery
        // or a clear deficit, otherwise keep the previous state.
        let grid = if level > 80 && balance_kw > 0.0 {
            GridStatus::Disconnected
        } else if level < 30 || balance_kw < -1.0 {
            GridStatus::Connected
        } else {
            previous.grid
        };

        // Blended split uses direct solar only; the assist path belongs to
        // full generation.
        let split = if consumption_kw > 0.0 {
            let direct_kw = production_kw.min(consumption_kw);
            SourceSplit::from_solar((direct_kw / consumption_kw * 100.0).round() as u8)
        } else {
            previous.consumption.split
        };

        let health = SystemHealth {
            battery: battery_state_for_level(level),
            ..previous.health
        };

        EnergySnapshot {
            generated_at: now,
            current_production_kw: production_kw,
            totals: previous.totals.clone(),
            battery: BatteryStatus {
                level,
                backup_hours: backup_hours(level, consumption_kw),
                charge_rate_kw,
                cycle_count: previous.battery.cycle_count,
                health_percent: previous.battery.health_percent,
            },
            grid,
            consumption: Consumption {
                current_kw: consumption_kw,
                breakdown: previous.consumption.breakdown,
                split,
            },
            health,
            alerts: previous.alerts.clone(),
            hourly_production: previous.hourly_production.clone(),
            daily_consumption: previous.daily_consumption.clone(),
            weather: previous.weather.clone(),
        }
    }
}
