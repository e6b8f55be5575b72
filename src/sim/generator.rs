//! Snapshot generator: composes the profile curves into full system state.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SiteConfig;
use crate::snapshot::{
    BatteryStatus, Consumption, ConsumptionBreakdown, DailyEnergy, EnergySnapshot, GridStatus,
    HourlyProduction, ProductionTotals, SourceSplit, SystemHealth, WeatherImpact,
};

use super::{alerts, profile};

/// First hour of the reported production curve (inclusive).
pub const FIRST_DAYLIGHT_HOUR: u32 = 6;

/// Last hour of the reported production curve (inclusive).
pub const LAST_DAYLIGHT_HOUR: u32 = 19;

/// Battery level above which the system may island from the grid.
const ISLAND_LEVEL_PERCENT: u8 = 80;

/// Battery level below which it no longer assists the solar share.
const ASSIST_FLOOR_PERCENT: u8 = 30;

/// Probability of a wiring warning while grid-connected.
const WIRING_WARNING_PROBABILITY: f64 = 0.1;

/// Produces internally consistent [`EnergySnapshot`] values.
///
/// All randomness comes from one owned seeded RNG, so two generators built
/// with the same configuration and queried at the same timestamps emit
/// identical snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotGenerator {
    pub(crate) cfg: SiteConfig,
    pub(crate) rng: StdRng,
}

impl SnapshotGenerator {
    /// Creates a generator seeded from the configuration.
    pub fn new(cfg: &SiteConfig) -> Self {
        Self::with_seed(cfg, cfg.simulation.seed)
    }

    /// Creates a generator with an explicit seed override.
    pub fn with_seed(cfg: &SiteConfig, seed: u64) -> Self {
        Self {
            cfg: cfg.clone(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generates a snapshot for the current wall-clock time.
    pub fn generate(&mut self) -> EnergySnapshot {
        self.generate_at(Utc::now())
    }

    /// Generates a snapshot for an explicit moment.
    ///
    /// Total over its input domain: any valid timestamp yields a snapshot.
    pub fn generate_at(&mut self, now: DateTime<Utc>) -> EnergySnapshot {
        let hour = now.hour();
        let today = now.date_naive();

        let hourly_production = self.hourly_curve();
        let daily_consumption = self.trailing_week(today);
        let totals = self.production_totals(today);

        // Current production comes from the already-jittered curve so the
        // headline number matches the chart.
        let current_production_kw = hourly_production
            .iter()
            .find(|h| h.hour == hour)
            .map_or(0.0, |h| h.kw);

        let current_consumption_kw = profile::round1(profile::consumption_kw(hour, &mut self.rng));
        let balance_kw = current_production_kw - current_consumption_kw;

        let level = self.battery_level(hour, balance_kw);
        let grid = grid_status(level, balance_kw);
        let split = self.source_split(current_production_kw, current_consumption_kw, level);

        let wiring_flagged = self.rng.random_bool(WIRING_WARNING_PROBABILITY);
        let health = SystemHealth::derive(level, grid, wiring_flagged);

        let mut snapshot_alerts = alerts::baseline_alerts(now, &mut self.rng);
        let triggered = alerts::trigger_alerts(level, grid, now);
        snapshot_alerts.splice(0..0, triggered);

        let charge_rate_kw = profile::round1(balance_kw.max(0.0));
        let backup_hours = backup_hours(level, current_consumption_kw);

        let battery = BatteryStatus {
            level,
            backup_hours,
            charge_rate_kw,
            cycle_count: 127 + self.rng.random_range(0..5),
            health_percent: 94 - self.rng.random_range(0..3),
        };

        let weather = WeatherImpact {
            sunlight_hours: self.rng.random_range(7.0..10.0),
            cloud_cover_percent: self.rng.random_range(0..30),
            temperature_c: (22 + self.rng.random_range(0..6)) as f32,
        };

        let b = self.cfg.consumption.breakdown;
        EnergySnapshot {
            generated_at: now,
            current_production_kw,
            totals,
            battery,
            grid,
            consumption: Consumption {
                current_kw: current_consumption_kw,
                breakdown: ConsumptionBreakdown {
                    appliances: b.appliances,
                    hvac: b.hvac,
                    lights: b.lights,
                    other: b.other,
                },
                split,
            },
            health,
            alerts: snapshot_alerts,
            hourly_production,
            daily_consumption,
            weather,
        }
    }

    /// Builds the intraday production curve, one jittered point per daylight
    /// hour.
    fn hourly_curve(&mut self) -> Vec<HourlyProduction> {
        (FIRST_DAYLIGHT_HOUR..=LAST_DAYLIGHT_HOUR)
            .map(|hour| {
                let base = profile::hourly_production_base_kw(hour);
                let jitter = self.rng.random_range(0.9..1.1);
                HourlyProduction {
                    hour,
                    kw: profile::round1((base * jitter).max(0.0)),
                }
            })
            .collect()
    }

    /// Daily production/consumption pairs for the trailing week, oldest first.
    fn trailing_week(&mut self, today: NaiveDate) -> Vec<DailyEnergy> {
        (0..7)
            .rev()
            .map(|back| {
                let date = today - Duration::days(back);
                DailyEnergy {
                    day: date.format("%b %d").to_string(),
                    production_kwh: self.sample_daily_production(date),
                    consumption_kwh: self.sample_daily_consumption(date),
                }
            })
            .collect()
    }

    /// Cumulative production totals for the running day, month, and year.
    ///
    /// The month figure sums sampled daily yields; the year figure is the
    /// deterministic seasonal expectation (baseline x factor x days).
    fn production_totals(&mut self, today: NaiveDate) -> ProductionTotals {
        let today_kwh = self.sample_daily_production(today);

        let mut month_kwh = 0.0;
        for day in 1..=today.day() {
            if let Some(date) = today.with_day(day) {
                month_kwh += self.sample_daily_production(date);
            }
        }

        let base = self.cfg.production.base_daily_kwh;
        let mut year_kwh = 0.0;
        for month0 in 0..=today.month0() {
            let factor = self.cfg.production.seasonal[month0 as usize];
            let days = profile::days_in_month(today.year(), month0 + 1) as f32;
            year_kwh += base * factor * days;
        }

        ProductionTotals {
            today_kwh,
            this_month_kwh: profile::round1(month_kwh),
            this_year_kwh: profile::round1(year_kwh),
        }
    }

    pub(crate) fn sample_daily_production(&mut self, date: NaiveDate) -> f32 {
        profile::daily_production_kwh(
            date,
            self.cfg.production.base_daily_kwh,
            &self.cfg.production.seasonal,
            &mut self.rng,
        )
    }

    pub(crate) fn sample_daily_consumption(&mut self, date: NaiveDate) -> f32 {
        profile::daily_consumption_kwh(
            date,
            self.cfg.consumption.base_daily_kwh,
            self.cfg.consumption.weekend_factor,
            &self.cfg.consumption.seasonal,
            &mut self.rng,
        )
    }

    /// Battery level: the time-of-day baseline nudged by the energy balance.
    ///
    /// Surplus charges at 2%/kW, deficit discharges at 3%/kW; the result is
    /// clamped to [floor, 100] and rounded to a whole percent.
    fn battery_level(&self, hour: u32, balance_kw: f32) -> u8 {
        // Cap the floor so an unvalidated config cannot invert the clamp.
        let floor = (self.cfg.battery.floor_percent as f32).min(100.0);
        let base = profile::battery_baseline_percent(hour);
        let adjusted = if balance_kw > 0.0 {
            (base + balance_kw * 2.0).min(100.0)
        } else if balance_kw < 0.0 {
            (base + balance_kw * 3.0).max(floor)
        } else {
            base
        };
        adjusted.clamp(floor, 100.0).round() as u8
    }

    /// Solar share of current consumption, with battery assist during a
    /// production deficit.
    fn source_split(&self, production_kw: f32, consumption_kw: f32, level: u8) -> SourceSplit {
        if consumption_kw <= 0.0 {
            return SourceSplit::from_solar(0);
        }

        let mut solar = (production_kw / consumption_kw * 100.0).min(100.0);
        if production_kw < consumption_kw && level > ASSIST_FLOOR_PERCENT {
            let headroom = (level - ASSIST_FLOOR_PERCENT) as f32 / 100.0 * self.cfg.battery.assist_max_kw;
            let assist_kw = (consumption_kw - production_kw).min(headroom);
            solar = ((production_kw + assist_kw) / consumption_kw * 100.0).min(100.0);
        }

        SourceSplit::from_solar(solar.round() as u8)
    }
}

/// Grid connection rule: island only on a charged battery with surplus
/// production.
pub(crate) fn grid_status(level: u8, balance_kw: f32) -> GridStatus {
    if level > ISLAND_LEVEL_PERCENT && balance_kw > 0.0 {
        GridStatus::Disconnected
    } else {
        GridStatus::Connected
    }
}

/// Estimated runtime on battery alone (hours), quadratic in the charge level
/// so full packs are favored. Exactly zero when nothing is being consumed.
pub(crate) fn backup_hours(level: u8, consumption_kw: f32) -> f32 {
    if consumption_kw > 0.0 {
        let frac = level as f32 / 100.0;
        profile::round1(frac * frac * 10.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{HealthState, Severity};
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, hour, 0, 0).unwrap()
    }

    fn generator() -> SnapshotGenerator {
        SnapshotGenerator::new(&SiteConfig::baseline())
    }

    #[test]
    fn hourly_curve_covers_daylight_hours() {
        let snapshot = generator().generate_at(at(12));
        assert_eq!(snapshot.hourly_production.len(), 14);
        assert_eq!(snapshot.hourly_production[0].hour, 6);
        assert_eq!(snapshot.hourly_production[13].hour, 19);
        assert!(snapshot.hourly_production.iter().all(|h| h.kw >= 0.0));
    }

    #[test]
    fn trailing_week_has_seven_days() {
        let snapshot = generator().generate_at(at(12));
        assert_eq!(snapshot.daily_consumption.len(), 7);
        assert!(
            snapshot
                .daily_consumption
                .iter()
                .all(|d| d.production_kwh > 0.0 && d.consumption_kwh > 0.0)
        );
    }

    #[test]
    fn production_zero_at_night() {
        let snapshot = generator().generate_at(at(2));
        assert_eq!(snapshot.current_production_kw, 0.0);
        assert_eq!(snapshot.battery.charge_rate_kw, 0.0);
        assert_eq!(snapshot.grid, GridStatus::Connected);
    }

    #[test]
    fn noon_in_january_is_plausible() {
        // January factor 1.05; noon base 6.6 kW, jitter at most 1.1x.
        for seed in 0..20 {
            let cfg = SiteConfig::baseline();
            let mut generator = SnapshotGenerator::with_seed(&cfg, seed);
            let snapshot = generator.generate_at(at(12));
            assert!(
                (0.0..=8.0).contains(&snapshot.current_production_kw),
                "seed {seed}: {}",
                snapshot.current_production_kw
            );
            let expected = grid_status(snapshot.battery.level, snapshot.energy_balance_kw());
            assert_eq!(snapshot.grid, expected, "seed {seed}");
        }
    }

    #[test]
    fn battery_level_stays_in_bounds() {
        for seed in 0..30 {
            let cfg = SiteConfig::baseline();
            let mut generator = SnapshotGenerator::with_seed(&cfg, seed);
            for hour in 0..24 {
                let snapshot = generator.generate_at(at(hour));
                assert!(
                    (20..=100).contains(&snapshot.battery.level),
                    "seed {seed} hour {hour}: {}",
                    snapshot.battery.level
                );
            }
        }
    }

    #[test]
    fn island_rule_holds() {
        for seed in 0..30 {
            let cfg = SiteConfig::baseline();
            let mut generator = SnapshotGenerator::with_seed(&cfg, seed);
            for hour in 0..24 {
                let snapshot = generator.generate_at(at(hour));
                let surplus = snapshot.energy_balance_kw() > 0.0;
                if snapshot.battery.level > 80 && surplus {
                    assert_eq!(snapshot.grid, GridStatus::Disconnected);
                } else {
                    assert_eq!(snapshot.grid, GridStatus::Connected);
                }
            }
        }
    }

    #[test]
    fn split_always_sums_to_100() {
        for seed in 0..30 {
            let cfg = SiteConfig::baseline();
            let mut generator = SnapshotGenerator::with_seed(&cfg, seed);
            for hour in 0..24 {
                let snapshot = generator.generate_at(at(hour));
                let split = snapshot.consumption.split;
                assert_eq!(u16::from(split.solar) + u16::from(split.grid), 100);
            }
        }
    }

    #[test]
    fn breakdown_sums_to_100() {
        let snapshot = generator().generate_at(at(12));
        assert_eq!(snapshot.consumption.breakdown.total(), 100);
    }

    #[test]
    fn totals_accumulate_through_the_year() {
        let snapshot = generator().generate_at(at(12));
        assert!(snapshot.totals.today_kwh > 0.0);
        assert!(snapshot.totals.this_month_kwh >= snapshot.totals.today_kwh);
        assert!(snapshot.totals.this_year_kwh >= snapshot.totals.this_month_kwh);
    }

    #[test]
    fn monthly_total_grows_with_the_date() {
        let mut a = generator();
        let early = a.production_totals(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        let mut b = generator();
        let late = b.production_totals(NaiveDate::from_ymd_opt(2025, 1, 25).unwrap());
        assert!(late.this_month_kwh > early.this_month_kwh);
    }

    #[test]
    fn islanded_snapshot_reports_island_alert_first() {
        // Find a seed/hour that islands, then check alert ordering.
        for seed in 0..200 {
            let cfg = SiteConfig::baseline();
            let mut generator = SnapshotGenerator::with_seed(&cfg, seed);
            for hour in 10..16 {
                let snapshot = generator.generate_at(at(hour));
                if snapshot.grid.is_islanded() {
                    assert_eq!(snapshot.alerts[0].id, alerts::GRID_ISLAND_ID);
                    assert_eq!(snapshot.alerts[0].severity, Severity::Info);
                    assert_eq!(snapshot.health.wiring, HealthState::Good);
                    return;
                }
            }
        }
        panic!("no islanded snapshot found across 200 seeds");
    }

    #[test]
    fn backup_hours_zero_without_consumption() {
        assert_eq!(backup_hours(80, 0.0), 0.0);
        assert_eq!(backup_hours(100, 2.0), 10.0);
        assert_eq!(backup_hours(50, 2.0), 2.5);
    }

    #[test]
    fn battery_health_fields_in_range() {
        let snapshot = generator().generate_at(at(12));
        assert!((127..132).contains(&snapshot.battery.cycle_count));
        assert!((92..=94).contains(&snapshot.battery.health_percent));
        assert!(snapshot.battery.backup_hours >= 0.0);
    }

    #[test]
    fn weather_impact_in_expected_ranges() {
        let snapshot = generator().generate_at(at(12));
        let w = &snapshot.weather;
        assert!((7.0..10.0).contains(&w.sunlight_hours));
        assert!(w.cloud_cover_percent < 30);
        assert!((22.0..28.0).contains(&w.temperature_c));
    }

    #[test]
    fn same_seed_same_timestamp_identical_snapshots() {
        let cfg = SiteConfig::baseline();
        let mut a = SnapshotGenerator::with_seed(&cfg, 7);
        let mut b = SnapshotGenerator::with_seed(&cfg, 7);
        assert_eq!(a.generate_at(at(9)), b.generate_at(at(9)));
        assert_eq!(a.generate_at(at(18)), b.generate_at(at(18)));
    }

    #[test]
    fn different_seeds_diverge() {
        let cfg = SiteConfig::baseline();
        let mut a = SnapshotGenerator::with_seed(&cfg, 7);
        let mut b = SnapshotGenerator::with_seed(&cfg, 8);
        assert_ne!(a.generate_at(at(9)), b.generate_at(at(9)));
    }

    #[test]
    fn oversized_battery_floor_does_not_panic() {
        // An unvalidated config may carry a floor above 100%.
        let mut cfg = SiteConfig::baseline();
        cfg.battery.floor_percent = 150;
        let mut generator = SnapshotGenerator::with_seed(&cfg, 1);
        for hour in 0..24 {
            let snapshot = generator.generate_at(at(hour));
            assert!(snapshot.battery.level <= 100, "hour {hour}");
        }
    }

    #[test]
    fn low_battery_level_forces_warning_and_alert() {
        // The balance perturbation cannot push a generated level below 30 on
        // its own, so exercise the rules directly at a forced level.
        let now = at(12);
        let health = SystemHealth::derive(25, GridStatus::Connected, false);
        assert_eq!(health.battery, HealthState::Warning);
        let triggered = alerts::trigger_alerts(25, GridStatus::Connected, now);
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].id, alerts::LOW_BATTERY_ID);
        assert_eq!(triggered[0].severity, Severity::Warning);
    }
}
