//! Pure time-of-day and seasonal shape functions.
//!
//! Everything here is arithmetic over hours, dates, and an injected RNG; the
//! generator composes these shapes into full snapshots.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;
use rand::rngs::StdRng;

/// Monthly production multipliers, January through December.
///
/// Kenyan climate bias: dry-season months produce above baseline, the long
/// rains (March-May) and short rains (October-December) below it.
pub const PRODUCTION_SEASONAL: [f32; 12] = [
    1.05, 1.1, 0.9, 0.8, 0.85, 0.95, 0.9, 0.95, 1.0, 0.85, 0.8, 0.9,
];

/// Monthly consumption multipliers, January through December.
pub const CONSUMPTION_SEASONAL: [f32; 12] = [
    0.9, 0.95, 1.0, 1.05, 1.0, 0.9, 0.85, 0.9, 0.95, 1.0, 1.05, 1.0,
];

/// Rounds to one decimal place, the resolution of all reported kW/kWh values.
pub fn round1(x: f32) -> f32 {
    (x * 10.0).round() / 10.0
}

/// Unjittered solar output (kW) for an hour of day.
///
/// Piecewise-linear daylight curve: morning ramp to 2.2 kW by 8h, climb to
/// the 6.6 kW noon peak, a flat midday plateau with slight decline, then an
/// afternoon falloff. Zero outside 6..=19.
pub fn hourly_production_base_kw(hour: u32) -> f32 {
    match hour {
        6..=7 => (hour - 6) as f32 * 1.1,
        8..=11 => 2.2 + (hour - 8) as f32 * 1.1,
        12..=14 => 6.6 - (hour - 12) as f32 * 0.1,
        15..=19 => 6.3 - (hour - 15) as f32 * 1.3,
        _ => 0.0,
    }
}

/// Samples instantaneous household consumption (kW) for an hour of day.
///
/// Four-band step function: morning peak (breakfast), daytime lull, evening
/// peak (dinner, lights), and overnight minimum, each jittered uniformly
/// within its band.
pub fn consumption_kw(hour: u32, rng: &mut StdRng) -> f32 {
    match hour {
        6..=8 => 3.5 + rng.random_range(0.0..0.5),
        9..=16 => 2.0 + rng.random_range(0.0..0.5),
        17..=21 => 4.0 + rng.random_range(0.0..1.0),
        _ => 1.0 + rng.random_range(0.0..0.5),
    }
}

/// Battery state-of-charge baseline (percent) for an hour of day.
///
/// Rises through the morning and midday charge window, peaks near 90% in the
/// late afternoon, and discharges through the evening and night. The
/// instantaneous energy balance perturbs this baseline afterwards.
pub fn battery_baseline_percent(hour: u32) -> f32 {
    match hour {
        6..=9 => 50.0 + (hour - 6) as f32 * 3.0,
        10..=15 => 65.0 + (hour - 10) as f32 * 5.0,
        16..=21 => 90.0 - (hour - 16) as f32 * 4.0,
        22..=23 => 60.0 - (hour - 22) as f32 * 3.0,
        _ => 60.0 - (hour + 2) as f32,
    }
}

/// Whether the date falls on a Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Number of days in the given month (1-based), accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

/// Samples the day's solar yield (kWh): baseline scaled by the month's
/// seasonal factor and a uniform weather jitter in [0.8, 1.2).
pub fn daily_production_kwh(
    date: NaiveDate,
    base_kwh: f32,
    seasonal: &[f32; 12],
    rng: &mut StdRng,
) -> f32 {
    let factor = seasonal[date.month0() as usize];
    let variation = rng.random_range(0.8..1.2);
    round1(base_kwh * factor * variation)
}

/// Samples the day's consumption (kWh): baseline scaled by the month's
/// seasonal factor, a uniform jitter in [0.85, 1.15), and the weekend
/// multiplier on Saturdays and Sundays.
pub fn daily_consumption_kwh(
    date: NaiveDate,
    base_kwh: f32,
    weekend_factor: f32,
    seasonal: &[f32; 12],
    rng: &mut StdRng,
) -> f32 {
    let factor = seasonal[date.month0() as usize];
    let variation = rng.random_range(0.85..1.15);
    let weekend = if is_weekend(date) { weekend_factor } else { 1.0 };
    round1(base_kwh * factor * variation * weekend)
}
