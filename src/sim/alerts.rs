//! Alert pools and state-triggered alerts.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::rngs::StdRng;

use crate::snapshot::{Alert, GridStatus, Severity};

/// Routine informational messages.
pub const INFO_MESSAGES: [&str; 5] = [
    "System update available",
    "Energy production exceeding expectations",
    "Battery performance optimal",
    "Grid connection stable",
    "Solar panel efficiency at 98%",
];

/// Maintenance and drift warnings.
pub const WARNING_MESSAGES: [&str; 5] = [
    "Wiring inspection recommended",
    "Battery charge cycles increasing",
    "Solar panel cleaning recommended",
    "Grid power fluctuations detected",
    "Energy consumption above average",
];

/// Fault-level messages.
pub const CRITICAL_MESSAGES: [&str; 5] = [
    "Battery temperature high",
    "Inverter malfunction detected",
    "Grid connection lost",
    "System overload detected",
    "Emergency shutdown initiated",
];

/// Probability of a critical entry appearing in the baseline set.
const CRITICAL_PROBABILITY: f64 = 0.3;

/// Alert id reported when the battery drops below 30%.
pub const LOW_BATTERY_ID: &str = "low-battery";

/// Alert id reported while the system runs islanded.
pub const GRID_ISLAND_ID: &str = "grid-disconnected";

fn pick(pool: &[&str], rng: &mut StdRng) -> String {
    pool[rng.random_range(0..pool.len())].to_string()
}

/// Generates the recurring alert set with backdated timestamps.
///
/// Always emits a warning (2 days back), an info (5 days back), and a second
/// info (3 days back); a critical entry (1 day back) appears with 30%
/// probability between them.
pub fn baseline_alerts(now: DateTime<Utc>, rng: &mut StdRng) -> Vec<Alert> {
    let mut alerts = vec![
        Alert {
            id: "1".to_string(),
            severity: Severity::Warning,
            message: pick(&WARNING_MESSAGES, rng),
            timestamp: now - Duration::days(2),
        },
        Alert {
            id: "2".to_string(),
            severity: Severity::Info,
            message: pick(&INFO_MESSAGES, rng),
            timestamp: now - Duration::days(5),
        },
    ];

    if rng.random_bool(CRITICAL_PROBABILITY) {
        alerts.push(Alert {
            id: "3".to_string(),
            severity: Severity::Critical,
            message: pick(&CRITICAL_MESSAGES, rng),
            timestamp: now - Duration::days(1),
        });
    }

    alerts.push(Alert {
        id: "4".to_string(),
        severity: Severity::Info,
        message: pick(&INFO_MESSAGES, rng),
        timestamp: now - Duration::days(3),
    });

    alerts
}

/// Alerts demanded by the current system state, newest-relevant-first.
///
/// A low battery produces a warning; an islanded grid produces an info entry.
/// Both carry the current timestamp and stable ids so the view can
/// de-duplicate across refreshes.
pub fn trigger_alerts(battery_level: u8, grid: GridStatus, now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if grid.is_islanded() {
        alerts.push(Alert {
            id: GRID_ISLAND_ID.to_string(),
            severity: Severity::Info,
            message: "System running on solar + battery power (grid disconnected)".to_string(),
            timestamp: now,
        });
    }
    if battery_level < 30 {
        alerts.push(Alert {
            id: LOW_BATTERY_ID.to_string(),
            severity: Severity::Warning,
            message: "Battery level below 30%, consider reducing consumption".to_string(),
            timestamp: now,
        });
    }
    alerts
}
