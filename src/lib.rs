//! Synthetic home energy-monitoring data engine.
//!
//! Produces internally consistent snapshots of a small solar-plus-battery
//! installation (production, consumption, battery, grid, health, alerts),
//! smoothed incremental updates for a polling view, and historical daily
//! series. All randomness is seeded, so output is reproducible.

pub mod config;
pub mod io;
/// Snapshot generation, smoothed updates, history, and the polling feed.
pub mod sim;
pub mod snapshot;

#[cfg(feature = "net")]
pub mod providers;
