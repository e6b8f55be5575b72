//! Simulation engine: snapshot generation, incremental refresh, historical
//! series, and the polling feed.

pub mod alerts;
pub mod feed;
pub mod generator;
pub mod history;
pub mod profile;

mod updater;

pub use feed::LiveFeed;
pub use generator::SnapshotGenerator;
pub use history::{DailyRecord, daily_series};
