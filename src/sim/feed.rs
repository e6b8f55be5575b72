//! Polling feed over the generator.
//!
//! Holds the latest snapshot and advances it on a caller-driven cadence.
//! Most ticks apply the smoothed refresh; occasionally the feed resyncs to a
//! fully regenerated snapshot, which models a sensor gateway coming back
//! after a dropout.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::SiteConfig;
use crate::snapshot::EnergySnapshot;

use super::generator::SnapshotGenerator;

/// Offset applied to the master seed for the resync decision stream, so
/// resync timing does not correlate with snapshot contents.
const RESYNC_SEED_OFFSET: u64 = 91;

/// Stateful live feed producing one snapshot per tick.
pub struct LiveFeed {
    generator: SnapshotGenerator,
    resync_rng: StdRng,
    resync_probability: f64,
    current: EnergySnapshot,
}

impl LiveFeed {
    /// Starts a feed seeded from the configuration.
    pub fn new(cfg: &SiteConfig) -> Self {
        Self::with_seed(cfg, cfg.simulation.seed)
    }

    /// Starts a feed with an explicit seed, initialized at the current time.
    pub fn with_seed(cfg: &SiteConfig, seed: u64) -> Self {
        Self::started_at(cfg, seed, Utc::now())
    }

    /// Starts a feed with an explicit seed and start time.
    pub fn started_at(cfg: &SiteConfig, seed: u64, now: DateTime<Utc>) -> Self {
        let mut generator = SnapshotGenerator::with_seed(cfg, seed);
        let current = generator.generate_at(now);
        Self {
            generator,
            resync_rng: StdRng::seed_from_u64(seed.wrapping_add(RESYNC_SEED_OFFSET)),
            resync_probability: cfg.simulation.resync_probability,
            current,
        }
    }

    /// Advances the feed one step at the current time.
    pub fn tick(&mut self) -> &EnergySnapshot {
        self.tick_at(Utc::now())
    }

    /// Advances the feed one step at the given time and returns the new
    /// snapshot.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> &EnergySnapshot {
        if self.resync_rng.random_bool(self.resync_probability) {
            debug!(at = %now, "feed resync");
            self.current = self.generator.generate_at(now);
        } else {
            self.current = self.generator.refresh(&self.current, now);
        }
        &self.current
    }

    /// The most recent snapshot.
    pub fn current(&self) -> &EnergySnapshot {
        &self.current
    }
}
