//! Seed resolution and per-iteration seed derivation.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Where a run gets its seed when none is fixed in the options
pub trait SeedSource {
    /// Produce a seed for a new run
    fn seed(&self) -> u64;
}

/// Seeds from the wall clock: nanoseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockSeed;

impl SeedSource for ClockSeed {
    fn seed(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default()
    }
}

/// Always the same seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSeed(pub u64);

impl SeedSource for FixedSeed {
    fn seed(&self) -> u64 {
        self.0
    }
}

impl<S: SeedSource + ?Sized> SeedSource for Box<S> {
    fn seed(&self) -> u64 {
        (**self).seed()
    }
}

/// Derives one ledger seed per iteration from a run's seed.
///
/// Two runs started from the same seed see the same ledger seeds in the same order.
#[derive(Debug)]
pub struct IterationSeeds {
    rng: StdRng,
}

impl IterationSeeds {
    /// Start the sequence for a run
    pub fn new(run_seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(run_seed),
        }
    }

    /// Seed for the next iteration's ledger
    pub fn next_seed(&mut self) -> u64 {
        self.rng.next_u64()
    }
}
