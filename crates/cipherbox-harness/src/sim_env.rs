//! Simulated environment.
//!
//! Seeded `ChaCha20` randomness and a virtual clock. Clones share both, so a
//! worker and the test driving it see the same byte stream and the same time.

use std::{
    ops::Sub,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use cipherbox_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Point on the virtual clock: time since the environment was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Time since the start of the simulation.
    pub fn elapsed_since_start(self) -> Duration {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, earlier: Self) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

/// Deterministic environment for tests.
///
/// Given the same seed, every key, salt and nonce the worker draws is the
/// same from run to run.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha20Rng>>,
    clock: Arc<Mutex<Duration>>,
}

impl SimEnv {
    /// Create an environment from a seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
            clock: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, by: Duration) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        *clock = clock.saturating_add(by);
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(*self.clock.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
