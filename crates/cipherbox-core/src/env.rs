//! Environment abstraction for deterministic testing.
//!
//! Decouples the worker from system resources (time, randomness). Tests run
//! the worker against a seeded RNG and a virtual clock; the host binary runs
//! it against the OS.

use std::time::Duration;

use rand_core::{CryptoRng, RngCore, impls};

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion, incorrect simulation setup)
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use a virtual clock.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// Only used to measure how long an operation took.
    fn now(&self) -> Self::Instant;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);
}

/// Adapts an [`Environment`] to the `rand_core` traits the cipher backends
/// consume.
///
/// Every byte a backend draws (keys, salts, nonces, OAEP seeds) comes from
/// `random_bytes`, so a seeded environment makes the whole worker
/// reproducible.
pub struct EnvRng<'a, E: Environment> {
    env: &'a E,
}

impl<'a, E: Environment> EnvRng<'a, E> {
    /// Borrow `env` as an RNG.
    pub fn new(env: &'a E) -> Self {
        Self { env }
    }
}

impl<E: Environment> RngCore for EnvRng<'_, E> {
    fn next_u32(&mut self) -> u32 {
        impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.env.random_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.env.random_bytes(dest);
        Ok(())
    }
}

// The Environment contract requires a cryptographically secure source
impl<E: Environment> CryptoRng for EnvRng<'_, E> {}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicU8, Ordering},
        },
        time::Instant,
    };

    use super::*;

    #[derive(Clone, Default)]
    struct CountingEnv {
        next: Arc<AtomicU8>,
    }

    impl Environment for CountingEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            Instant::now()
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            for byte in buffer {
                *byte = self.next.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn rng_draws_from_environment() {
        let env = CountingEnv::default();
        let mut rng = EnvRng::new(&env);

        let mut buffer = [0u8; 4];
        rng.fill_bytes(&mut buffer);
        assert_eq!(buffer, [0, 1, 2, 3]);

        assert_eq!(rng.next_u32(), u32::from_le_bytes([4, 5, 6, 7]));
    }
}
