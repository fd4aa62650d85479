//! Time and randomness capabilities injected into [`crate::Fernet`].
//!
//! Production code uses [`SystemClock`] and [`OsRandom`]. Tests substitute
//! fixed implementations so that encoding is fully deterministic.

use std::time::{SystemTime, UNIX_EPOCH};

use rand_core::{OsRng, RngCore};

/// Source of the current time, in whole seconds since the Unix epoch.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Current Unix time, truncated to whole seconds.
    fn now(&self) -> u64;
}

/// Source of cryptographically secure random bytes.
///
/// Implementations must be safe to call from several threads at once.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send + Sync {
    /// Return `len` random bytes.
    fn random_bytes(&self, len: usize) -> Vec<u8>;
}

/// Reads the system wall clock. A clock set before 1970 reads as `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Draws from the operating-system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        OsRng.fill_bytes(&mut buf);
        buf
    }
}

/// A clock that always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }

    #[test]
    fn os_random_returns_requested_length() {
        assert_eq!(OsRandom.random_bytes(16).len(), 16);
        assert!(OsRandom.random_bytes(0).is_empty());
    }

    #[test]
    fn os_random_does_not_repeat() {
        assert_ne!(OsRandom.random_bytes(16), OsRandom.random_bytes(16));
    }

    #[test]
    fn fixed_clock_is_constant() {
        let clock = FixedClock(499_162_800);
        assert_eq!(clock.now(), 499_162_800);
        assert_eq!(clock.now(), clock.now());
    }
}
