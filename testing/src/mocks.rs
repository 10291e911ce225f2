//! Deterministic time.

use chrono::{DateTime, Duration, Utc};
use registrar_core::environment::Clock;
use std::sync::{Arc, PoisonError, RwLock};

/// Fixed clock for deterministic tests
///
/// Returns the same time until [`FixedClock::advance`] or [`FixedClock::set`] moves it.
/// Clones share the same time.
///
/// # Example
///
/// ```
/// use registrar_testing::mocks::FixedClock;
/// use registrar_core::environment::Clock;
/// use chrono::{Duration, Utc};
///
/// let clock = FixedClock::new(Utc::now());
/// let time1 = clock.now();
/// assert_eq!(time1, clock.now());
///
/// clock.advance(Duration::minutes(10));
/// assert_eq!(clock.now() - time1, Duration::minutes(10));
/// ```
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a new fixed clock with the given time
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self { time: Arc::new(RwLock::new(time)) }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut time = self.time.write().unwrap_or_else(PoisonError::into_inner);
        *time += by;
    }

    /// Jump to an instant
    pub fn set(&self, to: DateTime<Utc>) {
        *self.time.write().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.time.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
///
/// # Panics
///
/// This function will panic if the hardcoded timestamp fails to parse,
/// which should never happen in practice.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_clock() -> FixedClock {
    FixedClock::new(
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc),
    )
}
