//! Time source abstraction.

use chrono::{DateTime, Utc};

/// Clock trait for time abstraction.
///
/// Price windows, registration cutoffs and scheduled dispositions all depend on "now";
/// injecting the clock lets tests pin it.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
