//! Injected time source
//!
//! The universe cache expires on wall-clock time; taking the clock as a
//! trait object lets tests drive expiry deterministically.

use chrono::{DateTime, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    /// The current instant
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
