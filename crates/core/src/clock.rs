use chrono::{DateTime, Utc};

/// Source of the current instant.
///
/// Cache freshness and portfolio timestamps go through this trait so that
/// callers (and tests) can control time explicitly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
