// Time Provider Port (for testability)

use chrono::{DateTime, Utc};

/// Format of the process-wide "last synced at" marker
pub const SYNCED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Render a timestamp as a `YYYY-MM-DD HH:MM:SS` marker
pub fn format_synced_at(at: DateTime<Utc>) -> String {
    at.format(SYNCED_AT_FORMAT).to_string()
}

pub mod mocks {
    use super::*;
    use chrono::TimeZone;

    /// Always returns the same instant
    pub struct FixedTimeProvider {
        at: DateTime<Utc>,
    }

    impl FixedTimeProvider {
        pub fn new(at: DateTime<Utc>) -> Self {
            Self { at }
        }

        /// 2024-01-02 03:04:05 UTC
        pub fn sample() -> Self {
            Self::new(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().unwrap_or_default())
        }
    }

    impl TimeProvider for FixedTimeProvider {
        fn now(&self) -> DateTime<Utc> {
            self.at
        }
    }
}
