//! Wall-clock abstraction used to stamp framed change records.
//!
//! Freshness scheduling uses [`tokio::time::Instant`] instead, so tests can
//! pause and advance it; this clock only supplies the `time` field.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock time.
///
/// # Example
///
/// ```
/// use netif_watch::time::{Clock, SystemClock, unix_millis};
///
/// let millis = unix_millis(SystemClock.now());
/// assert!(millis > 0);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;
}

/// Clock backed by [`SystemTime::now()`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Milliseconds since the Unix epoch, saturating at zero for earlier times.
#[must_use]
pub fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn system_clock_returns_current_time() {
        let before = SystemTime::now();
        let result = SystemClock.now();
        let after = SystemTime::now();

        assert!(result >= before);
        assert!(result <= after);
    }

    #[test]
    fn system_clock_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SystemClock>();
    }

    #[test]
    fn unix_millis_truncates_sub_millisecond_part() {
        let time = UNIX_EPOCH + Duration::from_micros(1_234_567);
        assert_eq!(unix_millis(time), 1_234);
    }

    #[test]
    fn unix_millis_saturates_before_epoch() {
        let time = UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(unix_millis(time), 0);
    }
}
