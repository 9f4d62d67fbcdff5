//! Session timing and the end-of-session summary.

use deepwork_core::config::NotificationConfig;
use deepwork_core::Timestamp;
use std::sync::Mutex;

use crate::platform::Notification;

const MS_PER_MINUTE: i64 = 60_000;

/// Source of wall-clock time in milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Whole minutes between two timestamps, rounded half up, never negative
pub fn elapsed_minutes(start: Timestamp, end: Timestamp) -> u64 {
    let elapsed = end.saturating_sub(start).max(0);
    (elapsed.saturating_add(MS_PER_MINUTE / 2) / MS_PER_MINUTE) as u64
}

/// Builds one summary notification per finished session
#[derive(Debug)]
pub struct SessionReporter {
    config: NotificationConfig,
    /// Latest millisecond issued bare, and the last suffix handed out
    issued: Mutex<(Timestamp, u32)>,
}

impl SessionReporter {
    pub fn new(config: NotificationConfig) -> Self {
        Self {
            config,
            issued: Mutex::new((Timestamp::MIN, 0)),
        }
    }

    /// Notification id derived from `now`, unique within this process
    ///
    /// Bare ids are only issued for strictly increasing milliseconds. A
    /// repeated or earlier millisecond gets a suffix from a counter that
    /// never resets.
    fn next_id(&self, now: Timestamp) -> String {
        let mut issued = match self.issued.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if now > issued.0 {
            issued.0 = now;
            format!("deepwork-summary-{}", now)
        } else {
            issued.1 += 1;
            format!("deepwork-summary-{}-{}", now, issued.1)
        }
    }

    pub fn summary(&self, minutes: u64, now: Timestamp) -> Notification {
        Notification {
            id: self.next_id(now),
            title: self.config.title.clone(),
            message: format!("You focused for {} minutes", minutes),
            icon_url: self.config.icon_url.clone(),
            priority: self.config.priority,
        }
    }
}
