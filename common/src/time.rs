use chrono::{DateTime, FixedOffset, Offset};
use chrono_tz::Tz;
use tracing::{info, warn};

pub const MIN_VALID_EPOCH: i64 = 5_000;
pub const FAILURE_RETRY_MS: u64 = 60_000;

pub trait TimeSource {
    fn fetch_epoch(&mut self) -> Option<i64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SyncPoint {
    epoch: i64,
    at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct TimeKeeper {
    timezone: Tz,
    refresh_ms: u64,
    synced: Option<SyncPoint>,
    last_failure_ms: Option<u64>,
}

impl TimeKeeper {
    pub fn new(timezone: Tz, refresh_minutes: u32) -> Self {
        Self {
            timezone,
            refresh_ms: u64::from(refresh_minutes) * 60_000,
            synced: None,
            last_failure_ms: None,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.synced.is_some()
    }

    pub fn now_epoch(&self, now_ms: u64) -> Option<i64> {
        self.synced.map(|sync| {
            let elapsed = now_ms.saturating_sub(sync.at_ms) / 1_000;
            sync.epoch + elapsed as i64
        })
    }

    /// Due when never synced or once the refresh interval has passed. A recent
    /// failure holds off the next attempt for [`FAILURE_RETRY_MS`].
    pub fn needs_refresh(&self, now_ms: u64) -> bool {
        if let Some(failed_at) = self.last_failure_ms {
            if now_ms.saturating_sub(failed_at) < FAILURE_RETRY_MS {
                return false;
            }
        }
        match self.synced {
            None => true,
            Some(sync) => now_ms.saturating_sub(sync.at_ms) >= self.refresh_ms,
        }
    }

    pub fn record(&mut self, epoch: Option<i64>, now_ms: u64) -> bool {
        match epoch.filter(|epoch| *epoch > MIN_VALID_EPOCH) {
            Some(epoch) => {
                self.record_success(epoch, now_ms);
                true
            }
            None => {
                self.record_failure(now_ms);
                false
            }
        }
    }

    pub fn record_success(&mut self, epoch: i64, now_ms: u64) {
        info!(epoch, "time updated");
        self.synced = Some(SyncPoint { epoch, at_ms: now_ms });
        self.last_failure_ms = None;
    }

    pub fn record_failure(&mut self, now_ms: u64) {
        warn!(synced = self.is_synced(), "time update failed");
        self.last_failure_ms = Some(now_ms);
    }

    pub fn local_now(&self, now_ms: u64) -> Option<DateTime<FixedOffset>> {
        let epoch = self.now_epoch(now_ms)?;
        let utc = DateTime::from_timestamp(epoch, 0)?;
        let local = utc.with_timezone(&self.timezone);
        Some(local.with_timezone(&local.offset().fix()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;
    use pretty_assertions::assert_eq;

    use super::*;

    // 2024-06-01T10:15:30Z
    const EPOCH: i64 = 1_717_236_930;

    #[test]
    fn unsynced_keeper_is_due_and_has_no_time() {
        let keeper = TimeKeeper::new(Tz::UTC, 60);
        assert!(keeper.needs_refresh(0));
        assert_eq!(keeper.now_epoch(1_000), None);
        assert_eq!(keeper.local_now(1_000), None);
    }

    #[test]
    fn advances_from_the_sync_point() {
        let mut keeper = TimeKeeper::new(Tz::UTC, 60);
        keeper.record_success(EPOCH, 10_000);

        assert_eq!(keeper.now_epoch(10_000), Some(EPOCH));
        assert_eq!(keeper.now_epoch(75_500), Some(EPOCH + 65));
    }

    #[test]
    fn refresh_is_due_after_the_interval() {
        let mut keeper = TimeKeeper::new(Tz::UTC, 60);
        keeper.record_success(EPOCH, 0);

        assert!(!keeper.needs_refresh(59 * 60_000));
        assert!(keeper.needs_refresh(60 * 60_000));
    }

    #[test]
    fn tiny_epochs_count_as_failures() {
        let mut keeper = TimeKeeper::new(Tz::UTC, 60);

        assert!(!keeper.record(Some(MIN_VALID_EPOCH), 0));
        assert!(!keeper.record(None, 0));
        assert!(!keeper.is_synced());
        assert!(keeper.record(Some(EPOCH), 0));
        assert!(keeper.is_synced());
    }

    #[test]
    fn failure_keeps_the_clock_and_throttles_retries() {
        let mut keeper = TimeKeeper::new(Tz::UTC, 60);
        keeper.record_success(EPOCH, 0);
        let due = 60 * 60_000;

        keeper.record_failure(due);

        assert_eq!(keeper.now_epoch(due), Some(EPOCH + 3_600));
        assert!(!keeper.needs_refresh(due + 1_000));
        assert!(keeper.needs_refresh(due + FAILURE_RETRY_MS));
    }

    #[test]
    fn local_time_follows_the_timezone() {
        let mut keeper = TimeKeeper::new(chrono_tz::Europe::Oslo, 60);
        keeper.record_success(EPOCH, 0);

        let local = keeper.local_now(0).unwrap();
        // Oslo is UTC+2 in June.
        assert_eq!((local.hour(), local.minute(), local.second()), (12, 15, 30));
    }
}
