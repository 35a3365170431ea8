//! Replay and freshness protection.
//!
//! One operation, atomic by construction: `check_and_commit` takes the cache
//! lock once and does freshness check, duplicate lookup, and insert under
//! it.  Two concurrent decrypts of the same envelope cannot both observe
//! "not seen yet" — exactly one wins the insert.
//!
//! Freshness is checked first and independently of the cache: a message
//! whose sender timestamp is more than 48 hours from local time (either
//! direction, so benign clock skew of seconds is comfortably inside) is
//! rejected before its id is ever considered.  Accepted ids are retained for
//! 30 days, capped at 10,000 entries with oldest-first eviction; the
//! retention purge runs opportunistically on insert.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::warn;

use crate::error::WhisperError;

#[derive(Debug, Clone, Copy)]
pub struct ReplayConfig {
    /// Maximum |now − sender timestamp| before `MessageExpired`.
    pub freshness_window: Duration,
    /// Maximum cached ids before oldest-first eviction.
    pub capacity: usize,
    /// How long an accepted id is remembered.
    pub retention: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::hours(48),
            capacity: 10_000,
            retention: Duration::days(30),
        }
    }
}

#[derive(Default)]
struct CacheInner {
    /// msgid → when we first accepted it.
    seen: HashMap<[u8; 16], DateTime<Utc>>,
    /// Insertion order, oldest at the front.
    order: VecDeque<[u8; 16]>,
}

pub struct ReplayProtector {
    config: ReplayConfig,
    inner: Mutex<CacheInner>,
}

impl Default for ReplayProtector {
    fn default() -> Self {
        Self::new(ReplayConfig::default())
    }
}

impl ReplayProtector {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config, inner: Mutex::new(CacheInner::default()) }
    }

    /// Atomic freshness + duplicate check + commit for one message id.
    pub fn check_and_commit(&self, msgid: [u8; 16], timestamp: i64) -> Result<(), WhisperError> {
        self.check_and_commit_at(msgid, timestamp, Utc::now())
    }

    /// Same as [`check_and_commit`](Self::check_and_commit) with the clock
    /// injected, for deterministic tests.
    pub fn check_and_commit_at(
        &self,
        msgid: [u8; 16],
        timestamp: i64,
        now: DateTime<Utc>,
    ) -> Result<(), WhisperError> {
        // abs_diff: the sender timestamp comes off the wire unauthenticated,
        // so the distance must be computed without overflow even for i64::MIN.
        let age = now.timestamp().abs_diff(timestamp);
        if age > self.config.freshness_window.num_seconds().unsigned_abs() {
            return Err(WhisperError::MessageExpired);
        }

        let mut cache = self.inner.lock();

        // Retention purge piggybacks on the insert path.
        while let Some(oldest) = cache.order.front() {
            let expired = cache
                .seen
                .get(oldest)
                .is_some_and(|first_seen| now - *first_seen > self.config.retention);
            if !expired {
                break;
            }
            let oldest = *oldest;
            cache.order.pop_front();
            cache.seen.remove(&oldest);
        }

        if cache.seen.contains_key(&msgid) {
            warn!(msgid = %hex::encode(msgid), "replayed message rejected");
            return Err(WhisperError::ReplayDetected);
        }

        cache.seen.insert(msgid, now);
        cache.order.push_back(msgid);

        while cache.seen.len() > self.config.capacity {
            if let Some(evicted) = cache.order.pop_front() {
                cache.seen.remove(&evicted);
            }
        }

        Ok(())
    }

    /// Number of ids currently cached.
    pub fn len(&self) -> usize {
        self.inner.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> [u8; 16] {
        [n; 16]
    }

    #[test]
    fn first_seen_passes_second_is_replay() {
        let replay = ReplayProtector::default();
        let now = Utc::now();
        let ts = now.timestamp();
        replay.check_and_commit_at(id(1), ts, now).unwrap();
        assert_eq!(
            replay.check_and_commit_at(id(1), ts, now),
            Err(WhisperError::ReplayDetected)
        );
        // A different id is unaffected.
        replay.check_and_commit_at(id(2), ts, now).unwrap();
    }

    #[test]
    fn freshness_window_boundaries() {
        let replay = ReplayProtector::default();
        let now = Utc::now();

        let hours = |h: i64| now.timestamp() - h * 3600;
        replay.check_and_commit_at(id(1), hours(47), now).unwrap();
        replay.check_and_commit_at(id(2), hours(-47), now).unwrap();
        assert_eq!(
            replay.check_and_commit_at(id(3), hours(49), now),
            Err(WhisperError::MessageExpired)
        );
        assert_eq!(
            replay.check_and_commit_at(id(4), hours(-49), now),
            Err(WhisperError::MessageExpired)
        );
    }

    #[test]
    fn extreme_timestamps_are_expired() {
        // Wire timestamps are attacker-controlled; the distance computation
        // must not overflow at the i64 extremes.
        let replay = ReplayProtector::default();
        let now = Utc::now();
        for ts in [i64::MIN, i64::MIN + 1, i64::MAX - 1, i64::MAX] {
            assert_eq!(
                replay.check_and_commit_at(id(1), ts, now),
                Err(WhisperError::MessageExpired),
                "timestamp {ts}"
            );
        }
        assert!(replay.is_empty());
    }

    #[test]
    fn small_clock_skew_is_tolerated() {
        let replay = ReplayProtector::default();
        let now = Utc::now();
        replay.check_and_commit_at(id(1), now.timestamp() + 3, now).unwrap();
        replay.check_and_commit_at(id(2), now.timestamp() - 5, now).unwrap();
    }

    #[test]
    fn expired_messages_never_enter_the_cache() {
        let replay = ReplayProtector::default();
        let now = Utc::now();
        let stale = now.timestamp() - 50 * 3600;
        let _ = replay.check_and_commit_at(id(1), stale, now);
        assert!(replay.is_empty());
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let replay = ReplayProtector::new(ReplayConfig {
            capacity: 3,
            ..ReplayConfig::default()
        });
        let now = Utc::now();
        let ts = now.timestamp();

        for n in 1..=4 {
            replay.check_and_commit_at(id(n), ts, now).unwrap();
        }
        assert_eq!(replay.len(), 3);

        // id(1) was evicted, so it is accepted again; id(4) still replays.
        replay.check_and_commit_at(id(1), ts, now).unwrap();
        assert_eq!(
            replay.check_and_commit_at(id(4), ts, now),
            Err(WhisperError::ReplayDetected)
        );
    }

    #[test]
    fn retention_purges_old_entries() {
        let replay = ReplayProtector::new(ReplayConfig {
            retention: Duration::days(30),
            ..ReplayConfig::default()
        });
        let long_ago = Utc::now() - Duration::days(31);
        replay
            .check_and_commit_at(id(1), long_ago.timestamp(), long_ago)
            .unwrap();
        assert_eq!(replay.len(), 1);

        // 31 days later the entry is past retention and gets purged; the
        // same id is then accepted as new.
        let now = Utc::now();
        replay.check_and_commit_at(id(1), now.timestamp(), now).unwrap();
        assert_eq!(replay.len(), 1);
    }

    #[test]
    fn concurrent_commits_allow_exactly_one_success() {
        use std::sync::Arc;

        let replay = Arc::new(ReplayProtector::default());
        let now = Utc::now();
        let ts = now.timestamp();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let replay = Arc::clone(&replay);
                std::thread::spawn(move || replay.check_and_commit_at(id(7), ts, now).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }
}
