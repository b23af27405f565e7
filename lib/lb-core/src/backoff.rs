//! Per-object exponential requeue delays

use lb_api::ObjectKey;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Failures {
    count: u32,
    last: Instant,
}

/// Tracks consecutive failures per object and turns them into requeue delays
///
/// An object deleted while failing is never reconciled again, so nothing
/// resets its entry. Entries whose last failure is older than twice the
/// maximum delay are dropped on the next recorded failure.
pub struct RetryBackoff {
    base: Duration,
    max: Duration,
    failures: Mutex<HashMap<ObjectKey, Failures>>,
}

impl RetryBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failure for `key` and return how long to wait before retrying
    pub fn next_delay(&self, key: &ObjectKey) -> Duration {
        let now = Instant::now();
        let stale_after = self.max.saturating_mul(2);
        let attempts = match self.failures.lock() {
            Ok(mut failures) => {
                failures.retain(|_, entry| now.duration_since(entry.last) <= stale_after);
                let entry = failures.entry(key.clone()).or_insert(Failures {
                    count: 0,
                    last: now,
                });
                entry.count = entry.count.saturating_add(1);
                entry.last = now;
                entry.count
            }
            Err(_) => return self.max,
        };

        let exponent = attempts.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max, |delay| delay.min(self.max))
    }

    /// Forget failures for `key` after a successful reconciliation
    pub fn reset(&self, key: &ObjectKey) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(key);
        }
    }

    pub fn failure_count(&self, key: &ObjectKey) -> u32 {
        self.failures
            .lock()
            .ok()
            .and_then(|failures| failures.get(key).map(|entry| entry.count))
            .unwrap_or(0)
    }

    /// Number of objects with outstanding failures
    pub fn tracked(&self) -> usize {
        self.failures.lock().map(|failures| failures.len()).unwrap_or(0)
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_and_caps() {
        let backoff = RetryBackoff::default();
        let key = ObjectKey::namespaced("default", "web");

        let delays: Vec<u64> = (0..8).map(|_| backoff.next_delay(&key).as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 80, 160, 300, 300]);
        assert_eq!(backoff.failure_count(&key), 8);
    }

    #[test]
    fn test_reset_starts_over() {
        let backoff = RetryBackoff::default();
        let key = ObjectKey::namespaced("default", "web");

        backoff.next_delay(&key);
        backoff.next_delay(&key);
        backoff.reset(&key);
        assert_eq!(backoff.failure_count(&key), 0);
        assert_eq!(backoff.next_delay(&key), Duration::from_secs(5));
    }

    #[test]
    fn test_keys_are_independent() {
        let backoff = RetryBackoff::default();
        let a = ObjectKey::namespaced("default", "a");
        let b = ObjectKey::namespaced("default", "b");

        backoff.next_delay(&a);
        backoff.next_delay(&a);
        assert_eq!(backoff.next_delay(&b), Duration::from_secs(5));
    }

    #[test]
    fn test_many_failures_do_not_overflow() {
        let backoff = RetryBackoff::new(Duration::from_secs(5), Duration::from_secs(300));
        let key = ObjectKey::cluster_scoped("node-1");
        for _ in 0..100 {
            assert!(backoff.next_delay(&key) <= Duration::from_secs(300));
        }
    }

    #[test]
    fn test_abandoned_entries_are_dropped() {
        let backoff = RetryBackoff::new(Duration::from_millis(1), Duration::from_millis(5));
        let deleted = ObjectKey::namespaced("default", "deleted");
        let failing = ObjectKey::namespaced("default", "failing");

        backoff.next_delay(&deleted);
        backoff.next_delay(&deleted);
        std::thread::sleep(Duration::from_millis(30));

        backoff.next_delay(&failing);
        assert_eq!(backoff.failure_count(&deleted), 0);
        assert_eq!(backoff.failure_count(&failing), 1);
        assert_eq!(backoff.tracked(), 1);
    }
}
