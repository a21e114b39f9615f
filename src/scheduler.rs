//! The dual-pool switching scheduler (component F): a single piece of
//! process-wide shared state, mutated by whichever relay task currently
//! holds the dial guard and read by every per-connection driver deciding
//! where to dial. Races on the cached fields are accepted as benign — they
//! are caches used for deception, not correctness — but this
//! implementation chooses to guard everything with one mutex rather than
//! leaving bare globals racing, since the cost of a short lock here is
//! negligible next to a TCP relay.

use std::sync::Mutex;

/// Server→client `NOTIFY` frames needed in `Real` phase before flipping to
/// `Venus`.
const REAL_FLIP_THRESHOLD: u32 = 5;
/// Server→client `NOTIFY` frames needed in `Venus` phase before flipping
/// back to `Real`.
const VENUS_FLIP_THRESHOLD: u32 = 3;

const MAX_SUBSCRIBE_CACHE: usize = 512;
const MAX_NOTIFY_CACHE: usize = 1024;
const MAX_DIFFICULTY_CACHE: usize = 256;

/// Which upstream pool new connections are currently steered toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Real,
    Venus,
}

/// Read-only view of the scheduler state, cheap to clone for logging or
/// test assertions.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub phase: Phase,
    pub real_notify_count: u32,
    pub venus_notify_count: u32,
}

#[derive(Default)]
struct Inner {
    phase_is_venus: bool,
    real_notify_count: u32,
    venus_notify_count: u32,
    cached_real_subscribe_reply: String,
    cached_venus_subscribe_reply: String,
    cached_real_notify: String,
    cached_venus_notify: String,
    cached_real_difficulty: String,
    cached_venus_difficulty: String,
}

impl Inner {
    fn phase(&self) -> Phase {
        if self.phase_is_venus {
            Phase::Venus
        } else {
            Phase::Real
        }
    }
}

/// Shared scheduler state plus the single-slot dial guard (REDESIGN FLAGS:
/// modeled as a separate mutex from `phase`, rather than overloading the
/// phase word with sentinel values the way the source does).
pub struct Scheduler {
    inner: Mutex<Inner>,
    dial_guard: tokio::sync::Mutex<()>,
    pub venus_worker_name: String,
    pub venus_pool_host: String,
    pub venus_pool_port: u16,
}

impl Scheduler {
    pub fn new(venus_worker_name: String, venus_pool_host: String, venus_pool_port: u16) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            dial_guard: tokio::sync::Mutex::new(()),
            venus_worker_name,
            venus_pool_host,
            venus_pool_port,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.lock();
        Snapshot {
            phase: inner.phase(),
            real_notify_count: inner.real_notify_count,
            venus_notify_count: inner.venus_notify_count,
        }
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase()
    }

    /// Acquires the single-slot dial guard. At most one connection may hold
    /// it at a time; callers await it rather than busy-polling, which is
    /// the async equivalent of the source's sleep-and-retry loop.
    pub async fn acquire_dial_guard(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.dial_guard.lock().await
    }

    /// Records one server→client `NOTIFY` for `phase` and flips to the
    /// other phase once the threshold is exceeded, resetting the opposite
    /// counter. Returns `true` exactly when a flip just happened.
    pub fn record_notify_and_maybe_flip(&self, phase: Phase) -> bool {
        let mut inner = self.lock();
        match phase {
            Phase::Real => {
                inner.real_notify_count += 1;
                if inner.real_notify_count > REAL_FLIP_THRESHOLD {
                    inner.venus_notify_count = 0;
                    inner.phase_is_venus = true;
                    return true;
                }
            }
            Phase::Venus => {
                inner.venus_notify_count += 1;
                if inner.venus_notify_count > VENUS_FLIP_THRESHOLD {
                    inner.real_notify_count = 0;
                    inner.phase_is_venus = false;
                    return true;
                }
            }
        }
        false
    }

    pub fn cache_subscribe_reply(&self, phase: Phase, payload: &str) {
        let mut inner = self.lock();
        let truncated = truncate(payload, MAX_SUBSCRIBE_CACHE);
        match phase {
            Phase::Real => inner.cached_real_subscribe_reply = truncated,
            Phase::Venus => inner.cached_venus_subscribe_reply = truncated,
        }
    }

    pub fn subscribe_reply(&self, phase: Phase) -> Option<String> {
        let inner = self.lock();
        let cached = match phase {
            Phase::Real => &inner.cached_real_subscribe_reply,
            Phase::Venus => &inner.cached_venus_subscribe_reply,
        };
        non_empty(cached)
    }

    pub fn cache_notify(&self, phase: Phase, payload: &str) {
        let mut inner = self.lock();
        let truncated = truncate(payload, MAX_NOTIFY_CACHE);
        match phase {
            Phase::Real => inner.cached_real_notify = truncated,
            Phase::Venus => inner.cached_venus_notify = truncated,
        }
    }

    pub fn notify(&self, phase: Phase) -> Option<String> {
        let inner = self.lock();
        let cached = match phase {
            Phase::Real => &inner.cached_real_notify,
            Phase::Venus => &inner.cached_venus_notify,
        };
        non_empty(cached)
    }

    pub fn cache_difficulty(&self, phase: Phase, params: &str) {
        let mut inner = self.lock();
        let truncated = truncate(params, MAX_DIFFICULTY_CACHE);
        match phase {
            Phase::Real => inner.cached_real_difficulty = truncated,
            Phase::Venus => inner.cached_venus_difficulty = truncated,
        }
    }

    pub fn difficulty(&self, phase: Phase) -> Option<String> {
        let inner = self.lock();
        let cached = match phase {
            Phase::Real => &inner.cached_real_difficulty,
            Phase::Venus => &inner.cached_venus_difficulty,
        };
        non_empty(cached)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("scheduler mutex poisoned")
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s[..max].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> Scheduler {
        Scheduler::new(
            "venus.worker".to_string(),
            "cn.stratum.slushpool.com".to_string(),
            443,
        )
    }

    #[test]
    fn starts_in_real_phase() {
        let s = scheduler();
        assert_eq!(s.phase(), Phase::Real);
    }

    #[test]
    fn six_real_notifies_flip_to_venus_and_reset_real_count() {
        let s = scheduler();
        for i in 0..6 {
            let flipped = s.record_notify_and_maybe_flip(Phase::Real);
            assert_eq!(flipped, i == 5, "flip should happen exactly on the 6th notify");
        }
        assert_eq!(s.phase(), Phase::Venus);
        assert_eq!(s.snapshot().real_notify_count, 0);
    }

    #[test]
    fn four_venus_notifies_flip_back_to_real() {
        let s = scheduler();
        for _ in 0..6 {
            s.record_notify_and_maybe_flip(Phase::Real);
        }
        assert_eq!(s.phase(), Phase::Venus);

        for i in 0..4 {
            let flipped = s.record_notify_and_maybe_flip(Phase::Venus);
            assert_eq!(flipped, i == 3);
        }
        assert_eq!(s.phase(), Phase::Real);
        assert_eq!(s.snapshot().venus_notify_count, 0);
    }

    #[test]
    fn cached_replays_are_none_until_populated() {
        let s = scheduler();
        assert!(s.subscribe_reply(Phase::Real).is_none());
        assert!(s.notify(Phase::Real).is_none());
        assert!(s.difficulty(Phase::Real).is_none());
    }

    #[test]
    fn cached_replays_round_trip() {
        let s = scheduler();
        s.cache_subscribe_reply(Phase::Real, "hello");
        s.cache_notify(Phase::Venus, "world");
        s.cache_difficulty(Phase::Real, "16384");
        assert_eq!(s.subscribe_reply(Phase::Real), Some("hello".to_string()));
        assert_eq!(s.notify(Phase::Venus), Some("world".to_string()));
        assert_eq!(s.difficulty(Phase::Real), Some("16384".to_string()));
        assert!(s.subscribe_reply(Phase::Venus).is_none());
    }

    #[test]
    fn cache_truncates_oversized_payloads() {
        let s = scheduler();
        let huge = "x".repeat(MAX_NOTIFY_CACHE + 100);
        s.cache_notify(Phase::Real, &huge);
        assert_eq!(s.notify(Phase::Real).unwrap().len(), MAX_NOTIFY_CACHE);
    }

    #[tokio::test]
    async fn dial_guard_is_single_slot() {
        let s = scheduler();
        let guard = s.acquire_dial_guard().await;
        assert!(s.dial_guard.try_lock().is_err());
        drop(guard);
        assert!(s.dial_guard.try_lock().is_ok());
    }
}
