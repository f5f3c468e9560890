//! Wall-clock abstraction so expiry and cache freshness can be driven by tests.

use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

/// Epoch milliseconds, the unit used for every persisted timestamp.
pub type EpochMillis = i64;

/// Source of the current time shared by the registry, cache and services.
pub trait Clock: Send + Sync {
    /// Current wall-clock time in epoch milliseconds.
    fn now_millis(&self) -> EpochMillis;
}

/// Shared handle to the process clock.
pub type SharedClock = Arc<dyn Clock>;

/// Clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> EpochMillis {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as EpochMillis)
            .unwrap_or_default()
    }
}

/// Manually advanced clock used by tests and local tooling.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: EpochMillis) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(start),
        })
    }

    /// Jump to an absolute instant.
    pub fn set(&self, now: EpochMillis) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `millis`.
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> EpochMillis {
        self.now.load(Ordering::SeqCst)
    }
}
