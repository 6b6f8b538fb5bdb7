use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Holds the id of the one conversation that is currently live
///
/// Installing a new generation is serialized by a lock; staleness probes are
/// plain atomic loads and never take it.
#[derive(Debug, Default)]
pub struct SessionManager {
    current: Arc<AtomicU64>,
    last_issued: Mutex<u64>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new generation and make it current, superseding every earlier one
    pub fn begin(&self) -> Generation {
        let mut last = self
            .last_issued
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last += 1;
        self.current.store(*last, Ordering::Release);

        Generation {
            id: *last,
            current: Arc::clone(&self.current),
        }
    }

    /// Id of the live generation; 0 before the first `begin`
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}

/// One conversation's captured generation id
#[derive(Debug, Clone)]
pub struct Generation {
    id: u64,
    current: Arc<AtomicU64>,
}

impl Generation {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.id
    }

    pub fn is_stale(&self) -> bool {
        !self.is_current()
    }
}
