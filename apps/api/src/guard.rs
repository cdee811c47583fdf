use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::errors::AppError;

/// Keys of operations currently running: one export per document, one
/// submission per user or draft.
#[derive(Clone, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

/// Held for the duration of an operation; releases its key on drop.
pub struct InFlightTicket {
    key: String,
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the same key is already in flight.
    pub fn try_acquire(&self, key: impl Into<String>) -> Option<InFlightTicket> {
        let key = key.into();
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(InFlightTicket {
            key,
            keys: Arc::clone(&self.keys),
        })
    }

    /// Like `try_acquire`, mapping a busy key to `409 Conflict`.
    pub fn acquire(&self, key: impl Into<String>) -> Result<InFlightTicket, AppError> {
        let key = key.into();
        self.try_acquire(key.clone()).ok_or_else(|| {
            warn!("Rejected concurrent operation on {key}");
            AppError::Conflict(format!("An operation on {key} is already in progress"))
        })
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_of_same_key_fails() {
        let guard = InFlight::new();
        let _ticket = guard.try_acquire("export:a").unwrap();
        assert!(guard.try_acquire("export:a").is_none());
        assert!(guard.try_acquire("export:b").is_some());
    }

    #[test]
    fn test_drop_releases_key() {
        let guard = InFlight::new();
        {
            let _ticket = guard.try_acquire("k").unwrap();
            assert!(guard.try_acquire("k").is_none());
        }
        assert!(guard.try_acquire("k").is_some());
    }

    #[test]
    fn test_acquire_maps_busy_to_conflict() {
        let guard = InFlight::new();
        let _ticket = guard.acquire("k").unwrap();
        assert!(matches!(guard.acquire("k"), Err(AppError::Conflict(_))));
    }
}
