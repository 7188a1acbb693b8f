//! In-flight request registry.
//!
//! A process-wide set of claimed keys. Two resolver instances fed the same
//! `(points, mode)` input during one render pass would otherwise both hit the
//! network; whichever claims the key first does the fetch, the other renders
//! a fallback and waits for the winner's cache write.

use std::collections::HashSet;
use std::sync::Mutex;

use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::debug;

use crate::geokey::GeoKey;

pub struct DedupRegistry {
    claimed: Mutex<HashSet<GeoKey>>,
    released: Notify,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self {
            claimed: Mutex::new(HashSet::new()),
            released: Notify::new(),
        }
    }

    /// Claim `key` if nobody holds it. Check-and-insert under one lock, so
    /// concurrent callers cannot both succeed.
    ///
    /// A `false` return means another resolver is already fetching this key;
    /// the caller must not issue its own request for it.
    pub fn try_claim(&self, key: &GeoKey) -> bool {
        let fresh = self.claimed.lock().unwrap().insert(key.clone());
        if !fresh {
            debug!(key = key.as_str(), "route already being resolved elsewhere");
        }
        fresh
    }

    /// Release a claim, whether the fetch behind it succeeded or failed.
    /// Wakes every waiter parked on [`DedupRegistry::released`].
    pub fn release(&self, key: &GeoKey) {
        self.claimed.lock().unwrap().remove(key);
        self.released.notify_waiters();
    }

    pub fn is_claimed(&self, key: &GeoKey) -> bool {
        self.claimed.lock().unwrap().contains(key)
    }

    /// Drop every claim. Test and session reset.
    pub fn clear(&self) {
        self.claimed.lock().unwrap().clear();
        self.released.notify_waiters();
    }

    /// Future that resolves on the next release (or clear). Callers should
    /// `enable` it before re-checking state so no wakeup is lost in between.
    pub fn released(&self) -> Notified<'_> {
        self.released.notified()
    }
}

impl Default for DedupRegistry {
    fn default() -> Self {
        Self::new()
    }
}
