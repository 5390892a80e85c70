//! Newest-request-wins slots.
//!
//! Browsing views fire a new request whenever the user changes a filter; the
//! previous request for the same slot is no longer wanted. [`AbortRegistry`]
//! hands out one cancellation token per slot and cancels the previous holder
//! when a new one begins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct Slot {
    id: u64,
    request: String,
    token: CancellationToken,
    holders: usize,
}

#[derive(Debug, Default)]
pub struct AbortRegistry {
    slots: Mutex<HashMap<String, Slot>>,
    next_id: AtomicU64,
}

impl AbortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `slot` for `request`, cancelling whoever held it before.
    ///
    /// A caller asking for the request the slot is already running joins the
    /// current holder instead of superseding it.
    pub fn begin(&self, slot: &str, request: &str) -> SlotGuard<'_> {
        let mut slots = self.slots.lock();
        if let Some(current) = slots.get_mut(slot) {
            if current.request == request && !current.token.is_cancelled() {
                current.holders += 1;
                return SlotGuard {
                    registry: self,
                    slot: slot.to_string(),
                    id: current.id,
                    token: current.token.clone(),
                };
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = slots.insert(
            slot.to_string(),
            Slot {
                id,
                request: request.to_string(),
                token: token.clone(),
                holders: 1,
            },
        );
        if let Some(previous) = previous {
            debug!(slot, "Superseding previous request");
            previous.token.cancel();
        }
        SlotGuard {
            registry: self,
            slot: slot.to_string(),
            id,
            token,
        }
    }

    /// Cancel the current holder of `slot`, if any.
    pub fn abort(&self, slot: &str) -> bool {
        match self.slots.lock().remove(slot) {
            Some(current) => {
                current.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every slot.
    pub fn abort_all(&self) {
        for (_, current) in self.slots.lock().drain() {
            current.token.cancel();
        }
    }

    pub fn active(&self) -> usize {
        self.slots.lock().len()
    }
}

/// Holder of a slot; releases it on drop unless someone newer took over.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    registry: &'a AbortRegistry,
    slot: String,
    id: u64,
    token: CancellationToken,
}

impl SlotGuard<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Completes when a newer request takes the slot or it is aborted.
    pub async fn superseded(&self) {
        self.token.cancelled().await
    }

    pub fn is_superseded(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut slots = self.registry.slots.lock();
        let release = match slots.get_mut(&self.slot) {
            Some(current) if current.id == self.id => {
                current.holders -= 1;
                current.holders == 0
            }
            _ => false,
        };
        if release {
            slots.remove(&self.slot);
        }
    }
}
