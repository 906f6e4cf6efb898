//! Correlation table: outstanding request id → one-shot delivery slot.
//!
//! Every operation is a take-and-remove under one lock, so a slot is claimed
//! by exactly one of [`resolve`](CorrelationTable::resolve) and
//! [`expire`](CorrelationTable::expire). The loser finds the key absent and
//! does nothing.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Pending request slots keyed by the stringified `syncId`.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    slots: Mutex<HashMap<String, oneshot::Sender<Value>>>,
}

impl CorrelationTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a slot for `id` and returns its receiving half.
    ///
    /// Register before writing the request so a fast response is never
    /// missed.
    pub fn reserve(&self, id: impl Into<String>) -> oneshot::Receiver<Value> {
        let id = id.into();
        let (tx, rx) = oneshot::channel();
        if self.slots.lock().insert(id.clone(), tx).is_some() {
            // The replaced sender is dropped, so its waiter sees a closed slot.
            warn!(sync_id = %id, "Correlation id reused while still pending");
        }
        rx
    }

    /// Delivers `value` to the slot for `id`.
    ///
    /// Returns `true` if this call claimed the slot, `false` if it was
    /// already resolved, expired or never reserved.
    pub fn resolve(&self, id: &str, value: Value) -> bool {
        let Some(tx) = self.slots.lock().remove(id) else {
            return false;
        };
        if tx.send(value).is_err() {
            debug!(sync_id = %id, "Response arrived after the caller went away");
        }
        true
    }

    /// Removes the slot for `id` without delivering anything.
    ///
    /// Returns `true` if this call claimed the slot.
    pub fn expire(&self, id: &str) -> bool {
        self.slots.lock().remove(id).is_some()
    }

    /// Removes every slot; their waiters observe a closed channel.
    ///
    /// Returns the number of slots removed.
    pub fn expire_all(&self) -> usize {
        let drained: Vec<_> = self.slots.lock().drain().collect();
        drained.len()
    }

    /// Number of outstanding slots.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}
