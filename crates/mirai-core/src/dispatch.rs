//! Inbound frame classification and event dispatch.
//!
//! Every text frame the read loop receives goes through
//! [`Dispatcher::on_frame`]:
//!
//! 1. Parse the frame as JSON. Unparsable frames are logged and dropped.
//! 2. A frame whose `syncId` is non-empty and does not start with `-` is a
//!    response. Its `data` object resolves the matching correlation slot.
//! 3. Anything else is a push. Its `data.type` selects the listener list; a
//!    tag without listeners is dropped before any decoding happens.
//! 4. The payload is decoded through the decoder registry. Unknown tags and
//!    malformed payloads are logged and dropped.
//! 5. A delivery job is handed to the session's executor. The read loop
//!    never runs listener code itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::correlation::CorrelationTable;
use crate::executor::EventExecutor;
use crate::listener::{ListenerRegistry, deliver};
use crate::registry::DecoderRegistry;
use crate::transport::FrameHandler;

/// How an inbound frame was classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Reply to an outstanding request.
    Response {
        /// Normalized correlation id.
        sync_id: String,
        /// The `data` object.
        data: Value,
    },
    /// Unsolicited event or message.
    Push {
        /// The `data` object.
        data: Value,
    },
}

impl Frame {
    /// Classifies a raw frame.
    ///
    /// Returns `None` for frames that are not JSON or carry no `data` object.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let mut frame: Value = match serde_json::from_slice(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, len = raw.len(), "Dropping unparsable frame");
                return None;
            }
        };

        let data = frame.get_mut("data").map(Value::take).unwrap_or_default();
        if !data.is_object() {
            warn!("Dropping frame without a data object");
            return None;
        }

        let sync_id = match frame.get("syncId") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        if is_push_id(&sync_id) {
            Some(Self::Push { data })
        } else {
            Some(Self::Response { sync_id, data })
        }
    }
}

/// Push frames carry an empty id or the server's negative sentinel.
fn is_push_id(sync_id: &str) -> bool {
    sync_id.is_empty() || sync_id.starts_with('-')
}

/// Routes inbound frames of one session.
pub struct Dispatcher {
    pub(crate) pending: Arc<CorrelationTable>,
    pub(crate) listeners: Arc<ListenerRegistry>,
    pub(crate) decoders: Arc<DecoderRegistry>,
    pub(crate) executor: Arc<dyn EventExecutor>,
    pub(crate) connected: Arc<AtomicBool>,
}

impl Dispatcher {
    /// Handles one classified push payload.
    fn dispatch_push(&self, data: Value) {
        let Some(tag) = data.get("type").and_then(Value::as_str) else {
            warn!("Dropping push without a type tag");
            return;
        };

        let Some(listeners) = self.listeners.snapshot(tag) else {
            trace!(tag, "No listeners, skipping decode");
            return;
        };

        let event = match self.decoders.decode(tag, &data) {
            Ok(event) => event,
            Err(e) => {
                warn!(tag, error = %e, "Dropping undecodable push");
                return;
            }
        };

        trace!(tag, listeners = listeners.len(), "Dispatching event");
        self.executor.execute(deliver(listeners, event).boxed());
    }
}

#[async_trait]
impl FrameHandler for Dispatcher {
    async fn on_frame(&self, data: &[u8]) {
        match Frame::parse(data) {
            Some(Frame::Response { sync_id, data }) => {
                if !self.pending.resolve(&sync_id, data) {
                    debug!(sync_id = %sync_id, "Response for unknown or expired request");
                }
            }
            Some(Frame::Push { data }) => self.dispatch_push(data),
            None => {}
        }
    }

    async fn on_disconnect(&self, reason: &str) {
        self.connected.store(false, Ordering::Release);
        let failed = self.pending.expire_all();
        info!(reason, failed_requests = failed, "Session disconnected");
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.pending.len())
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
