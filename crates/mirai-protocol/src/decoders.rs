//! The decoder registry for every push tag the protocol defines.

use std::sync::{Arc, LazyLock};

use mirai_core::{DecoderEntry, DecoderRegistry};

use crate::model::event::{message_decoders, notice_decoders, request_decoders};

static REGISTRY: LazyLock<Arc<DecoderRegistry>> =
    LazyLock::new(|| Arc::new(DecoderRegistry::builder().extend(entries()).build()));

/// Every decoder entry, in registration order: message containers, notices,
/// then requests.
pub fn entries() -> Vec<DecoderEntry> {
    let mut entries = message_decoders();
    entries.extend(notice_decoders());
    entries.extend(request_decoders());
    entries
}

/// The shared registry, built on first use and immutable afterwards.
pub fn registry() -> Arc<DecoderRegistry> {
    Arc::clone(&REGISTRY)
}
