//! Decoder registry: wire type tag → typed decode function.
//!
//! The registry is assembled once, explicitly, from lists of
//! [`DecoderEntry`] values contributed by each schema module, and is
//! immutable afterwards. There is no global mutable map and no load-order
//! dependency between contributors.
//!
//! ```rust,ignore
//! let registry = DecoderRegistry::builder()
//!     .extend(message_decoders())
//!     .extend(event_decoders())
//!     .build();
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::error::{DecodeError, RegistryError};
use crate::event::{BoxedEvent, TypedEvent};

/// Decode function stored in the registry.
pub type DecodeFn = fn(&Value) -> Result<BoxedEvent, DecodeError>;

fn decode_as<E: TypedEvent>(data: &Value) -> Result<BoxedEvent, DecodeError> {
    E::decode(data).map(|event| Arc::new(event) as BoxedEvent)
}

/// One `(tag, decode)` pair.
#[derive(Clone, Copy)]
pub struct DecoderEntry {
    tag: &'static str,
    decode: DecodeFn,
}

impl DecoderEntry {
    /// Builds the entry for schema `E`.
    pub fn of<E: TypedEvent>() -> Self {
        Self {
            tag: E::TYPE_TAG,
            decode: decode_as::<E>,
        }
    }

    /// The type tag this entry decodes.
    pub fn tag(&self) -> &'static str {
        self.tag
    }
}

impl fmt::Debug for DecoderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderEntry")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Immutable mapping from type tag to decoder.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl DecoderRegistry {
    /// Starts assembling a registry.
    pub fn builder() -> DecoderRegistryBuilder {
        DecoderRegistryBuilder::default()
    }

    /// Returns `true` if a decoder exists for `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.decoders.contains_key(tag)
    }

    /// Decodes `data` with the decoder registered under `tag`.
    pub fn decode(&self, tag: &str, data: &Value) -> Result<BoxedEvent, DecodeError> {
        let decode = self
            .decoders
            .get(tag)
            .ok_or_else(|| DecodeError::UnknownTag(tag.to_string()))?;
        decode(data)
    }

    /// Decodes a payload whose tag is read from its own `type` field.
    pub fn decode_tagged(&self, data: &Value) -> Result<BoxedEvent, DecodeError> {
        let tag = data.get("type").and_then(Value::as_str).unwrap_or_default();
        self.decode(tag, data)
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Iterates over the registered tags in arbitrary order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decoders.keys().copied()
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.tags().collect();
        tags.sort_unstable();
        f.debug_struct("DecoderRegistry").field("tags", &tags).finish()
    }
}

/// Builder for [`DecoderRegistry`].
#[derive(Default)]
pub struct DecoderRegistryBuilder {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl DecoderRegistryBuilder {
    /// Registers schema `E`. A duplicate tag is logged and ignored; the
    /// first registration wins.
    pub fn register<E: TypedEvent>(self) -> Self {
        self.entry(DecoderEntry::of::<E>())
    }

    /// Registers schema `E`, failing on a duplicate tag.
    pub fn try_register<E: TypedEvent>(self) -> Result<Self, RegistryError> {
        self.try_entry(DecoderEntry::of::<E>())
    }

    /// Adds a prebuilt entry. Duplicates are logged and ignored.
    pub fn entry(mut self, entry: DecoderEntry) -> Self {
        if self.decoders.contains_key(entry.tag) {
            warn!(tag = entry.tag, "Duplicate decoder registration ignored");
        } else {
            self.decoders.insert(entry.tag, entry.decode);
        }
        self
    }

    /// Adds a prebuilt entry, failing on a duplicate tag.
    pub fn try_entry(mut self, entry: DecoderEntry) -> Result<Self, RegistryError> {
        if self.decoders.contains_key(entry.tag) {
            return Err(RegistryError::DuplicateTag(entry.tag));
        }
        self.decoders.insert(entry.tag, entry.decode);
        Ok(self)
    }

    /// Adds every entry of `entries`.
    pub fn extend(self, entries: impl IntoIterator<Item = DecoderEntry>) -> Self {
        entries.into_iter().fold(self, Self::entry)
    }

    /// Finalizes the registry.
    pub fn build(self) -> DecoderRegistry {
        DecoderRegistry {
            decoders: self.decoders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Joined {
        member: i64,
    }

    impl TypedEvent for Joined {
        const TYPE_TAG: &'static str = "Joined";
    }

    #[derive(Debug, Deserialize)]
    struct AlsoJoined {}

    impl TypedEvent for AlsoJoined {
        const TYPE_TAG: &'static str = "Joined";
    }

    #[test]
    fn test_decode_known_tag() {
        let registry = DecoderRegistry::builder().register::<Joined>().build();
        let event = registry
            .decode("Joined", &json!({"type": "Joined", "member": 42}))
            .unwrap();
        assert_eq!(event.downcast_ref::<Joined>().unwrap().member, 42);
    }

    #[test]
    fn test_unknown_and_malformed() {
        let registry = DecoderRegistry::builder().register::<Joined>().build();

        let err = registry.decode("Left", &json!({})).unwrap_err();
        assert_eq!(err, DecodeError::UnknownTag("Left".into()));

        let err = registry
            .decode_tagged(&json!({"type": "Joined", "member": "x"}))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[test]
    fn test_duplicate_tags() {
        let registry = DecoderRegistry::builder()
            .register::<Joined>()
            .register::<AlsoJoined>()
            .build();
        assert_eq!(registry.len(), 1);
        // First registration wins.
        assert!(
            registry
                .decode("Joined", &json!({"member": 1}))
                .unwrap()
                .is::<Joined>()
        );

        let err = DecoderRegistry::builder()
            .register::<Joined>()
            .try_register::<AlsoJoined>()
            .err();
        assert_eq!(err, Some(RegistryError::DuplicateTag("Joined")));
    }

    #[test]
    fn test_extend_from_entries() {
        let registry = DecoderRegistry::builder()
            .extend([DecoderEntry::of::<Joined>()])
            .build();
        assert!(registry.contains("Joined"));
        assert!(!registry.is_empty());
    }
}
