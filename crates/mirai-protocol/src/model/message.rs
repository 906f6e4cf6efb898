//! Message chains.
//!
//! A [`MessageChain`] is the ordered list of segments that makes up one
//! message. Chains received from the server start with a
//! [`SingleMessage::Source`] carrying the message id and time.
//!
//! Decoding is lenient: a segment that is not an object, has an unknown
//! `type`, or does not match its schema is logged and skipped, and the rest
//! of the chain survives.
//!
//! # Example
//!
//! ```rust,ignore
//! use mirai_protocol::MessageChain;
//!
//! let chain = MessageChain::new()
//!     .plain("Hello, ")
//!     .at(10001000)
//!     .plain("! Check this out: ")
//!     .image_url("http://example.com/image.jpg");
//!
//! println!("Plain text: {}", chain.plain_text());
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use super::segment::{PokeName, SingleMessage, SourceData};

// ============================================================================
// MessageChain
// ============================================================================

/// An ordered list of message segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageChain {
    segments: Vec<SingleMessage>,
}

// ============================================================================
// Serialization / Deserialization
// ============================================================================

impl Serialize for MessageChain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.segments.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MessageChain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Self::from_values(raw))
    }
}

impl MessageChain {
    /// Decodes raw segment objects, skipping the ones that do not decode.
    pub fn from_values(raw: Vec<Value>) -> Self {
        let segments = raw
            .into_iter()
            .filter_map(|value| {
                if !value.is_object() {
                    warn!(segment = %value, "Skipping non-object message segment");
                    return None;
                }
                match SingleMessage::deserialize(&value) {
                    Ok(segment) => Some(segment),
                    Err(e) => {
                        let segment_type = value.get("type").and_then(|t| t.as_str());
                        warn!(
                            segment_type = segment_type.unwrap_or_default(),
                            error = %e,
                            "Skipping undecodable message segment"
                        );
                        None
                    }
                }
            })
            .collect();
        Self { segments }
    }
}

// ============================================================================
// Constructors and Builders
// ============================================================================

impl MessageChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Creates a chain from segments.
    pub fn from_segments(segments: Vec<SingleMessage>) -> Self {
        Self { segments }
    }

    /// Creates a chain holding a single plain text segment.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![SingleMessage::plain(text)],
        }
    }

    // --------------------------------
    // Builder methods
    // --------------------------------

    /// Appends any segment.
    pub fn push(mut self, segment: SingleMessage) -> Self {
        self.segments.push(segment);
        self
    }

    /// Appends plain text.
    pub fn plain(self, text: impl Into<String>) -> Self {
        self.push(SingleMessage::plain(text))
    }

    /// Appends an @.
    pub fn at(self, target: i64) -> Self {
        self.push(SingleMessage::at(target))
    }

    /// Appends an @all.
    pub fn at_all(self) -> Self {
        self.push(SingleMessage::at_all())
    }

    /// Appends a face.
    pub fn face(self, face_id: i32) -> Self {
        self.push(SingleMessage::face(face_id))
    }

    /// Appends an image from a URL.
    pub fn image_url(self, url: impl Into<String>) -> Self {
        self.push(SingleMessage::image_url(url))
    }

    /// Appends an image by uploaded id.
    pub fn image_id(self, image_id: impl Into<String>) -> Self {
        self.push(SingleMessage::image_id(image_id))
    }

    /// Appends a poke.
    pub fn poke(self, name: PokeName) -> Self {
        self.push(SingleMessage::poke(name))
    }

    /// Appends mirai code.
    pub fn mirai_code(self, code: impl Into<String>) -> Self {
        self.push(SingleMessage::mirai_code(code))
    }

    // --------------------------------
    // Accessors
    // --------------------------------

    /// Iterates over the segments.
    pub fn iter(&self) -> std::slice::Iter<'_, SingleMessage> {
        self.segments.iter()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the chain has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments as a slice.
    pub fn as_slice(&self) -> &[SingleMessage] {
        &self.segments
    }

    /// Consumes the chain and returns its segments.
    pub fn into_segments(self) -> Vec<SingleMessage> {
        self.segments
    }

    /// The leading [`SingleMessage::Source`], if present.
    pub fn source(&self) -> Option<&SourceData> {
        match self.segments.first() {
            Some(SingleMessage::Source(source)) => Some(source),
            _ => None,
        }
    }

    /// The message id from the leading source segment.
    pub fn message_id(&self) -> Option<i64> {
        self.source().map(|source| source.id)
    }

    /// Concatenated text of all plain segments.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(SingleMessage::as_plain)
            .collect()
    }

    /// The chain without its leading source segment, ready to be sent again.
    pub fn without_source(&self) -> MessageChain {
        self.segments
            .iter()
            .filter(|segment| !matches!(segment, SingleMessage::Source(_)))
            .cloned()
            .collect()
    }
}

impl fmt::Display for MessageChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.segments.iter().try_for_each(|segment| write!(f, "{segment}"))
    }
}

impl From<Vec<SingleMessage>> for MessageChain {
    fn from(segments: Vec<SingleMessage>) -> Self {
        Self { segments }
    }
}

impl From<&str> for MessageChain {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for MessageChain {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

impl FromIterator<SingleMessage> for MessageChain {
    fn from_iter<I: IntoIterator<Item = SingleMessage>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for MessageChain {
    type Item = SingleMessage;
    type IntoIter = std::vec::IntoIter<SingleMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageChain {
    type Item = &'a SingleMessage;
    type IntoIter = std::slice::Iter<'a, SingleMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
