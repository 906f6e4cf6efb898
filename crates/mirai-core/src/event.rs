//! Event trait and typed-event plumbing.
//!
//! Every push payload the server sends carries a `type` tag. A concrete
//! payload schema implements [`TypedEvent`], which ties the schema to its tag
//! at compile time. The blanket [`Event`] impl then lets the dispatcher move
//! decoded values around as [`BoxedEvent`] and hand them back to listeners
//! with a downcast that the registration already proved correct.
//!
//! ```rust,ignore
//! #[derive(Debug, Deserialize)]
//! struct BotMuteEvent { duration_seconds: i64 }
//!
//! impl TypedEvent for BotMuteEvent {
//!     const TYPE_TAG: &'static str = "BotMuteEvent";
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DecodeError;

/// A decoded, immutable push event.
///
/// Implemented automatically for every [`TypedEvent`].
pub trait Event: Any + Send + Sync + fmt::Debug {
    /// The wire type tag this event was decoded from.
    fn type_tag(&self) -> &'static str;

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Converts the shared event into a shared `Any` for owned downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Type-erased shared event.
pub type BoxedEvent = Arc<dyn Event>;

impl dyn Event {
    /// Returns `true` if the event is of type `T`.
    pub fn is<T: Event>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrows the event as a `T`, if it is one.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Recovers the concrete event type from a [`BoxedEvent`].
pub fn downcast_event<T: Event>(event: BoxedEvent) -> Option<Arc<T>> {
    event.into_any().downcast::<T>().ok()
}

/// A payload schema bound to exactly one wire type tag.
pub trait TypedEvent: DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// The `type` field value that selects this schema.
    const TYPE_TAG: &'static str;

    /// Decodes the payload object. Never returns a partially filled value.
    fn decode(data: &Value) -> Result<Self, DecodeError> {
        Self::deserialize(data).map_err(|e| DecodeError::malformed(Self::TYPE_TAG, e))
    }
}

impl<T: TypedEvent> Event for T {
    fn type_tag(&self) -> &'static str {
        T::TYPE_TAG
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
