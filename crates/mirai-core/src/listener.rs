//! Listener registry: type tag → ordered list of callbacks.
//!
//! Listeners are registered against a concrete event type. The wrapper built
//! at registration time performs the downcast, so dispatch never needs to
//! know the concrete type. The per-tag lists are copy-on-write: a writer
//! builds a new slice and swaps it in, a reader clones the current `Arc` and
//! iterates it without holding the lock.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use tracing::{error, trace};

use crate::event::{BoxedEvent, TypedEvent, downcast_event};

/// A type-erased listener. Returning `false` stops later listeners for the
/// same delivery.
pub type Listener = Arc<dyn Fn(BoxedEvent) -> BoxFuture<'static, bool> + Send + Sync>;

/// Snapshot of the listeners registered for one tag.
pub type ListenerList = Arc<[Listener]>;

/// Registry of listeners keyed by wire type tag.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: RwLock<HashMap<&'static str, ListenerList>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an async listener for events of type `E`.
    ///
    /// Listeners for the same tag run in registration order.
    pub fn add<E, F, Fut>(&self, listener: F)
    where
        E: TypedEvent,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let wrapped: Listener = Arc::new(move |event: BoxedEvent| match downcast_event::<E>(event)
        {
            Some(event) => listener(event).boxed(),
            // Unreachable through dispatch: the tag selected both decoder and list.
            None => futures::future::ready(true).boxed(),
        });
        self.push(E::TYPE_TAG, wrapped);
    }

    /// Registers a synchronous listener for events of type `E`.
    pub fn add_sync<E, F>(&self, listener: F)
    where
        E: TypedEvent,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.add::<E, _, _>(move |event: Arc<E>| futures::future::ready(listener(&event)));
    }

    fn push(&self, tag: &'static str, listener: Listener) {
        let mut entries = self.entries.write();
        let next: ListenerList = match entries.get(tag) {
            Some(current) => current.iter().cloned().chain([listener]).collect(),
            None => Arc::from([listener]),
        };
        entries.insert(tag, next);
    }

    /// Returns the current listeners for `tag`, if any.
    pub fn snapshot(&self, tag: &str) -> Option<ListenerList> {
        self.entries.read().get(tag).cloned()
    }

    /// Returns `true` if at least one listener is registered for `tag`.
    pub fn has_listeners(&self, tag: &str) -> bool {
        self.entries.read().contains_key(tag)
    }

    /// Number of listeners registered for `tag`.
    pub fn len(&self, tag: &str) -> usize {
        self.entries.read().get(tag).map_or(0, |list| list.len())
    }

    /// Returns `true` if no listener is registered at all.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        let mut counts: Vec<_> = entries.iter().map(|(tag, l)| (*tag, l.len())).collect();
        counts.sort_unstable();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}

/// Runs `listeners` against `event` in order, stopping at the first `false`.
///
/// A panicking listener is logged and ends the delivery; it never escapes
/// into the executor.
pub async fn deliver(listeners: ListenerList, event: BoxedEvent) {
    let tag = event.type_tag();
    let run = async {
        for (index, listener) in listeners.iter().enumerate() {
            if !listener(Arc::clone(&event)).await {
                trace!(tag, index, "Listener stopped propagation");
                break;
            }
        }
    };

    if let Err(panic) = AssertUnwindSafe(run).catch_unwind().await {
        error!(tag, panic = %panic_message(&*panic), "Event listener panicked");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
