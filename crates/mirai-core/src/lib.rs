//! # Mirai Core
//!
//! The connection and dispatch engine of the mirai-api-http client.
//!
//! One WebSocket connection carries two kinds of traffic: replies to requests
//! the bot sent, and unsolicited pushes (messages and events). This crate
//! turns that single stream into:
//!
//! - **Requests**: [`Session::call`] assigns a `syncId`, registers a slot in
//!   the [`CorrelationTable`], writes the frame and waits for the reply or the
//!   deadline, whichever comes first.
//! - **Events**: the [`Dispatcher`] classifies each push by its `type` tag,
//!   decodes it through the [`DecoderRegistry`] and hands the listeners of the
//!   [`ListenerRegistry`] to the session's [`EventExecutor`].
//!
//! ```text
//! ┌───────────┐  frames  ┌────────────┐  response  ┌──────────────────┐
//! │ Transport │────────▶│ Dispatcher │──────────▶│ CorrelationTable │──▶ Session::call
//! └───────────┘          └────────────┘            └──────────────────┘
//!                              │ push
//!                              ▼
//!                     ┌─────────────────┐  job  ┌───────────────┐
//!                     │ DecoderRegistry │─────▶│ EventExecutor │──▶ listeners
//!                     └─────────────────┘       └───────────────┘
//! ```
//!
//! The crate knows nothing about sockets or wire schemas. A transport crate
//! implements [`WsConnector`]; a protocol crate contributes [`TypedEvent`]
//! schemas to the registry.

pub mod correlation;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod executor;
pub mod limiter;
pub mod listener;
pub mod registry;
pub mod session;
pub mod transport;

pub use correlation::CorrelationTable;
pub use dispatch::{Dispatcher, Frame};
pub use error::{ApiError, ApiResult, DecodeError, RegistryError, TransportError, TransportResult};
pub use event::{BoxedEvent, Event, TypedEvent, downcast_event};
pub use executor::{ConcurrentExecutor, EventExecutor, ExecutionMode, Job, OrderedExecutor};
pub use limiter::{LimitPolicy, RateLimiter};
pub use listener::{Listener, ListenerList, ListenerRegistry};
pub use registry::{DecodeFn, DecoderEntry, DecoderRegistry, DecoderRegistryBuilder};
pub use session::{DEFAULT_REQUEST_TIMEOUT, Session, SessionOptions};
pub use transport::{
    ConnectionDriver, ConnectionHandle, DEFAULT_OUTBOUND_CAPACITY, FrameHandler, HandshakeParams,
    OutboundFrame, ShutdownSignal, WsChannel, WsConnector, connection_pair,
};

pub use async_trait::async_trait;
pub use futures::future::BoxFuture;
