//! The bot session: request façade plus listener registration.
//!
//! A [`Session`] multiplexes one connection into many outstanding requests.
//! Each request gets a fresh `syncId`, a correlation slot reserved before the
//! frame is written, and a deadline. Whichever of response and deadline
//! claims the slot first decides the outcome.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::correlation::CorrelationTable;
use crate::dispatch::Dispatcher;
use crate::error::{ApiError, ApiResult};
use crate::event::TypedEvent;
use crate::executor::{EventExecutor, ExecutionMode};
use crate::limiter::RateLimiter;
use crate::listener::ListenerRegistry;
use crate::registry::DecoderRegistry;
use crate::transport::{
    ConnectionHandle, DEFAULT_OUTBOUND_CAPACITY, FrameHandler, HandshakeParams, WsConnector,
    connection_pair,
};

/// How long a request waits for its response by default.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Construction options for a [`Session`].
#[derive(Debug)]
pub struct SessionOptions {
    /// Listener execution mode. Fixed for the session's lifetime.
    pub mode: ExecutionMode,
    /// Per-request deadline.
    pub request_timeout: Duration,
    /// Optional outbound rate limiter.
    pub limiter: Option<RateLimiter>,
    /// Depth of the outbound frame queue.
    pub outbound_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            limiter: None,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }
}

impl SessionOptions {
    /// Sets the execution mode.
    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Installs a rate limiter.
    pub fn limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }
}

/// Outbound request envelope.
#[derive(Debug, Serialize)]
struct Envelope<'a> {
    #[serde(rename = "syncId")]
    sync_id: i64,
    command: &'a str,
    #[serde(rename = "subCommand", skip_serializing_if = "Option::is_none")]
    sub_command: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Value>,
}

struct SessionInner {
    qq: i64,
    mode: ExecutionMode,
    handle: ConnectionHandle,
    next_sync_id: AtomicI64,
    pending: Arc<CorrelationTable>,
    listeners: Arc<ListenerRegistry>,
    decoders: Arc<DecoderRegistry>,
    executor: Arc<dyn EventExecutor>,
    limiter: RwLock<Option<Arc<RateLimiter>>>,
    connected: Arc<AtomicBool>,
    request_timeout: Duration,
}

/// A connected bot identity.
///
/// Cheap to clone. Once the read loop stops the session is inert:
/// [`is_connected`](Self::is_connected) returns `false` and every call fails
/// with [`ApiError::NotConnected`].
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Dials the server through `connector` and starts the read loop.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn connect(
        connector: &dyn WsConnector,
        params: &HandshakeParams,
        decoders: Arc<DecoderRegistry>,
        options: SessionOptions,
    ) -> ApiResult<Self> {
        let (handle, driver) = connection_pair(options.outbound_capacity);
        let session = Self::new(params.qq, handle, decoders, options);

        info!(url = %params.redacted_url(), qq = params.qq, "Connecting");
        connector
            .connect(&params.url(), session.frame_handler(), driver)
            .await?;
        info!(qq = params.qq, mode = %session.inner.mode, "Session established");

        Ok(session)
    }

    /// Builds a session over an existing connection handle.
    ///
    /// The caller is responsible for feeding inbound frames to
    /// [`frame_handler`](Self::frame_handler). Must be called inside a Tokio
    /// runtime.
    pub fn new(
        qq: i64,
        handle: ConnectionHandle,
        decoders: Arc<DecoderRegistry>,
        options: SessionOptions,
    ) -> Self {
        let executor: Arc<dyn EventExecutor> = Arc::from(options.mode.executor());
        Self {
            inner: Arc::new(SessionInner {
                qq,
                mode: options.mode,
                handle,
                next_sync_id: AtomicI64::new(1),
                pending: Arc::new(CorrelationTable::new()),
                listeners: Arc::new(ListenerRegistry::new()),
                decoders,
                executor,
                limiter: RwLock::new(options.limiter.map(Arc::new)),
                connected: Arc::new(AtomicBool::new(true)),
                request_timeout: options.request_timeout,
            }),
        }
    }

    /// Returns the handler the transport feeds inbound frames to.
    pub fn frame_handler(&self) -> Arc<dyn FrameHandler> {
        Arc::new(Dispatcher {
            pending: Arc::clone(&self.inner.pending),
            listeners: Arc::clone(&self.inner.listeners),
            decoders: Arc::clone(&self.inner.decoders),
            executor: Arc::clone(&self.inner.executor),
            connected: Arc::clone(&self.inner.connected),
        })
    }

    /// The bot account id.
    pub fn qq(&self) -> i64 {
        self.inner.qq
    }

    /// The listener execution mode.
    pub fn mode(&self) -> ExecutionMode {
        self.inner.mode
    }

    /// Returns `true` while the read loop is running.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Number of requests waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    /// The decoder registry this session dispatches with.
    pub fn decoders(&self) -> &DecoderRegistry {
        &self.inner.decoders
    }

    /// Asks the transport to close. Outstanding requests fail once the read
    /// loop has stopped.
    pub fn close(&self) {
        info!(qq = self.inner.qq, "Closing session");
        self.inner.handle.close();
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Registers an async listener for `E`.
    ///
    /// Returning `false` stops later listeners for the same event.
    pub fn listen<E, F, Fut>(&self, listener: F)
    where
        E: TypedEvent,
        F: Fn(Arc<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        if !self.inner.decoders.contains(E::TYPE_TAG) {
            warn!(tag = E::TYPE_TAG, "Listener registered for a tag with no decoder");
        }
        self.inner.listeners.add::<E, F, Fut>(listener);
    }

    /// Registers a synchronous listener for `E`.
    pub fn listen_sync<E, F>(&self, listener: F)
    where
        E: TypedEvent,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        if !self.inner.decoders.contains(E::TYPE_TAG) {
            warn!(tag = E::TYPE_TAG, "Listener registered for a tag with no decoder");
        }
        self.inner.listeners.add_sync::<E, F>(listener);
    }

    /// Runs `fut` on the session's executor.
    ///
    /// In ordered mode it queues behind pending listener jobs.
    pub fn run<Fut>(&self, fut: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.executor.execute(fut.boxed());
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Installs, replaces or removes the rate limiter.
    pub fn set_limiter(&self, limiter: Option<RateLimiter>) {
        *self.inner.limiter.write() = limiter.map(Arc::new);
    }

    /// Sends a command and waits for its correlated response object.
    ///
    /// A non-zero `code` in the response becomes [`ApiError::Remote`].
    pub async fn call(
        &self,
        command: &str,
        sub_command: Option<&str>,
        content: Option<Value>,
    ) -> ApiResult<Value> {
        if !self.is_connected() {
            return Err(ApiError::NotConnected);
        }

        let limiter = self.inner.limiter.read().clone();
        if let Some(limiter) = limiter {
            limiter.admit().await?;
        }

        // The deadline covers queueing, writing and waiting for the reply.
        let deadline = Instant::now() + self.inner.request_timeout;
        let sync_id = self.inner.next_sync_id.fetch_add(1, Ordering::Relaxed);
        let key = sync_id.to_string();
        let frame = serde_json::to_vec(&Envelope {
            sync_id,
            command,
            sub_command,
            content,
        })?;

        let mut rx = self.inner.pending.reserve(key.clone());
        let _slot = SlotGuard {
            pending: &self.inner.pending,
            key: &key,
        };
        if !self.is_connected() {
            // Disconnect raced with the reservation; expire_all already ran.
            return Err(ApiError::NotConnected);
        }

        debug!(sync_id, command, sub_command, "Sending request");
        let exchange = async {
            if let Err(e) = self.inner.handle.send(frame).await {
                debug!(sync_id, command, error = %e, "Request not written");
                return Err(ApiError::from(e));
            }
            (&mut rx).await.map_err(|_| ApiError::NotConnected)
        };
        let outcome = timeout_at(deadline, exchange).await;

        let response = match outcome {
            Ok(result) => result?,
            Err(_) => {
                if self.inner.pending.expire(&key) {
                    debug!(sync_id, command, "Request timed out");
                    return Err(ApiError::Timeout);
                }
                // The dispatcher claimed the slot first; its value is in flight.
                rx.await.map_err(|_| ApiError::NotConnected)?
            }
        };

        check_code(response)
    }

    /// Like [`call`](Self::call), returning the response's `data` field.
    pub async fn call_data(
        &self,
        command: &str,
        sub_command: Option<&str>,
        content: Option<Value>,
    ) -> ApiResult<Value> {
        self.call_field(command, sub_command, content, "data").await
    }

    /// Like [`call`](Self::call), returning one named field of the response.
    pub async fn call_field(
        &self,
        command: &str,
        sub_command: Option<&str>,
        content: Option<Value>,
        field: &str,
    ) -> ApiResult<Value> {
        let mut response = self.call(command, sub_command, content).await?;
        response
            .get_mut(field)
            .map(Value::take)
            .ok_or_else(|| ApiError::Serialization(format!("response has no '{field}' field")))
    }
}

/// Releases a correlation slot however the owning call ends, including when
/// the caller drops the call future.
struct SlotGuard<'a> {
    pending: &'a CorrelationTable,
    key: &'a str,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        // No-op when the slot was already resolved or expired.
        self.pending.expire(self.key);
    }
}

fn check_code(response: Value) -> ApiResult<Value> {
    match response.get("code").and_then(Value::as_i64) {
        Some(code) if code != 0 => Err(ApiError::Remote {
            code,
            message: response
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
        _ => Ok(response),
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("qq", &self.inner.qq)
            .field("mode", &self.inner.mode)
            .field("connected", &self.is_connected())
            .field("pending", &self.inner.pending.len())
            .field("listeners", &self.inner.listeners)
            .field("request_timeout", &self.inner.request_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use serde::Deserialize;
    use serde_json::json;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    use super::*;
    use crate::limiter::LimitPolicy;
    use crate::transport::ConnectionDriver;

    #[derive(Debug, Deserialize)]
    struct Nudge {
        from: i64,
    }

    impl crate::event::TypedEvent for Nudge {
        const TYPE_TAG: &'static str = "Nudge";
    }

    fn decoders() -> Arc<DecoderRegistry> {
        Arc::new(DecoderRegistry::builder().register::<Nudge>().build())
    }

    /// Acks every outbound frame and forwards its JSON to the test.
    fn fake_server(driver: ConnectionDriver) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (mut outbound, _shutdown) = driver.into_parts();
        tokio::spawn(async move {
            while let Some(frame) = outbound.recv().await {
                let value: Value = serde_json::from_slice(&frame.data).unwrap();
                frame.complete(Ok(()));
                let _ = tx.send(value);
            }
        });
        rx
    }

    fn session(options: SessionOptions) -> (Session, mpsc::UnboundedReceiver<Value>) {
        let (handle, driver) = connection_pair(16);
        let session = Session::new(10001, handle, decoders(), options);
        (session, fake_server(driver))
    }

    #[tokio::test]
    async fn test_call_roundtrip_and_envelope() {
        let (session, mut sent) = session(SessionOptions::default());
        let handler = session.frame_handler();

        let caller = {
            let session = session.clone();
            tokio::spawn(async move {
                session
                    .call_data("memberList", None, Some(json!({"target": 1})))
                    .await
            })
        };

        let request = sent.recv().await.unwrap();
        assert_eq!(
            request,
            json!({"syncId": 1, "command": "memberList", "content": {"target": 1}})
        );

        let reply = json!({"syncId": "1", "data": {"code": 0, "msg": "", "data": [1, 2]}});
        handler.on_frame(reply.to_string().as_bytes()).await;

        assert_eq!(caller.await.unwrap().unwrap(), json!([1, 2]));
        assert_eq!(session.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_remote_error_code() {
        let (session, mut sent) = session(SessionOptions::default());
        let handler = session.frame_handler();

        let caller = {
            let session = session.clone();
            tokio::spawn(async move { session.call("mute", None, None).await })
        };
        sent.recv().await.unwrap();
        handler
            .on_frame(br#"{"syncId":"1","data":{"code":10,"msg":"no permission"}}"#)
            .await;

        match caller.await.unwrap() {
            Err(ApiError::Remote { code, message }) => {
                assert_eq!(code, 10);
                assert_eq!(message, "no permission");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bounds() {
        let (session, _sent) = session(SessionOptions::default());

        let started = Instant::now();
        let result = session.call("about", None, None).await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(ApiError::Timeout)));
        assert!(elapsed >= DEFAULT_REQUEST_TIMEOUT);
        assert!(elapsed < DEFAULT_REQUEST_TIMEOUT + Duration::from_millis(100));
        assert_eq!(session.pending_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_is_ignored() {
        let (session, mut sent) = session(
            SessionOptions::default().request_timeout(Duration::from_millis(200)),
        );
        let handler = session.frame_handler();

        assert!(matches!(
            session.call("about", None, None).await,
            Err(ApiError::Timeout)
        ));
        sent.recv().await.unwrap();
        handler
            .on_frame(br#"{"syncId":"1","data":{"code":0}}"#)
            .await;
        assert_eq!(session.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_fails_fast() {
        let (session, mut sent) = session(SessionOptions::default());
        let handler = session.frame_handler();

        let caller = {
            let session = session.clone();
            tokio::spawn(async move { session.call("about", None, None).await })
        };
        sent.recv().await.unwrap();
        handler.on_disconnect("connection reset").await;

        assert!(matches!(caller.await.unwrap(), Err(ApiError::NotConnected)));
        assert!(!session.is_connected());
        assert!(matches!(
            session.call("about", None, None).await,
            Err(ApiError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_drop_policy() {
        let one = NonZeroU32::new(1).unwrap();
        let (session, _sent) = session(
            SessionOptions::default()
                .request_timeout(Duration::from_millis(10))
                .limiter(RateLimiter::per_second(one, one, LimitPolicy::Drop)),
        );

        // The first call gets the only token and then times out.
        assert!(matches!(
            session.call("about", None, None).await,
            Err(ApiError::Timeout)
        ));
        assert!(matches!(
            session.call("about", None, None).await,
            Err(ApiError::RateLimited)
        ));

        session.set_limiter(None);
        assert!(matches!(
            session.call("about", None, None).await,
            Err(ApiError::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_push_reaches_listener_via_run_queue() {
        let (session, _sent) = session(SessionOptions::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        session.listen_sync::<Nudge, _>(move |e| {
            let _ = tx.send(e.from);
            true
        });
        session
            .frame_handler()
            .on_frame(br#"{"syncId":"-1","data":{"type":"Nudge","from":5}}"#)
            .await;

        assert_eq!(rx.recv().await, Some(5));
    }

    #[tokio::test]
    async fn test_send_failure_releases_slot() {
        let (handle, driver) = connection_pair(1);
        let session = Session::new(1, handle, decoders(), SessionOptions::default());
        drop(driver);

        assert!(matches!(
            session.call("about", None, None).await,
            Err(ApiError::Transport(_))
        ));
        assert_eq!(session.pending_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_call_releases_slot() {
        let (session, mut sent) = session(SessionOptions::default());

        let abandoned = tokio::time::timeout(
            Duration::from_millis(100),
            session.call("about", None, None),
        )
        .await;
        assert!(abandoned.is_err());

        sent.recv().await.unwrap();
        assert_eq!(session.pending_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_writer_still_times_out() {
        let (handle, driver) = connection_pair(4);
        let session = Session::new(1, handle, decoders(), SessionOptions::default());
        // Frames stay queued and are never acknowledged.
        let (_outbound, _shutdown) = driver.into_parts();

        let started = Instant::now();
        let result = session.call("about", None, None).await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(ApiError::Timeout)));
        assert!(elapsed >= DEFAULT_REQUEST_TIMEOUT);
        assert!(elapsed < DEFAULT_REQUEST_TIMEOUT + Duration::from_millis(100));
        assert_eq!(session.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_callers_get_their_own_responses() {
        let (session, mut sent) = session(SessionOptions::default());
        let handler = session.frame_handler();

        let callers: Vec<_> = (0..8i64)
            .map(|n| {
                let session = session.clone();
                tokio::spawn(async move {
                    let response = session
                        .call("about", None, Some(json!({"n": n})))
                        .await
                        .unwrap();
                    (n, response["n"].as_i64())
                })
            })
            .collect();

        let mut requests = Vec::new();
        for _ in 0..8 {
            requests.push(sent.recv().await.unwrap());
        }
        // Answer newest first.
        for request in requests.iter().rev() {
            let reply = json!({
                "syncId": request["syncId"].to_string(),
                "data": {"code": 0, "n": request["content"]["n"]},
            });
            handler.on_frame(&serde_json::to_vec(&reply).unwrap()).await;
        }

        for caller in callers {
            let (n, echoed) = caller.await.unwrap();
            assert_eq!(echoed, Some(n));
        }
        assert_eq!(session.pending_requests(), 0);
    }
}
