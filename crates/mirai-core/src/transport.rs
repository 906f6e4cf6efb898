//! Connection handle and transport capability traits.
//!
//! The session never touches a socket. It talks to the transport through a
//! [`ConnectionHandle`] (outbound frames plus a shutdown signal) and receives
//! inbound frames through a [`FrameHandler`]. The transport implementation
//! owns the matching [`ConnectionDriver`] and is the only writer to the
//! socket, so frames are written one at a time.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{TransportError, TransportResult};

/// Default depth of the outbound frame queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

// =============================================================================
// Frame Handler
// =============================================================================

/// Receives what the read loop sees.
#[async_trait]
pub trait FrameHandler: Send + Sync {
    /// Called for every inbound text frame, in arrival order.
    async fn on_frame(&self, data: &[u8]);

    /// Called once when the read loop stops for any reason.
    async fn on_disconnect(&self, reason: &str);
}

/// Dials a server and starts the read/write loop.
#[async_trait]
pub trait WsConnector: Send + Sync {
    /// Connects to `url` and spawns the loop that drives `driver`, feeding
    /// inbound frames to `handler`.
    ///
    /// Returns once the connection is established.
    async fn connect(
        &self,
        url: &str,
        handler: Arc<dyn FrameHandler>,
        driver: ConnectionDriver,
    ) -> TransportResult<()>;
}

// =============================================================================
// Handle / Driver
// =============================================================================

/// A frame waiting to be written, with its write acknowledgement.
#[derive(Debug)]
pub struct OutboundFrame {
    /// Serialized frame body.
    pub data: Vec<u8>,
    ack: oneshot::Sender<TransportResult<()>>,
}

impl OutboundFrame {
    /// Reports the write result back to the sender.
    pub fn complete(self, result: TransportResult<()>) {
        let _ = self.ack.send(result);
    }
}

/// Creates a connected handle/driver pair.
pub fn connection_pair(capacity: usize) -> (ConnectionHandle, ConnectionDriver) {
    let (outbound_tx, outbound_rx) = mpsc::channel(capacity.max(1));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    (
        ConnectionHandle {
            outbound: outbound_tx,
            shutdown: Arc::new(shutdown_tx),
        },
        ConnectionDriver {
            outbound: outbound_rx,
            shutdown: shutdown_rx,
        },
    )
}

/// Session side of a connection.
///
/// Cloning is cheap. Once every handle is dropped the driver observes
/// shutdown.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    outbound: mpsc::Sender<OutboundFrame>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl ConnectionHandle {
    /// Queues `data` and waits until the transport has written it.
    pub async fn send(&self, data: Vec<u8>) -> TransportResult<()> {
        let (ack, done) = oneshot::channel();
        self.outbound
            .send(OutboundFrame { data, ack })
            .await
            .map_err(|_| TransportError::closed("writer task stopped"))?;
        done.await
            .map_err(|_| TransportError::closed("frame dropped before write"))?
    }

    /// Asks the transport to close the connection.
    pub fn close(&self) {
        self.shutdown.send_replace(true);
    }

    /// Returns `true` once [`close`](Self::close) was called.
    pub fn is_closing(&self) -> bool {
        *self.shutdown.borrow()
    }
}

/// Transport side of a connection.
#[derive(Debug)]
pub struct ConnectionDriver {
    outbound: mpsc::Receiver<OutboundFrame>,
    shutdown: watch::Receiver<bool>,
}

impl ConnectionDriver {
    /// Splits the driver so both halves can be polled in one `select!`.
    pub fn into_parts(self) -> (mpsc::Receiver<OutboundFrame>, ShutdownSignal) {
        (
            self.outbound,
            ShutdownSignal {
                rx: self.shutdown,
            },
        )
    }
}

/// Resolves when the session asks for shutdown or drops every handle.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for shutdown.
    pub async fn wait(&mut self) {
        // Err means every sender is gone, which also means shutdown.
        let _ = self.rx.wait_for(|closing| *closing).await;
    }
}

// =============================================================================
// Handshake
// =============================================================================

/// Which push stream to subscribe to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WsChannel {
    /// Message containers only.
    Message,
    /// Events only.
    Event,
    /// Both.
    #[default]
    All,
}

impl WsChannel {
    /// URL path segment.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Event => "event",
            Self::All => "all",
        }
    }
}

impl fmt::Display for WsChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to open a session.
#[derive(Clone)]
pub struct HandshakeParams {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Push channel.
    pub channel: WsChannel,
    /// Verify key configured on the server.
    pub verify_key: String,
    /// Bot account id.
    pub qq: i64,
}

impl HandshakeParams {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        channel: WsChannel,
        verify_key: impl Into<String>,
        qq: i64,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            channel,
            verify_key: verify_key.into(),
            qq,
        }
    }

    /// Builds the connect URL, including the verify key.
    pub fn url(&self) -> String {
        self.build_url(&encode_query_value(&self.verify_key))
    }

    /// Builds the connect URL with the verify key masked, for logs and errors.
    pub fn redacted_url(&self) -> String {
        self.build_url("***")
    }

    fn build_url(&self, key: &str) -> String {
        format!(
            "ws://{}:{}/{}?verifyKey={}&qq={}",
            self.host, self.port, self.channel, key, self.qq
        )
    }
}

impl fmt::Debug for HandshakeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("channel", &self.channel)
            .field("verify_key", &"***")
            .field("qq", &self.qq)
            .finish()
    }
}

/// Percent-encodes every byte outside the RFC 3986 unreserved set.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(char::from(byte));
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(key: &str) -> HandshakeParams {
        HandshakeParams {
            host: "localhost".into(),
            port: 8080,
            channel: WsChannel::All,
            verify_key: key.into(),
            qq: 10001,
        }
    }

    #[test]
    fn test_url_layout() {
        assert_eq!(
            params("INITKEY").url(),
            "ws://localhost:8080/all?verifyKey=INITKEY&qq=10001"
        );
        assert_eq!(
            params("a&b=c d").url(),
            "ws://localhost:8080/all?verifyKey=a%26b%3Dc%20d&qq=10001"
        );
    }

    #[test]
    fn test_url_encodes_reserved_and_non_ascii_keys() {
        assert_eq!(
            params("k/y:@[1]").url(),
            "ws://localhost:8080/all?verifyKey=k%2Fy%3A%40%5B1%5D&qq=10001"
        );
        assert_eq!(
            params("密钥~-_.").url(),
            "ws://localhost:8080/all?verifyKey=%E5%AF%86%E9%92%A5~-_.&qq=10001"
        );
    }

    #[test]
    fn test_key_never_in_debug_or_redacted_url() {
        let p = params("secret");
        assert!(!format!("{p:?}").contains("secret"));
        assert!(!p.redacted_url().contains("secret"));
    }

    #[tokio::test]
    async fn test_send_waits_for_ack() {
        let (handle, driver) = connection_pair(4);
        let (mut outbound, _shutdown) = driver.into_parts();

        let writer = tokio::spawn(async move {
            let frame = outbound.recv().await.unwrap();
            assert_eq!(frame.data, b"hello");
            frame.complete(Err(TransportError::SendFailed("broken pipe".into())));
        });

        let err = handle.send(b"hello".to_vec()).await.unwrap_err();
        assert!(matches!(err, TransportError::SendFailed(_)));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_signal() {
        let (handle, driver) = connection_pair(4);
        let (_outbound, mut shutdown) = driver.into_parts();

        handle.close();
        assert!(handle.is_closing());
        shutdown.wait().await;

        // Dropping all handles also counts as shutdown.
        let (handle, driver) = connection_pair(4);
        let (_outbound, mut shutdown) = driver.into_parts();
        drop(handle);
        shutdown.wait().await;
    }

    #[tokio::test]
    async fn test_send_after_driver_dropped() {
        let (handle, driver) = connection_pair(4);
        drop(driver);
        assert!(matches!(
            handle.send(vec![1]).await,
            Err(TransportError::ConnectionClosed { .. })
        ));
    }
}
