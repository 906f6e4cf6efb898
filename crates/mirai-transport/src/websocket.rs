//! WebSocket client built on `tokio-tungstenite`.
//!
//! One spawned task owns the socket. It selects over the session's shutdown
//! signal, the outbound frame queue and the inbound stream, so writes are
//! serialized and every inbound text frame reaches the handler in arrival
//! order. The loop never reconnects: when it stops, the handler's
//! `on_disconnect` runs once and the session becomes inert.

use std::ops::ControlFlow;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use mirai_core::{
    ConnectionDriver, FrameHandler, OutboundFrame, TransportError, TransportResult, WsConnector,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// [`WsConnector`] backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl WsConnector for TungsteniteConnector {
    async fn connect(
        &self,
        url: &str,
        handler: Arc<dyn FrameHandler>,
        driver: ConnectionDriver,
    ) -> TransportResult<()> {
        let display_url = redact_verify_key(url);
        debug!(url = %display_url, "Connecting to WebSocket server");

        let (ws_stream, _response) =
            connect_async(url)
                .await
                .map_err(|e| TransportError::ConnectionFailed {
                    url: display_url.clone(),
                    reason: format!("WebSocket connection failed: {e}"),
                })?;

        info!(url = %display_url, "WebSocket client connected");

        let state = ClientLoopState::new(handler, ws_stream);
        tokio::spawn(state.run(driver));
        Ok(())
    }
}

/// Socket halves plus the handler fed by the read side.
struct ClientLoopState {
    handler: Arc<dyn FrameHandler>,
    ws_tx: WsSink,
    ws_rx: WsSource,
}

impl ClientLoopState {
    fn new(handler: Arc<dyn FrameHandler>, ws_stream: WsStream) -> Self {
        let (ws_tx, ws_rx) = ws_stream.split();
        Self {
            handler,
            ws_tx,
            ws_rx,
        }
    }

    async fn run(mut self, driver: ConnectionDriver) {
        let (mut outbound, mut shutdown) = driver.into_parts();

        let reason = loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    info!("WebSocket client shutting down");
                    let _ = self.ws_tx.close().await;
                    break "closed by client".to_string();
                }

                frame = outbound.recv() => {
                    let Some(frame) = frame else {
                        break "session dropped".to_string();
                    };
                    if let ControlFlow::Break(reason) = self.write_frame(frame).await {
                        break reason;
                    }
                }

                msg = self.ws_rx.next() => {
                    if let ControlFlow::Break(reason) = self.handle_message(msg).await {
                        break reason;
                    }
                }
            }
        };

        self.handler.on_disconnect(&reason).await;
    }

    /// Writes one outbound frame and reports the result to its sender.
    async fn write_frame(&mut self, frame: OutboundFrame) -> ControlFlow<String> {
        let text = match String::from_utf8(frame.data.clone()) {
            Ok(text) => text,
            Err(_) => {
                frame.complete(Err(TransportError::SendFailed(
                    "frame is not valid UTF-8".into(),
                )));
                return ControlFlow::Continue(());
            }
        };

        trace!(len = text.len(), "Sending");
        match self.ws_tx.send(Message::Text(text.into())).await {
            Ok(()) => {
                frame.complete(Ok(()));
                ControlFlow::Continue(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to send frame");
                frame.complete(Err(TransportError::SendFailed(e.to_string())));
                ControlFlow::Break(format!("write failed: {e}"))
            }
        }
    }

    /// Handles one item from the inbound stream.
    async fn handle_message(&mut self, msg: Option<Result<Message, Error>>) -> ControlFlow<String> {
        match msg {
            Some(Ok(Message::Text(text))) => {
                trace!(len = text.len(), "Received");
                self.handler.on_frame(text.as_bytes()).await;
                ControlFlow::Continue(())
            }
            Some(Ok(Message::Binary(data))) => {
                trace!(len = data.len(), "Ignoring binary frame");
                ControlFlow::Continue(())
            }
            Some(Ok(Message::Ping(data))) => {
                trace!("Received ping, sending pong");
                match self.ws_tx.send(Message::Pong(data)).await {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(e) => {
                        warn!(error = %e, "Failed to send pong");
                        ControlFlow::Break(format!("pong failed: {e}"))
                    }
                }
            }
            Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => ControlFlow::Continue(()),
            Some(Ok(Message::Close(frame))) => {
                info!(frame = ?frame, "Server closed connection");
                ControlFlow::Break("closed by server".to_string())
            }
            Some(Err(e)) => {
                warn!(error = %e, "WebSocket error");
                ControlFlow::Break(format!("read failed: {e}"))
            }
            None => {
                info!("WebSocket stream ended");
                ControlFlow::Break("stream ended".to_string())
            }
        }
    }
}

/// Masks the `verifyKey` query value.
fn redact_verify_key(url: &str) -> String {
    let Some(start) = url.find("verifyKey=").map(|i| i + "verifyKey=".len()) else {
        return url.to_string();
    };
    let end = url[start..].find('&').map_or(url.len(), |i| start + i);
    format!("{}***{}", &url[..start], &url[end..])
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mirai_core::{
        ApiError, DecoderRegistry, HandshakeParams, Session, SessionOptions, WsChannel,
    };
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use super::*;

    fn params(port: u16) -> HandshakeParams {
        HandshakeParams {
            host: "127.0.0.1".into(),
            port,
            channel: WsChannel::All,
            verify_key: "s3cret".into(),
            qq: 10001,
        }
    }

    #[test]
    fn test_redact_verify_key() {
        assert_eq!(
            redact_verify_key("ws://h:1/all?verifyKey=abc&qq=2"),
            "ws://h:1/all?verifyKey=***&qq=2"
        );
        assert_eq!(
            redact_verify_key("ws://h:1/all?qq=2&verifyKey=abc"),
            "ws://h:1/all?qq=2&verifyKey=***"
        );
        assert_eq!(redact_verify_key("ws://h:1/all"), "ws://h:1/all");
    }

    #[tokio::test]
    async fn test_request_over_real_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

            let request = loop {
                match ws.next().await.unwrap().unwrap() {
                    Message::Text(text) => break serde_json::from_str::<Value>(&text).unwrap(),
                    _ => continue,
                }
            };
            assert_eq!(request["command"], "about");

            let reply = json!({
                "syncId": request["syncId"].to_string(),
                "data": {"code": 0, "msg": "", "data": {"version": "2.10.0"}},
            });
            ws.send(Message::Text(reply.to_string().into())).await.unwrap();
            ws.close(None).await.unwrap();
        });

        let session = Session::connect(
            &TungsteniteConnector,
            &params(port),
            Arc::new(DecoderRegistry::default()),
            SessionOptions::default(),
        )
        .await
        .unwrap();

        let about = session.call_data("about", None, None).await.unwrap();
        assert_eq!(about, json!({"version": "2.10.0"}));
        server.await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while session.is_connected() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(matches!(
            session.call("about", None, None).await,
            Err(ApiError::NotConnected)
        ));
    }

    struct NullHandler;

    #[async_trait]
    impl FrameHandler for NullHandler {
        async fn on_frame(&self, _data: &[u8]) {}
        async fn on_disconnect(&self, _reason: &str) {}
    }

    #[tokio::test]
    async fn test_failed_pong_stops_the_loop() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio_tungstenite::accept_async(stream).await.unwrap()
        });

        let (ws_stream, _) = connect_async(format!("ws://127.0.0.1:{port}/all"))
            .await
            .unwrap();
        let _server_ws = server.await.unwrap();

        let mut state = ClientLoopState::new(Arc::new(NullHandler), ws_stream);
        // Writes after our own close frame are rejected.
        state.ws_tx.close().await.unwrap();

        let flow = state
            .handle_message(Some(Ok(Message::Ping(vec![1, 2].into()))))
            .await;
        assert!(matches!(flow, ControlFlow::Break(reason) if reason.starts_with("pong failed")));
    }

    #[tokio::test]
    async fn test_connect_failure_hides_key() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = Session::connect(
            &TungsteniteConnector,
            &params(port),
            Arc::new(DecoderRegistry::default()),
            SessionOptions::default(),
        )
        .await
        .unwrap_err();

        match err {
            ApiError::Transport(TransportError::ConnectionFailed { url, .. }) => {
                assert!(!url.contains("s3cret"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
