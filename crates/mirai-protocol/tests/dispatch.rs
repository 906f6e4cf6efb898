//! End-to-end dispatch tests over an in-memory connection.
//!
//! A fake server task answers every request and records it, while the test
//! injects pushes straight into the session's frame handler.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use mirai_core::{
    ApiError, ExecutionMode, FrameHandler, Session, SessionOptions, connection_pair,
};
use mirai_protocol::{GroupMessage, MessageChain, MiraiBot, NudgeEvent, SingleMessage, decoders};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Ordered log shared between listeners and the test body.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<i64>>>);

impl Recorder {
    fn push(&self, value: i64) {
        self.0.lock().unwrap().push(value);
    }

    fn take(&self) -> Vec<i64> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

struct Harness {
    bot: MiraiBot,
    handler: Arc<dyn FrameHandler>,
    requests: mpsc::UnboundedReceiver<Value>,
}

impl Harness {
    fn start(mode: ExecutionMode) -> Self {
        let (handle, driver) = connection_pair(16);
        let options = SessionOptions::default().mode(mode);
        let session = Session::new(10001, handle, decoders::registry(), options);
        let handler = session.frame_handler();
        let (seen_tx, requests) = mpsc::unbounded_channel();

        let server_handler = Arc::clone(&handler);
        tokio::spawn(async move {
            let next_message_id = AtomicI64::new(1000);
            let (mut outbound, _shutdown) = driver.into_parts();
            while let Some(frame) = outbound.recv().await {
                let request: Value = serde_json::from_slice(&frame.data).unwrap();
                frame.complete(Ok(()));

                let command = request["command"].as_str().unwrap_or_default();
                let data = if command.starts_with("send") {
                    let id = next_message_id.fetch_add(1, Ordering::Relaxed);
                    json!({"code": 0, "msg": "", "messageId": id})
                } else {
                    json!({"code": 0, "msg": ""})
                };
                let response = json!({"syncId": request["syncId"].to_string(), "data": data});
                server_handler
                    .on_frame(&serde_json::to_vec(&response).unwrap())
                    .await;
                let _ = seen_tx.send(request);
            }
        });

        Self {
            bot: MiraiBot::from_session(session),
            handler,
            requests,
        }
    }

    async fn push(&self, data: Value) {
        let frame = json!({"syncId": "-1", "data": data});
        self.handler
            .on_frame(&serde_json::to_vec(&frame).unwrap())
            .await;
    }

    async fn next_request(&mut self) -> Value {
        timeout(Duration::from_secs(1), self.requests.recv())
            .await
            .expect("no request within a second")
            .expect("server stopped")
    }
}

fn group_message(message_id: i64, sender: i64, group: i64, text: &str) -> Value {
    json!({
        "type": "GroupMessage",
        "sender": {
            "id": sender,
            "memberName": "alice",
            "permission": "MEMBER",
            "group": {"id": group, "name": "test", "permission": "MEMBER"}
        },
        "messageChain": [
            {"type": "Source", "id": message_id, "time": 1700000000},
            {"type": "Plain", "text": text}
        ]
    })
}

#[tokio::test]
async fn test_send_group_message_returns_message_id() {
    let mut harness = Harness::start(ExecutionMode::Ordered);

    let id = harness
        .bot
        .send_group_message(456, "hello", None)
        .await
        .unwrap();
    assert_eq!(id, 1000);

    let request = harness.next_request().await;
    assert_eq!(request["syncId"], 1);
    assert_eq!(request["command"], "sendGroupMessage");
    assert_eq!(
        request["content"],
        json!({"target": 456, "messageChain": [{"type": "Plain", "text": "hello"}]})
    );
}

#[tokio::test]
async fn test_listener_replies_to_group_message() {
    let mut harness = Harness::start(ExecutionMode::Ordered);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    let bot = harness.bot.clone();
    harness.bot.listen_group_message(move |message: Arc<GroupMessage>| {
        let bot = bot.clone();
        let done_tx = done_tx.clone();
        async move {
            let reply = MessageChain::new().at(message.sender.id).plain(" pong");
            let sent = bot
                .send_group_message(
                    message.sender.group.id,
                    reply,
                    message.message_chain.message_id(),
                )
                .await;
            let _ = done_tx.send(sent);
            true
        }
    });

    harness.push(group_message(77, 123, 456, "ping")).await;

    let sent = timeout(Duration::from_secs(1), done_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sent.unwrap(), 1000);

    let request = harness.next_request().await;
    assert_eq!(request["command"], "sendGroupMessage");
    assert_eq!(request["content"]["target"], 456);
    assert_eq!(request["content"]["quote"], 77);
    assert_eq!(
        request["content"]["messageChain"],
        json!([{"type": "At", "target": 123}, {"type": "Plain", "text": " pong"}])
    );
}

#[tokio::test]
async fn test_bad_pushes_are_dropped_without_harm() {
    let harness = Harness::start(ExecutionMode::Ordered);
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

    harness.bot.listen_sync(move |message: &GroupMessage| {
        let _ = seen_tx.send(message.message_chain.plain_text());
        true
    });

    harness.push(json!({"type": "Hologram", "depth": 3})).await;
    harness.push(json!({"noType": true})).await;
    harness
        .push(json!({"type": "GroupMessage", "sender": "nobody"}))
        .await;
    harness.handler.on_frame(b"{not json").await;
    harness.push(group_message(1, 2, 3, "survivor")).await;

    let text = timeout(Duration::from_secs(1), seen_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(text, "survivor");
    assert!(seen_rx.try_recv().is_err());

    // The session still serves requests.
    harness.bot.recall(3, 1).await.unwrap();
}

#[tokio::test]
async fn test_bad_segments_keep_the_container() {
    let harness = Harness::start(ExecutionMode::Ordered);
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

    harness.bot.listen_sync(move |message: &GroupMessage| {
        let _ = seen_tx.send(message.message_chain.clone());
        true
    });

    let mut data = group_message(5, 2, 3, "text");
    data["messageChain"]
        .as_array_mut()
        .unwrap()
        .push(json!({"type": "Hologram"}));
    harness.push(data).await;

    let chain = timeout(Duration::from_secs(1), seen_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.as_slice()[1], SingleMessage::plain("text"));
}

async fn delivery_order(mode: ExecutionMode) -> Vec<i64> {
    let harness = Harness::start(mode);
    let recorder = Recorder::default();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    let listener_recorder = recorder.clone();
    harness.bot.listen_group_message(move |message: Arc<GroupMessage>| {
        let recorder = listener_recorder.clone();
        let done_tx = done_tx.clone();
        async move {
            let id = message.message_chain.message_id().unwrap_or_default();
            if id == 1 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            recorder.push(id);
            let _ = done_tx.send(());
            true
        }
    });

    harness.push(group_message(1, 2, 3, "slow")).await;
    harness.push(group_message(2, 2, 3, "fast")).await;

    for _ in 0..2 {
        done_rx.recv().await.unwrap();
    }
    recorder.take()
}

#[tokio::test(start_paused = true)]
async fn test_ordered_mode_serializes_listeners() {
    assert_eq!(delivery_order(ExecutionMode::Ordered).await, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_mode_overlaps_listeners() {
    assert_eq!(delivery_order(ExecutionMode::Concurrent).await, vec![2, 1]);
}

#[tokio::test]
async fn test_short_circuit_and_panic_containment() {
    let harness = Harness::start(ExecutionMode::Ordered);
    let recorder = Recorder::default();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();

    let first = recorder.clone();
    harness.bot.listen_sync(move |event: &NudgeEvent| {
        first.push(event.target);
        if event.target == 1 {
            panic!("listener failure");
        }
        event.target != 2
    });

    let second = recorder.clone();
    harness.bot.listen_sync(move |event: &NudgeEvent| {
        second.push(event.target * 10);
        let _ = done_tx.send(());
        true
    });

    for target in [1, 2, 3] {
        harness
            .push(json!({
                "type": "NudgeEvent",
                "fromId": 9,
                "subject": {"id": 9, "kind": "Friend"},
                "action": "",
                "suffix": "",
                "target": target
            }))
            .await;
    }

    timeout(Duration::from_secs(1), done_rx.recv())
        .await
        .unwrap()
        .unwrap();

    // Target 1 panics in the first listener, target 2 is stopped by it,
    // target 3 reaches both.
    assert_eq!(recorder.take(), vec![1, 2, 3, 30]);
}

#[tokio::test]
async fn test_closed_connection_fails_fast() {
    let harness = Harness::start(ExecutionMode::Ordered);

    harness.handler.on_disconnect("server went away").await;

    assert!(!harness.bot.is_connected());
    assert!(matches!(
        harness.bot.friend_list().await,
        Err(ApiError::NotConnected)
    ));
}
