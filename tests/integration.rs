//! End-to-end tests against in-process mock chat services
//!
//! Each test binds an ephemeral port, runs a scripted service behavior on
//! it, and drives the harness against that endpoint.

use std::future::Future;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

use chatprobe::scenario::{
    run_scenario, run_steps, summarize, ExpectedOutcome, ReportSink, RunOptions, RunOverrides,
    ScenarioStep, StepExpectation, StepRecord,
};
use chatprobe::session::{collect_reply, AggregatorOptions, ChatSession, StepOutcome};
use chatprobe::Error;

type ServiceSocket = WebSocketStream<TcpStream>;

/// Bind an ephemeral port and serve exactly one connection with the
/// given behavior
async fn spawn_service<F, Fut>(behavior: F) -> (String, JoinHandle<()>)
where
    F: FnOnce(ServiceSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("resolve listener addr");

    let handle = tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(socket) = accept_async(stream).await {
                behavior(socket).await;
            }
        }
    });

    (format!("ws://{addr}/chat"), handle)
}

async fn send_json(socket: &mut ServiceSocket, value: Value) {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .expect("send frame");
}

fn ack(session_id: &str) -> Value {
    json!({ "type": "connection", "sessionId": session_id, "message": "welcome" })
}

/// Read frames until the next user_message arrives
async fn next_user_message(socket: &mut ServiceSocket) -> Value {
    while let Some(frame) = socket.next().await {
        let Ok(Message::Text(text)) = frame else {
            continue;
        };
        let value: Value = serde_json::from_str(text.as_str()).expect("client frames are JSON");
        if value.get("type").and_then(Value::as_str) == Some("user_message") {
            return value;
        }
    }
    panic!("client closed before sending a user_message");
}

/// Answer up to `questions` exchanges: typing, then a canned answer for
/// CircularSync questions and a decline for everything else
async fn canned_qa_service(mut socket: ServiceSocket, questions: usize) {
    send_json(&mut socket, ack("qa-session")).await;

    for _ in 0..questions {
        let message = next_user_message(&mut socket).await;
        let content = message["content"].as_str().unwrap_or("").to_lowercase();

        send_json(&mut socket, json!({ "type": "typing" })).await;

        let reply = if content.contains("circularsync") {
            json!({
                "type": "bot_response",
                "content": "CircularSync is a circular economy marketplace.",
                "suggestions": ["What are your fees?"],
                "intent": { "category": "platform_info", "confidence": 0.92 },
                "metadata": { "processingTime": 8, "dataSources": ["knowledge_base"] }
            })
        } else {
            json!({ "type": "error", "message": "Out of scope" })
        };
        send_json(&mut socket, reply).await;
    }

    // keep the socket open until the client is done reading
    tokio::time::sleep(Duration::from_millis(500)).await;
}

fn fast_aggregator() -> AggregatorOptions {
    AggregatorOptions {
        receive_timeout: Duration::from_millis(200),
        max_messages: 10,
    }
}

fn fast_run_options() -> RunOptions {
    RunOptions {
        user_id: "probe-test".to_string(),
        aggregator: fast_aggregator(),
        inter_step_delay: Duration::from_millis(10),
    }
}

fn plain_step(label: &str, question: &str) -> ScenarioStep {
    ScenarioStep {
        label: label.to_string(),
        question: question.to_string(),
        expect: None,
    }
}

struct SilentReport;

impl ReportSink for SilentReport {
    fn record(&mut self, _record: &StepRecord) {}
}

// ============== Tests ==============

#[tokio::test]
async fn test_typing_then_answer_counts_progress() {
    // The service verifies the session/user stamping and only answers when
    // the outbound envelope carries both, so a wrong stamp shows up as a
    // Declined outcome below.
    let (endpoint, handle) = spawn_service(|mut socket| async move {
        send_json(&mut socket, ack("s1")).await;
        let message = next_user_message(&mut socket).await;
        let stamped = message["sessionId"] == "s1" && message["userId"] == "probe-test";

        send_json(&mut socket, json!({ "type": "typing" })).await;
        let reply = if stamped {
            json!({ "type": "bot_response", "content": "stamped" })
        } else {
            json!({ "type": "error", "message": "missing session stamp" })
        };
        send_json(&mut socket, reply).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
    })
    .await;

    let mut session = ChatSession::connect(&endpoint, Duration::from_secs(2))
        .await
        .expect("connect");
    assert_eq!(session.session_id(), "s1");
    assert_eq!(session.greeting(), "welcome");

    session
        .ask("What is CircularSync?", "probe-test")
        .await
        .expect("send question");
    let reply = collect_reply(&mut session, &fast_aggregator())
        .await
        .expect("collect reply");

    assert_eq!(reply.progress_signals, 1);
    match reply.outcome {
        StepOutcome::Answered(answer) => assert_eq!(answer.content, "stamped"),
        other => panic!("Expected Answered, got {other:?}"),
    }

    session.close().await;
    handle.abort();
}

#[tokio::test]
async fn test_immediate_decline_has_no_progress() {
    let (endpoint, handle) = spawn_service(|mut socket| async move {
        send_json(&mut socket, ack("s1")).await;
        next_user_message(&mut socket).await;
        send_json(&mut socket, json!({ "type": "error", "message": "nope" })).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
    })
    .await;

    let mut session = ChatSession::connect(&endpoint, Duration::from_secs(2))
        .await
        .expect("connect");
    session.ask("Tell me a joke", "probe-test").await.expect("send");
    let reply = collect_reply(&mut session, &fast_aggregator())
        .await
        .expect("collect reply");

    assert_eq!(reply.progress_signals, 0);
    match reply.outcome {
        StepOutcome::Declined(decline) => assert_eq!(decline.message, "nope"),
        other => panic!("Expected Declined, got {other:?}"),
    }

    session.close().await;
    handle.abort();
}

#[tokio::test]
async fn test_all_typing_times_out_with_progress_count() {
    let (endpoint, handle) = spawn_service(|mut socket| async move {
        send_json(&mut socket, ack("s1")).await;
        next_user_message(&mut socket).await;
        for _ in 0..3 {
            send_json(&mut socket, json!({ "type": "typing" })).await;
        }
        // never send a terminal envelope
        tokio::time::sleep(Duration::from_secs(3)).await;
    })
    .await;

    let mut session = ChatSession::connect(&endpoint, Duration::from_secs(2))
        .await
        .expect("connect");
    session.ask("Anyone there?", "probe-test").await.expect("send");
    let reply = collect_reply(&mut session, &fast_aggregator())
        .await
        .expect("collect reply");

    assert_eq!(reply.outcome, StepOutcome::TimedOut);
    assert_eq!(reply.progress_signals, 3);

    session.close().await;
    handle.abort();
}

#[tokio::test]
async fn test_unrelated_envelopes_exhaust_budget() {
    let (endpoint, handle) = spawn_service(|mut socket| async move {
        send_json(&mut socket, ack("s1")).await;
        next_user_message(&mut socket).await;
        for _ in 0..3 {
            send_json(&mut socket, json!({ "type": "debug_stats", "cacheHits": 7 })).await;
        }
        tokio::time::sleep(Duration::from_secs(3)).await;
    })
    .await;

    let mut session = ChatSession::connect(&endpoint, Duration::from_secs(2))
        .await
        .expect("connect");
    session.ask("Anyone there?", "probe-test").await.expect("send");

    let options = AggregatorOptions {
        receive_timeout: Duration::from_secs(2),
        max_messages: 3,
    };
    let started = Instant::now();
    let reply = collect_reply(&mut session, &options)
        .await
        .expect("collect reply");

    assert_eq!(reply.outcome, StepOutcome::TimedOut);
    assert_eq!(reply.progress_signals, 0);
    // budget exhaustion, not the receive timeout, ended the wait
    assert!(started.elapsed() < Duration::from_secs(1));

    session.close().await;
    handle.abort();
}

#[tokio::test]
async fn test_unknown_and_malformed_envelopes_do_not_abort() {
    let (endpoint, handle) = spawn_service(|mut socket| async move {
        send_json(&mut socket, ack("s1")).await;
        next_user_message(&mut socket).await;
        send_json(&mut socket, json!({ "type": "debug_stats" })).await;
        socket
            .send(Message::Text("not json at all".into()))
            .await
            .expect("send garbage");
        send_json(&mut socket, json!({ "type": "typing" })).await;
        send_json(&mut socket, json!({ "type": "bot_response", "content": "late" })).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
    })
    .await;

    let mut session = ChatSession::connect(&endpoint, Duration::from_secs(2))
        .await
        .expect("connect");
    session.ask("Still there?", "probe-test").await.expect("send");
    let reply = collect_reply(&mut session, &fast_aggregator())
        .await
        .expect("collect reply");

    assert_eq!(reply.progress_signals, 1);
    match reply.outcome {
        StepOutcome::Answered(answer) => assert_eq!(answer.content, "late"),
        other => panic!("Expected Answered, got {other:?}"),
    }

    session.close().await;
    handle.abort();
}

#[tokio::test]
async fn test_scripted_run_answers_then_declines() {
    let (endpoint, handle) = spawn_service(|socket| canned_qa_service(socket, 2)).await;

    let steps = vec![
        ScenarioStep {
            label: "platform info".to_string(),
            question: "What is CircularSync?".to_string(),
            expect: Some(StepExpectation {
                outcome: Some(ExpectedOutcome::Answered),
                content_contains: Some("CircularSync".to_string()),
                category: Some("platform_info".to_string()),
                min_typing: Some(1),
                ..Default::default()
            }),
        },
        ScenarioStep {
            label: "out of scope".to_string(),
            question: "What is the weather today?".to_string(),
            expect: Some(StepExpectation {
                outcome: Some(ExpectedOutcome::Declined),
                ..Default::default()
            }),
        },
    ];

    let mut session = ChatSession::connect(&endpoint, Duration::from_secs(2))
        .await
        .expect("connect");
    let (records, fatal) =
        run_steps(&mut session, &steps, &fast_run_options(), &mut SilentReport).await;
    session.close().await;

    assert!(fatal.is_none(), "unexpected fatal error: {fatal:?}");
    assert_eq!(records.len(), steps.len());
    assert!(matches!(records[0].reply.outcome, StepOutcome::Answered(_)));
    assert!(matches!(records[1].reply.outcome, StepOutcome::Declined(_)));
    assert!(records.iter().all(StepRecord::passed));

    let summary = summarize(&records);
    assert_eq!(summary.answered, 1);
    assert_eq!(summary.declined, 1);
    assert_eq!(summary.timed_out, 0);
    assert_eq!(summary.failed, 0);

    handle.abort();
}

#[tokio::test]
async fn test_channel_close_truncates_run() {
    let (endpoint, handle) = spawn_service(|mut socket| async move {
        send_json(&mut socket, ack("s1")).await;
        next_user_message(&mut socket).await;
        send_json(&mut socket, json!({ "type": "bot_response", "content": "first" })).await;
        // the service goes away before the second exchange completes
        next_user_message(&mut socket).await;
        socket.close(None).await.ok();
    })
    .await;

    let steps = vec![
        plain_step("first", "hello"),
        plain_step("second", "anyone?"),
        plain_step("third", "never sent"),
    ];

    let mut session = ChatSession::connect(&endpoint, Duration::from_secs(2))
        .await
        .expect("connect");
    let (records, fatal) =
        run_steps(&mut session, &steps, &fast_run_options(), &mut SilentReport).await;

    assert_eq!(records.len(), 1);
    assert!(
        matches!(fatal, Some(Error::ChannelClosed) | Some(Error::SendFailed(_))),
        "expected a connection-level fault, got {fatal:?}"
    );

    handle.abort();
}

#[tokio::test]
async fn test_connect_timeout_on_mute_service() {
    // Accepts the websocket but never acknowledges the session
    let (endpoint, handle) = spawn_service(|socket| async move {
        let _socket = socket;
        tokio::time::sleep(Duration::from_secs(5)).await;
    })
    .await;

    let started = Instant::now();
    let result = ChatSession::connect(&endpoint, Duration::from_millis(300)).await;

    assert!(matches!(result, Err(Error::ConnectTimeout(_))));
    assert!(started.elapsed() < Duration::from_secs(2));

    handle.abort();
}

#[tokio::test]
async fn test_transport_unavailable_on_refused_connection() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("resolve listener addr");
    drop(listener);

    let result =
        ChatSession::connect(&format!("ws://{addr}/chat"), Duration::from_secs(2)).await;
    assert!(matches!(result, Err(Error::TransportUnavailable { .. })));
}

#[tokio::test]
async fn test_run_scenario_from_file() {
    let (endpoint, handle) = spawn_service(|socket| canned_qa_service(socket, 2)).await;

    let scenario_yaml = format!(
        r#"
name: file smoke
endpoint: {endpoint}
steps:
  - label: platform info
    question: What is CircularSync?
    expect:
      outcome: answered
      content_contains: CircularSync
  - label: out of scope
    question: What is the weather today?
    expect:
      outcome: declined
"#
    );

    let dir = std::env::temp_dir().join("chatprobe-tests");
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("file_smoke.yaml");
    std::fs::write(&path, scenario_yaml).expect("write scenario");

    let overrides = RunOverrides {
        receive_timeout_secs: Some(2),
        ..Default::default()
    };
    let report = run_scenario(&path, &overrides, false).await.expect("run");

    assert!(report.passed(), "report: {report:?}");
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.summary.answered, 1);
    assert_eq!(report.summary.declined, 1);

    handle.abort();
}
