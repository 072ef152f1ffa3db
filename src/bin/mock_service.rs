//! Mock chat service binary for integration testing
//!
//! This binary implements a minimal stand-in for the conversational
//! service so the harness can be exercised without the real backend. It
//! answers questions matching a tiny canned knowledge base and declines
//! everything else with an `error` envelope.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};

#[tokio::main]
async fn main() {
    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(8083);

    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .unwrap_or_else(|e| panic!("Failed to bind 127.0.0.1:{port}: {e}"));

    eprintln!("mock service listening on ws://127.0.0.1:{port}/chat");

    let mut next_session = 1u64;
    loop {
        let (stream, _) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                eprintln!("accept failed: {e}");
                continue;
            }
        };

        let session_id = format!("mock-session-{next_session}");
        next_session += 1;
        tokio::spawn(serve_connection(stream, session_id));
    }
}

async fn serve_connection(stream: TcpStream, session_id: String) {
    let mut socket = match accept_async(stream).await {
        Ok(socket) => socket,
        Err(e) => {
            eprintln!("websocket handshake failed: {e}");
            return;
        }
    };

    let ack = json!({
        "type": "connection",
        "sessionId": session_id,
        "message": "Welcome! Ask me about the marketplace."
    });
    if send_json(&mut socket, &ack).await.is_err() {
        return;
    }

    while let Some(Ok(frame)) = socket.next().await {
        let Message::Text(text) = frame else { continue };
        let Ok(message) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        if message.get("type").and_then(Value::as_str) != Some("user_message") {
            continue;
        }

        let question = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();

        if send_json(&mut socket, &json!({ "type": "typing" })).await.is_err() {
            return;
        }
        if send_json(&mut socket, &answer(&question)).await.is_err() {
            return;
        }
    }
}

async fn send_json(
    socket: &mut tokio_tungstenite::WebSocketStream<TcpStream>,
    value: &Value,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    socket.send(Message::Text(value.to_string().into())).await
}

fn answer(question: &str) -> Value {
    // One entry per topic family; lowercase matching doubles as the
    // typo tolerance the real service gets from fuzzy matching
    const TOPICS: &[(&str, &str, &str)] = &[
        (
            "circularsync",
            "CircularSync is a circular economy marketplace connecting waste suppliers with recyclers.",
            "platform_info",
        ),
        (
            "waste",
            "We accept plastic, metal, paper, textile and organic waste streams.",
            "waste_types",
        ),
        (
            "fee",
            "Listing is free; a 2% transaction fee applies to completed auctions.",
            "pricing",
        ),
        (
            "register",
            "Suppliers register through the portal and pass a short verification step.",
            "registration",
        ),
        (
            "quality",
            "Quality assessment grades each lot on purity, moisture and contamination.",
            "quality_process",
        ),
        (
            "auction",
            "Lots are auctioned in timed rounds; the highest verified bid wins.",
            "auctions",
        ),
        (
            "feature",
            "Live auctions, quality grading, logistics matching and impact reporting.",
            "platform_info",
        ),
        (
            "work",
            "Suppliers list lots, buyers bid, and logistics partners handle collection.",
            "platform_info",
        ),
    ];

    for (needle, content, category) in TOPICS {
        if question.contains(needle) {
            return json!({
                "type": "bot_response",
                "content": content,
                "suggestions": [
                    "What waste types do you accept?",
                    "What are your fees?"
                ],
                "intent": { "category": category, "confidence": 0.92 },
                "metadata": { "processingTime": 12, "dataSources": ["knowledge_base"] }
            });
        }
    }

    json!({
        "type": "error",
        "message": "I can only answer questions about the marketplace."
    })
}
