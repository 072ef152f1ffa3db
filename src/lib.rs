//! chatprobe - a scenario-driven conformance harness for session-oriented
//! chat WebSocket services
//!
//! The harness opens one session, submits a scripted sequence of questions
//! and interprets the asynchronous multi-envelope reply stream for each:
//! typing indicators are progress, a `bot_response` or `error` envelope is
//! terminal, and silence within the receive budget is a timeout.

pub mod cli;
pub mod commands;
pub mod common;
pub mod scenario;
pub mod session;
pub mod wire;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use session::{ChatSession, StepOutcome, TransportState};
