//! Reply aggregation for one scenario step
//!
//! After a question is sent the service pushes a variable-length stream:
//! any number of typing indicators, possibly envelopes we cannot classify,
//! and eventually one terminal envelope (answer or decline). The aggregator
//! reduces that stream to a single [`StepReply`] under two bounds: a budget
//! of receive attempts and a per-receive timeout.

use std::time::Duration;

use crate::common::{Error, Result};
use crate::wire::{BotResponsePayload, Envelope, ErrorPayload};

use super::transport::ChatSession;

/// Bounds for one step's wait
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Timeout for each receive attempt, re-armed per attempt
    pub receive_timeout: Duration,
    /// Receive attempts before the step is abandoned as timed out
    pub max_messages: u32,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            receive_timeout: Duration::from_secs(5),
            max_messages: 10,
        }
    }
}

/// Terminal classification of one step's exchange
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The service answered
    Answered(BotResponsePayload),
    /// The service explicitly declined, a valid outcome for
    /// out-of-domain questions
    Declined(ErrorPayload),
    /// No terminal envelope arrived within the budget
    TimedOut,
}

impl StepOutcome {
    /// Short name used in reports and summaries
    pub fn name(&self) -> &'static str {
        match self {
            StepOutcome::Answered(_) => "answered",
            StepOutcome::Declined(_) => "declined",
            StepOutcome::TimedOut => "timed_out",
        }
    }
}

/// Everything observed for one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepReply {
    pub outcome: StepOutcome,
    /// Typing indicators seen before the terminal envelope
    pub progress_signals: u32,
}

/// Consume inbound envelopes after a send and reduce them to one reply
///
/// Typing indicators count as progress, not against the budget: a verbose
/// service may emit several before answering. A receive timeout is a normal
/// step outcome, not an error; only connection-level faults propagate.
pub async fn collect_reply(
    session: &mut ChatSession,
    options: &AggregatorOptions,
) -> Result<StepReply> {
    let mut progress_signals = 0u32;
    let mut budget = options.max_messages;

    while budget > 0 {
        match session.receive(options.receive_timeout).await {
            Ok(Envelope::Typing) => {
                progress_signals += 1;
            }
            Ok(Envelope::BotResponse(payload)) => {
                return Ok(StepReply {
                    outcome: StepOutcome::Answered(payload),
                    progress_signals,
                });
            }
            Ok(Envelope::Error(payload)) => {
                return Ok(StepReply {
                    outcome: StepOutcome::Declined(payload),
                    progress_signals,
                });
            }
            Ok(other) => {
                tracing::debug!(kind = other.kind(), "unrelated envelope while waiting for reply");
                budget -= 1;
            }
            Err(Error::ReceiveTimeout(_)) => {
                return Ok(StepReply {
                    outcome: StepOutcome::TimedOut,
                    progress_signals,
                });
            }
            Err(Error::MalformedEnvelope(detail)) => {
                tracing::warn!(%detail, "skipping malformed envelope");
                budget -= 1;
            }
            Err(Error::UnknownKind(detail)) => {
                tracing::warn!(%detail, "skipping envelope without a kind");
                budget -= 1;
            }
            Err(fatal) => return Err(fatal),
        }
    }

    Ok(StepReply {
        outcome: StepOutcome::TimedOut,
        progress_signals,
    })
}
