//! Transport session and reply aggregation

pub mod aggregator;
pub mod transport;

pub use aggregator::{collect_reply, AggregatorOptions, StepOutcome, StepReply};
pub use transport::{ChatSession, TransportState};
