//! Wire protocol: envelope types and JSON codec

pub mod codec;
pub mod types;

pub use types::{
    BotResponsePayload, ConnectedPayload, Envelope, ErrorPayload, Intent, ResponseMetadata,
    UserMessagePayload,
};
