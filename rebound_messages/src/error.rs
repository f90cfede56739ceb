use alloc::string::String;

/// A frame received from the transport could not be turned into a message.
#[derive(thiserror::Error, Debug)]
pub enum MessageError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unknown opcode {0:?}")]
    UnknownOpcode(String),
    #[error("missing field `{field}` in message with opcode {opcode}")]
    MissingField {
        field: &'static str,
        opcode: &'static str,
    },
    #[error("invalid vector component `{component}`: {value:?}")]
    InvalidVector {
        component: &'static str,
        value: String,
    },
    #[error("invalid timestamp {0}")]
    InvalidTimestamp(i64),
    #[error("invalid sequence number {0}")]
    InvalidSequence(i64),
    #[error("invalid player slot {0:?}")]
    InvalidPlayer(String),
}
