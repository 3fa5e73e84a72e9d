use gwcore_net::IdentifiedFrameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NCodecError {
    #[error("MIME type string is empty")]
    MimeEmpty,

    #[error("missing required MIME parameter {key:?}")]
    MimeMissingRequired { key: &'static str },

    #[error("unsupported value {value:?} for MIME parameter {key:?}")]
    MimeUnsupportedValue { key: &'static str, value: String },

    #[error("unexpected MIME parameter {key:?}")]
    MimeUnexpectedParameter { key: String },

    #[error("no CAN message provided")]
    NoCanMessageProvided,

    #[error("no PDU message provided")]
    NoPduMessageProvided,

    #[error("failed to encode codec stream: {0}")]
    Encode(#[source] rmp_serde::encode::Error),

    #[error("failed to decode codec stream: {0}")]
    Decode(#[source] rmp_serde::decode::Error),

    #[error(transparent)]
    Framing(#[from] IdentifiedFrameError),
}
