use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport misconfigured: {reason}")]
    Configuration { reason: String },

    #[error("no message available after waiting {waited:?}")]
    Timeout { waited: Duration },

    #[error("transport is not connected")]
    NotConnected,

    #[error("transport already disconnected")]
    Closed,

    #[error("received an incomplete or malformed envelope: {reason}")]
    IncompleteResponse { reason: String },

    #[error("broker envelope encode failure: {0}")]
    EnvelopeEncode(#[source] rmp_serde::encode::Error),

    #[error("broker envelope decode failure: {0}")]
    EnvelopeDecode(#[source] rmp_serde::decode::Error),
}

impl From<rmp_serde::encode::Error> for TransportError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::EnvelopeEncode(err)
    }
}

impl From<rmp_serde::decode::Error> for TransportError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::EnvelopeDecode(err)
    }
}
