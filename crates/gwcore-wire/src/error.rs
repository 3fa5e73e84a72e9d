use gwcore_net::IdentifiedFrameError;
use gwcore_signal::SignalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to encode wire message: {0}")]
    Encode(#[source] rmp_serde::encode::Error),

    #[error("failed to decode wire message: {0}")]
    Decode(#[source] rmp_serde::decode::Error),

    #[error(transparent)]
    Framing(#[from] IdentifiedFrameError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}
