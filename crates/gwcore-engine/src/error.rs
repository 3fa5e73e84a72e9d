use gwcore_signal::SignalError;
use gwcore_transport::TransportError;
use gwcore_wire::WireError;
use thiserror::Error;

/// Configuration/transport/timeout errors are fatal to the operation in
/// progress; protocol decode failures inside a passive wait loop are logged
/// and skipped rather than surfaced here.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway config error: {reason}")]
    GatewayConfig { reason: String },

    #[error("no transport connection configured")]
    ModelNoConnection,

    #[error("failed to connect to transport: {0}")]
    ModelConnectFail(#[source] TransportError),

    #[error("channel wait failed: {reason}")]
    ModelChannelWait { reason: String },

    #[error("gateway behind simulation: external_time ({external_time}) < model_time ({model_time})")]
    GatewayBehind { external_time: f64, model_time: f64 },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}
