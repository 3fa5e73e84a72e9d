use thiserror::Error;

pub mod prelude {
    pub use gwcore_engine::{Gateway, GatewayConfig, GatewayError, SyncOutcome};
    pub use gwcore_io::{IoError, MessageEnvelope, MessageSink, MessageSource, ObservedTime};
    pub use gwcore_limits::{Limits, LimitsError};
    pub use gwcore_ncodec::{
        BusKind, CanCodec, CanMessage, MimeSpec, NCodecError, PduCodec, PduMessage,
    };
    pub use gwcore_signal::{AnySignalVector, BinaryVector, ScalarVector, SignalError, SignalValue};
    pub use gwcore_transport::{
        ListBroker, ListBrokerTransport, StubTransport, Transport, TransportConfig, TransportError,
    };
    pub use gwcore_wire::{ChannelMessage, NotifyMessage, WireError};
}

pub type Result<T> = std::result::Result<T, GatewayCoreError>;

/// Unified error surface composing every boundary crate's error type. A
/// caller driving the full stack through this facade only ever needs to
/// match on `GatewayCoreError`; a caller depending directly on one boundary
/// crate keeps that crate's narrower error type.
#[derive(Debug, Error)]
pub enum GatewayCoreError {
    #[error(transparent)]
    Limits(#[from] gwcore_limits::LimitsError),
    #[error(transparent)]
    Io(#[from] gwcore_io::IoError),
    #[error(transparent)]
    Net(#[from] gwcore_net::IdentifiedFrameError),
    #[error(transparent)]
    Signal(#[from] gwcore_signal::SignalError),
    #[error(transparent)]
    Wire(#[from] gwcore_wire::WireError),
    #[error(transparent)]
    Ncodec(#[from] gwcore_ncodec::NCodecError),
    #[error(transparent)]
    Transport(#[from] gwcore_transport::TransportError),
    #[error(transparent)]
    Gateway(#[from] gwcore_engine::GatewayError),
}
