mod can;
mod error;
mod mimetype;
mod pdu;
mod trace;

pub use can::{CanCodec, CanFrameType, CanMessage, CanSender};
pub use error::NCodecError;
pub use mimetype::{BusKind, MimeSpec};
pub use pdu::{
    CanFrameType as PduCanFrameType, CanMessageFormat, CanMessageMetadata, DoIpAdapter, IpAddr,
    IpMessageMetadata, PduCodec, PduMessage, PduTransport, SocketAdapter, SomeIpAdapter,
};
pub use trace::{IdFilter, TraceDirection, TraceHook};
