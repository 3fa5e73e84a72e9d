mod channel;
mod codec;
mod error;
mod notify;

pub use channel::{
    ChannelMessage, ChannelPayload, MessageType, SignalIndexEntry, CHANNEL_MESSAGE_IDENTIFIER,
};
pub use error::WireError;
pub use notify::{
    NotifyMessage, NotifySignalVector, SignalUidValue, NOTIFY_MESSAGE_IDENTIFIER,
};
