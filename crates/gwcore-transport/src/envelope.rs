use serde::{Deserialize, Serialize};

use crate::TransportError;

/// Frame-kind tag carried by every transport envelope. Mirrors the wire
/// codec's own file identifiers (`gwcore_wire::CHANNEL_MESSAGE_IDENTIFIER` /
/// `NOTIFY_MESSAGE_IDENTIFIER`) one layer up, so a transport implementation
/// can route without decoding the message payload it carries.
pub const CHANNEL_TAG: &str = "SBCH";
pub const NOTIFY_TAG: &str = "SBNO";

/// The small self-describing envelope every reference transport frame is
/// wrapped in: a tag, the channel it targets (empty for a broadcast notify),
/// and the raw message bytes produced by the message codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerEnvelope {
    pub tag: String,
    pub channel: String,
    pub bytes: Vec<u8>,
}

impl BrokerEnvelope {
    #[must_use]
    pub fn channel_scoped(channel: &str, bytes: Vec<u8>) -> Self {
        Self {
            tag: CHANNEL_TAG.to_string(),
            channel: channel.to_string(),
            bytes,
        }
    }

    #[must_use]
    pub fn notify(bytes: Vec<u8>) -> Self {
        Self {
            tag: NOTIFY_TAG.to_string(),
            channel: String::new(),
            bytes,
        }
    }

    #[must_use]
    pub fn for_channel(channel: &str, bytes: Vec<u8>) -> Self {
        if channel.is_empty() {
            Self::notify(bytes)
        } else {
            Self::channel_scoped(channel, bytes)
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, TransportError> {
        rmp_serde::to_vec_named(self).map_err(TransportError::from)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, TransportError> {
        let envelope: Self = rmp_serde::from_slice(buf).map_err(TransportError::from)?;
        if envelope.tag != CHANNEL_TAG && envelope.tag != NOTIFY_TAG {
            return Err(TransportError::IncompleteResponse {
                reason: format!("unrecognised envelope tag {:?}", envelope.tag),
            });
        }
        Ok(envelope)
    }
}
