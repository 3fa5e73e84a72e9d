use serde::{Deserialize, Serialize};

use crate::codec::{decode_frame, encode_frame};
use crate::WireError;

pub const CHANNEL_MESSAGE_IDENTIFIER: [u8; 4] = *b"SBCH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    ModelRegister,
    ModelReady,
    ModelStart,
    ModelExit,
    SignalIndex,
    SignalRead,
    SignalValue,
    SignalWrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalIndexEntry {
    pub name: String,
    pub signal_uid: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelPayload {
    ModelRegister { notify_uid: u32 },
    Empty,
    SignalIndexRequest { names: Vec<String> },
    SignalIndexReply { indexes: Vec<SignalIndexEntry> },
    SignalReadRequest { names: Vec<String> },
    /// Opaque `[[uids...],[values...]]` msgpack body (`SignalVector::to_msgpack`).
    SignalValueReply { body: Vec<u8> },
    SignalWrite { body: Vec<u8> },
}

/// A channel-scoped control envelope (`"SBCH"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub model_uid: u32,
    pub message_type: MessageType,
    pub token: Option<i32>,
    pub rc: i32,
    pub payload: ChannelPayload,
}

impl ChannelMessage {
    #[must_use]
    pub fn model_register(model_uid: u32, notify_uid: u32, token: i32) -> Self {
        Self {
            model_uid,
            message_type: MessageType::ModelRegister,
            token: Some(token),
            rc: 0,
            payload: ChannelPayload::ModelRegister { notify_uid },
        }
    }

    #[must_use]
    pub fn model_register_ack(model_uid: u32, token: i32) -> Self {
        Self {
            model_uid,
            message_type: MessageType::ModelRegister,
            token: Some(token),
            rc: 0,
            payload: ChannelPayload::Empty,
        }
    }

    #[must_use]
    pub fn model_exit(model_uid: u32) -> Self {
        Self {
            model_uid,
            message_type: MessageType::ModelExit,
            token: None,
            rc: 0,
            payload: ChannelPayload::Empty,
        }
    }

    #[must_use]
    pub fn signal_index_request(model_uid: u32, names: Vec<String>) -> Self {
        Self {
            model_uid,
            message_type: MessageType::SignalIndex,
            token: None,
            rc: 0,
            payload: ChannelPayload::SignalIndexRequest { names },
        }
    }

    #[must_use]
    pub fn signal_index_reply(model_uid: u32, indexes: Vec<SignalIndexEntry>) -> Self {
        Self {
            model_uid,
            message_type: MessageType::SignalIndex,
            token: None,
            rc: 0,
            payload: ChannelPayload::SignalIndexReply { indexes },
        }
    }

    #[must_use]
    pub fn signal_read_request(model_uid: u32, names: Vec<String>) -> Self {
        Self {
            model_uid,
            message_type: MessageType::SignalRead,
            token: None,
            rc: 0,
            payload: ChannelPayload::SignalReadRequest { names },
        }
    }

    #[must_use]
    pub fn signal_value_reply(model_uid: u32, body: Vec<u8>) -> Self {
        Self {
            model_uid,
            message_type: MessageType::SignalValue,
            token: None,
            rc: 0,
            payload: ChannelPayload::SignalValueReply { body },
        }
    }

    #[must_use]
    pub fn is_ack(&self) -> bool {
        self.token.is_some()
    }

    pub fn encode(&self, max_frame_bytes: usize) -> Result<Vec<u8>, WireError> {
        encode_frame(CHANNEL_MESSAGE_IDENTIFIER, self, max_frame_bytes)
    }

    pub fn decode(frame: &[u8], max_frame_bytes: usize) -> Result<Self, WireError> {
        decode_frame(CHANNEL_MESSAGE_IDENTIFIER, frame, max_frame_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelMessage, ChannelPayload, MessageType, SignalIndexEntry};

    #[test]
    fn round_trips_model_register() {
        let msg = ChannelMessage::model_register(42, 99, 1);
        let encoded = msg.encode(64 * 1024).expect("encode should succeed");
        let decoded = ChannelMessage::decode(&encoded, 64 * 1024).expect("decode should succeed");
        assert_eq!(decoded, msg);
        assert!(decoded.is_ack());
    }

    #[test]
    fn round_trips_signal_index_reply() {
        let msg = ChannelMessage::signal_index_reply(
            42,
            vec![
                SignalIndexEntry {
                    name: "one".to_string(),
                    signal_uid: 123,
                },
                SignalIndexEntry {
                    name: "two".to_string(),
                    signal_uid: 456,
                },
            ],
        );
        let encoded = msg.encode(64 * 1024).expect("encode should succeed");
        let decoded = ChannelMessage::decode(&encoded, 64 * 1024).expect("decode should succeed");
        assert_eq!(decoded.message_type, MessageType::SignalIndex);
        match decoded.payload {
            ChannelPayload::SignalIndexReply { indexes } => assert_eq!(indexes.len(), 2),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_mismatched_identifier() {
        let notify_shaped = gwcore_net::pack_identified_frame(*b"SBNO", b"junk", 1024)
            .expect("pack should succeed");
        let error = ChannelMessage::decode(&notify_shaped, 1024)
            .expect_err("identifier mismatch should fail decode");
        assert!(matches!(
            error,
            crate::WireError::Framing(gwcore_net::IdentifiedFrameError::IdentifierMismatch { .. })
        ));
    }
}
