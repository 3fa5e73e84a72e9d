use serde::{Deserialize, Serialize};

use crate::codec::{decode_frame, encode_frame};
use crate::WireError;

pub const NOTIFY_MESSAGE_IDENTIFIER: [u8; 4] = *b"SBNO";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalUidValue {
    pub uid: u32,
    pub value: f64,
}

/// One vector's delta within a notify. `signal` carries scalar uid/value
/// pairs directly; `data` carries a binary vector's opaque `to_msgpack`
/// payload. A given entry populates exactly one of the two, mirroring which
/// side of the Gateway's scalar/binary vector maps it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifySignalVector {
    pub name: String,
    pub model_uid: u32,
    pub signal: Vec<SignalUidValue>,
    pub data: Option<Vec<u8>>,
}

impl NotifySignalVector {
    #[must_use]
    pub fn scalar(name: &str, model_uid: u32, signal: Vec<SignalUidValue>) -> Self {
        Self {
            name: name.to_string(),
            model_uid,
            signal,
            data: None,
        }
    }

    #[must_use]
    pub fn binary(name: &str, model_uid: u32, body: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            model_uid,
            signal: Vec::new(),
            data: Some(body),
        }
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.data.is_some()
    }
}

/// A broadcast notify envelope (`"SBNO"`), sent with channel `""`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyMessage {
    pub model_uid: Vec<u32>,
    pub model_time: f64,
    pub schedule_time: f64,
    pub notify_time: f64,
    pub signals: Vec<NotifySignalVector>,
}

impl NotifyMessage {
    #[must_use]
    pub fn addressed_to(&self, uid: u32) -> bool {
        self.model_uid.contains(&uid)
    }

    pub fn encode(&self, max_frame_bytes: usize) -> Result<Vec<u8>, WireError> {
        encode_frame(NOTIFY_MESSAGE_IDENTIFIER, self, max_frame_bytes)
    }

    pub fn decode(frame: &[u8], max_frame_bytes: usize) -> Result<Self, WireError> {
        decode_frame(NOTIFY_MESSAGE_IDENTIFIER, frame, max_frame_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::{NotifyMessage, NotifySignalVector, SignalUidValue};

    #[test]
    fn round_trips_scalar_and_binary_deltas() {
        let msg = NotifyMessage {
            model_uid: vec![42],
            model_time: 0.0005,
            schedule_time: 0.0005,
            notify_time: 0.0005,
            signals: vec![
                NotifySignalVector {
                    name: "scalar".to_string(),
                    model_uid: 42,
                    signal: vec![SignalUidValue { uid: 123, value: 1.1 }],
                    data: None,
                },
                NotifySignalVector::binary("binary", 42, vec![0xAB, 0xCD]),
            ],
        };

        let encoded = msg.encode(64 * 1024).expect("encode should succeed");
        let decoded = NotifyMessage::decode(&encoded, 64 * 1024).expect("decode should succeed");
        assert_eq!(decoded, msg);
        assert!(!decoded.signals[0].is_binary());
        assert!(decoded.signals[1].is_binary());
    }

    #[test]
    fn addressed_to_matches_model_uid_list() {
        let msg = NotifyMessage {
            model_uid: vec![99],
            model_time: 0.0,
            schedule_time: 0.0,
            notify_time: 0.0,
            signals: vec![],
        };
        assert!(!msg.addressed_to(42));
        assert!(msg.addressed_to(99));
    }
}
