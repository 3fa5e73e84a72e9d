use rmpv::Value;

use crate::SignalError;

/// A signal's storage kind. Scalars overwrite-on-change; binaries append.
///
/// The Gateway's two vector maps hold tagged `ScalarVector`/`BinaryVector`
/// instances rather than one container generic over an enum of values — the
/// two kinds diverge enough in reset/merge semantics that per-kind methods
/// read better than a match arm on every call.
pub trait SignalValue: Clone + PartialEq + Send + Sync + 'static {
    /// The value a freshly-added or `Reset` signal holds.
    fn empty() -> Self;

    /// Merge an incoming value into `current`, returning whether the vector's
    /// `changed`/`updated` delta should record this position.
    fn apply(current: &mut Self, incoming: Self) -> bool;

    fn to_msgpack_value(&self) -> Value;

    fn from_msgpack_value(value: &Value) -> Result<Self, SignalError>;
}

impl SignalValue for f64 {
    fn empty() -> Self {
        0.0
    }

    fn apply(current: &mut Self, incoming: Self) -> bool {
        if *current == incoming {
            false
        } else {
            *current = incoming;
            true
        }
    }

    fn to_msgpack_value(&self) -> Value {
        Value::F64(*self)
    }

    fn from_msgpack_value(value: &Value) -> Result<Self, SignalError> {
        value
            .as_f64()
            .ok_or_else(|| SignalError::MsgpackMalformed {
                reason: format!("expected a float64 scalar value, got {value}"),
            })
    }
}

impl SignalValue for Vec<u8> {
    fn empty() -> Self {
        Vec::new()
    }

    fn apply(current: &mut Self, incoming: Self) -> bool {
        let appended = !incoming.is_empty();
        current.extend_from_slice(&incoming);
        appended
    }

    fn to_msgpack_value(&self) -> Value {
        Value::Binary(self.clone())
    }

    fn from_msgpack_value(value: &Value) -> Result<Self, SignalError> {
        value
            .as_slice()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| SignalError::MsgpackMalformed {
                reason: format!("expected a binary value, got {value}"),
            })
    }
}
