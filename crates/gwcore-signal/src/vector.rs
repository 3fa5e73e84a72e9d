use std::collections::{BTreeSet, HashMap};

use gwcore_limits::Limits;
use rmpv::Value;

use crate::{SignalError, SignalValue};

/// A single named, uid-addressed slot inside a `SignalVector`.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal<V> {
    pub name: String,
    pub uid: u32,
    pub value: V,
}

/// An ordered table of same-kind signals sharing a channel.
///
/// Two inverted indices (`name -> position`, `uid -> position`) are kept
/// consistent with the backing `Vec`; `changed` and `updated` record positions
/// touched since the last clear.
#[derive(Debug, Clone)]
pub struct SignalVector<V> {
    signals: Vec<Signal<V>>,
    name_index: HashMap<String, usize>,
    uid_index: HashMap<u32, usize>,
    changed: BTreeSet<usize>,
    updated: BTreeSet<usize>,
    max_signals: usize,
}

impl<V: SignalValue> SignalVector<V> {
    #[must_use]
    pub fn new(max_signals: usize) -> Self {
        Self {
            signals: Vec::new(),
            name_index: HashMap::new(),
            uid_index: HashMap::new(),
            changed: BTreeSet::new(),
            updated: BTreeSet::new(),
            max_signals,
        }
    }

    #[must_use]
    pub fn with_limits(limits: &Limits) -> Self {
        Self::new(limits.max_signals_per_vector)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.signals.iter().map(|s| s.name.as_str()).collect()
    }

    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.changed.len()
    }

    #[must_use]
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }

    /// Idempotent insert: names already present are silently skipped.
    pub fn add<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), SignalError> {
        for name in names {
            self.add_one(name.as_ref())?;
        }
        Ok(())
    }

    fn add_one(&mut self, name: &str) -> Result<usize, SignalError> {
        if let Some(&position) = self.name_index.get(name) {
            return Ok(position);
        }

        if self.signals.len() >= self.max_signals {
            return Err(SignalError::SignalLimitExceeded {
                name: name.to_string(),
                limit: self.max_signals,
            });
        }

        let position = self.signals.len();
        self.signals.push(Signal {
            name: name.to_string(),
            uid: 0,
            value: V::empty(),
        });
        self.name_index.insert(name.to_string(), position);
        Ok(position)
    }

    /// Assigns uids to (possibly new) names after the index handshake.
    pub fn index_signals(&mut self, names: &[String], uids: &[u32]) -> Result<(), SignalError> {
        if names.len() != uids.len() {
            return Err(SignalError::NameUidLengthMismatch {
                names: names.len(),
                uids: uids.len(),
            });
        }

        for (name, &uid) in names.iter().zip(uids) {
            let position = self.add_one(name)?;
            self.signals[position].uid = uid;
            self.uid_index.insert(uid, position);
        }
        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, value: V) -> Result<(), SignalError> {
        let position = *self
            .name_index
            .get(name)
            .ok_or_else(|| SignalError::UnknownName(name.to_string()))?;
        self.apply_changed(position, value);
        Ok(())
    }

    pub fn set(&mut self, values: impl IntoIterator<Item = (String, V)>) -> Result<(), SignalError> {
        for (name, value) in values {
            self.set_by_name(&name, value)?;
        }
        Ok(())
    }

    pub fn set_by_uid(&mut self, uid: u32, value: V) -> Result<(), SignalError> {
        let position = self.position_for_uid(uid)?;
        self.apply_changed(position, value);
        Ok(())
    }

    pub fn update_by_uid(&mut self, uid: u32, value: V) -> Result<(), SignalError> {
        let position = self.position_for_uid(uid)?;
        if V::apply(&mut self.signals[position].value, value) {
            self.updated.insert(position);
        }
        Ok(())
    }

    fn apply_changed(&mut self, position: usize, value: V) {
        if V::apply(&mut self.signals[position].value, value) {
            self.changed.insert(position);
        }
    }

    fn position_for_uid(&self, uid: u32) -> Result<usize, SignalError> {
        self.uid_index.get(&uid).copied().ok_or(SignalError::UnknownUid(uid))
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&V> {
        self.name_index.get(name).map(|&p| &self.signals[p].value)
    }

    #[must_use]
    pub fn get(&self) -> Vec<(&str, &V)> {
        self.signals
            .iter()
            .map(|s| (s.name.as_str(), &s.value))
            .collect()
    }

    /// Returns an aliased mutable handle to a signal's value slot. The
    /// returned borrow ties the Network Codec's lifetime to this vector: the
    /// vector remains the owner, the codec only ever borrows.
    pub fn get_value_ref_mut(&mut self, name: &str) -> Option<&mut V> {
        let position = *self.name_index.get(name)?;
        Some(&mut self.signals[position].value)
    }

    /// Resets every value to its empty form (binary vectors only, per the
    /// data model; callers are responsible for restricting this to binary
    /// channels).
    pub fn reset(&mut self) {
        for signal in &mut self.signals {
            signal.value = V::empty();
        }
    }

    pub fn clear_changed(&mut self) {
        self.changed.clear();
    }

    /// Drains the `changed` positions as owned `(uid, value)` pairs and
    /// clears `changed`, without going through the opaque msgpack encoding.
    /// Used by callers (the Gateway Engine's scalar notify-out path) that
    /// need the typed delta rather than a wire-ready byte buffer.
    pub fn take_changed(&mut self) -> Vec<(u32, V)> {
        let pairs = self
            .changed
            .iter()
            .map(|&position| {
                let signal = &self.signals[position];
                (signal.uid, signal.value.clone())
            })
            .collect();
        self.clear_changed();
        pairs
    }

    pub fn clear_updated(&mut self) {
        self.updated.clear();
    }

    /// Encodes the `changed` delta as `[[uids...],[values...]]` and clears
    /// `changed` as part of the call.
    pub fn to_msgpack(&mut self) -> Vec<u8> {
        let mut uids = Vec::with_capacity(self.changed.len());
        let mut values = Vec::with_capacity(self.changed.len());
        for &position in &self.changed {
            let signal = &self.signals[position];
            uids.push(Value::from(signal.uid));
            values.push(signal.value.to_msgpack_value());
        }

        let payload = Value::Array(vec![Value::Array(uids), Value::Array(values)]);
        let mut buffer = Vec::new();
        rmpv::encode::write_value(&mut buffer, &payload)
            .expect("encoding into an in-memory buffer cannot fail");

        self.clear_changed();
        buffer
    }

    /// Decodes a `toMsgPack` payload, applying each uid/value pair via
    /// `update_by_uid`. An empty buffer is a silent no-op.
    pub fn from_msgpack(&mut self, buf: &[u8]) -> Result<(), SignalError> {
        if buf.is_empty() {
            return Ok(());
        }

        let value = rmpv::decode::read_value(&mut &buf[..]).map_err(|err| {
            SignalError::MsgpackMalformed {
                reason: err.to_string(),
            }
        })?;

        let outer = value.as_array().ok_or_else(|| SignalError::MsgpackMalformed {
            reason: "expected an outer array".to_string(),
        })?;

        if outer.len() != 2 {
            return Err(SignalError::MsgpackOuterArityMismatch { len: outer.len() });
        }

        let uids = outer[0]
            .as_array()
            .ok_or_else(|| SignalError::MsgpackMalformed {
                reason: "expected a uid array".to_string(),
            })?;
        let values = outer[1]
            .as_array()
            .ok_or_else(|| SignalError::MsgpackMalformed {
                reason: "expected a value array".to_string(),
            })?;

        if uids.len() != values.len() {
            return Err(SignalError::MsgpackUidValueCountMismatch {
                uids: uids.len(),
                values: values.len(),
            });
        }

        for (uid_value, value) in uids.iter().zip(values) {
            let uid = uid_value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| SignalError::MsgpackMalformed {
                    reason: format!("expected a u32 uid, got {uid_value}"),
                })?;
            let decoded = V::from_msgpack_value(value)?;
            self.update_by_uid(uid, decoded)?;
        }

        Ok(())
    }
}

pub type ScalarVector = SignalVector<f64>;
pub type BinaryVector = SignalVector<Vec<u8>>;

#[cfg(test)]
mod tests {
    use super::{BinaryVector, ScalarVector};

    #[test]
    fn add_is_idempotent() {
        let mut sv = ScalarVector::new(16);
        sv.add(&["one", "two"]).expect("add should succeed");
        sv.add(&["one", "two"]).expect("repeat add should succeed");
        assert_eq!(sv.len(), 2);
        assert_eq!(sv.names(), vec!["one", "two"]);
    }

    #[test]
    fn scalar_set_is_noop_on_identical_value() {
        let mut sv = ScalarVector::new(16);
        sv.add(&["one"]).unwrap();
        sv.set_by_name("one", 1.1).unwrap();
        assert_eq!(sv.changed_count(), 1);
        sv.clear_changed();

        sv.set_by_name("one", 1.1).unwrap();
        assert_eq!(sv.changed_count(), 0, "identical value must not mark changed");
    }

    #[test]
    fn index_signals_rejects_length_mismatch() {
        let mut sv = ScalarVector::new(16);
        let error = sv
            .index_signals(&["one".to_string()], &[1, 2])
            .expect_err("mismatched lengths should fail");
        assert_eq!(
            error,
            super::SignalError::NameUidLengthMismatch { names: 1, uids: 2 }
        );
    }

    #[test]
    fn msgpack_round_trip_clears_changed_and_marks_updated() {
        let mut sv = ScalarVector::new(16);
        sv.add(&["one", "two"]).unwrap();
        sv.index_signals(&["one".to_string(), "two".to_string()], &[10, 20])
            .unwrap();
        sv.set_by_name("one", 1.5).unwrap();
        sv.set_by_name("two", 2.5).unwrap();
        assert_eq!(sv.changed_count(), 2);

        let encoded = sv.to_msgpack();
        assert_eq!(sv.changed_count(), 0, "toMsgPack clears changed");

        let mut receiver = ScalarVector::new(16);
        receiver
            .index_signals(&["one".to_string(), "two".to_string()], &[10, 20])
            .unwrap();
        receiver.from_msgpack(&encoded).unwrap();

        assert_eq!(receiver.get_by_name("one"), Some(&1.5));
        assert_eq!(receiver.get_by_name("two"), Some(&2.5));
        assert_eq!(receiver.updated_count(), 2);
        assert_eq!(receiver.changed_count(), 0);
    }

    #[test]
    fn from_msgpack_on_empty_buffer_is_a_silent_noop() {
        let mut sv = ScalarVector::new(16);
        sv.add(&["one"]).unwrap();
        sv.from_msgpack(&[]).expect("empty payload must be a no-op");
    }

    #[test]
    fn binary_set_by_name_appends() {
        let mut bv = BinaryVector::new(16);
        bv.add(&["four"]).unwrap();
        bv.set_by_name("four", b"Hello ".to_vec()).unwrap();
        bv.set_by_name("four", b"World".to_vec()).unwrap();
        assert_eq!(bv.get_by_name("four"), Some(&b"Hello World".to_vec()));
    }

    #[test]
    fn binary_reset_clears_to_empty() {
        let mut bv = BinaryVector::new(16);
        bv.add(&["four"]).unwrap();
        bv.set_by_name("four", b"data".to_vec()).unwrap();
        bv.reset();
        assert_eq!(bv.get_by_name("four"), Some(&Vec::new()));
    }

    #[test]
    fn signal_limit_is_enforced() {
        let mut sv = ScalarVector::new(1);
        sv.add(&["one"]).unwrap();
        let error = sv.add(&["two"]).expect_err("limit should reject second signal");
        assert_eq!(
            error,
            super::SignalError::SignalLimitExceeded {
                name: "two".to_string(),
                limit: 1,
            }
        );
    }
}
