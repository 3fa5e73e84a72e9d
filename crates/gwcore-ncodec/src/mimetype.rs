use std::collections::HashMap;

use crate::NCodecError;

const REQUIRED_KEYS: &[&str] = &["interface", "type", "schema"];
const ALLOWED_KEYS: &[&str] = &[
    "type",
    "schema",
    "interface",
    "bus",
    "bus_id",
    "node_id",
    "interface_id",
    "swc_id",
    "ecu_id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    Can,
    Pdu,
}

/// A parsed, validated `key=value` MIME specification string, e.g.
/// `"interface=stream;type=can;schema=fbs;bus=can;bus_id=1;node_id=2"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeSpec {
    params: HashMap<String, String>,
    bus_kind: BusKind,
}

impl MimeSpec {
    pub fn parse(mime_type: &str) -> Result<Self, NCodecError> {
        if mime_type.is_empty() {
            return Err(NCodecError::MimeEmpty);
        }

        let mut params = HashMap::new();
        for part in mime_type.split([';', ' ']).filter(|part| !part.is_empty()) {
            if let Some((key, value)) = part.split_once('=') {
                params.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        for &key in REQUIRED_KEYS {
            let Some(value) = params.get(key) else {
                return Err(NCodecError::MimeMissingRequired { key });
            };

            match key {
                "interface" if value != "stream" => {
                    return Err(NCodecError::MimeUnsupportedValue {
                        key: "interface",
                        value: value.clone(),
                    })
                }
                "type" if value != "can" && value != "pdu" => {
                    return Err(NCodecError::MimeUnsupportedValue {
                        key: "type",
                        value: value.clone(),
                    })
                }
                "schema" if value != "fbs" => {
                    return Err(NCodecError::MimeUnsupportedValue {
                        key: "schema",
                        value: value.clone(),
                    })
                }
                _ => {}
            }
        }

        for key in params.keys() {
            if !ALLOWED_KEYS.contains(&key.as_str()) {
                return Err(NCodecError::MimeUnexpectedParameter { key: key.clone() });
            }
        }

        let bus_kind = if params.get("type").map(String::as_str) == Some("can") {
            BusKind::Can
        } else {
            BusKind::Pdu
        };

        Ok(Self { params, bus_kind })
    }

    #[must_use]
    pub fn bus_kind(&self) -> BusKind {
        self.bus_kind
    }

    #[must_use]
    pub fn stat(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn stat_u32(&self, key: &str) -> Option<u32> {
        self.stat(key).and_then(|value| value.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::{BusKind, MimeSpec, NCodecError};

    #[test]
    fn parses_can_mime_spec() {
        let spec = MimeSpec::parse("interface=stream;type=can;schema=fbs;bus_id=1;node_id=2")
            .expect("valid spec should parse");
        assert_eq!(spec.bus_kind(), BusKind::Can);
        assert_eq!(spec.stat_u32("node_id"), Some(2));
    }

    #[test]
    fn rejects_unsupported_type() {
        let error = MimeSpec::parse("interface=stream;type=lin;schema=fbs")
            .expect_err("unsupported type should fail");
        match error {
            NCodecError::MimeUnsupportedValue { key, value } => {
                assert_eq!(key, "type");
                assert_eq!(value, "lin");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_parameter() {
        let error = MimeSpec::parse("interface=stream;type=can;schema=fbs;turbo=yes")
            .expect_err("unknown parameter should fail");
        match error {
            NCodecError::MimeUnexpectedParameter { key } => assert_eq!(key, "turbo"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_spec() {
        assert!(matches!(MimeSpec::parse(""), Err(NCodecError::MimeEmpty)));
    }
}
