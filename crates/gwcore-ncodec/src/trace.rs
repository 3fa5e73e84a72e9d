use std::collections::HashSet;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDirection {
    Read,
    Write,
}

pub type TraceHook<T> = Box<dyn FnMut(TraceDirection, &T) + Send>;

/// A set of frame/pdu ids to emit trace for, parsed from an env-var value:
/// `"*"` traces everything, a comma-separated list traces only those ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdFilter {
    All,
    Ids(HashSet<u32>),
}

impl IdFilter {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if value == "*" {
            return Some(Self::All);
        }

        let ids: HashSet<u32> = value
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect();
        if ids.is_empty() {
            None
        } else {
            Some(Self::Ids(ids))
        }
    }

    /// Reads `NCODEC_TRACE_CAN_<bus>_<bus_id>` for a CAN codec's trace filter.
    #[must_use]
    pub fn from_can_env(bus: &str, bus_id: u32) -> Option<Self> {
        let key = format!("NCODEC_TRACE_CAN_{bus}_{bus_id}");
        env::var(key).ok().and_then(|value| Self::parse(&value))
    }

    /// Reads `NCODEC_TRACE_PDU_<swc_id>` for a PDU codec's trace filter.
    #[must_use]
    pub fn from_pdu_env(swc_id: u32) -> Option<Self> {
        let key = format!("NCODEC_TRACE_PDU_{swc_id}");
        env::var(key).ok().and_then(|value| Self::parse(&value))
    }

    #[must_use]
    pub fn matches(&self, id: u32) -> bool {
        match self {
            Self::All => true,
            Self::Ids(ids) => ids.contains(&id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IdFilter;

    #[test]
    fn star_matches_everything() {
        let filter = IdFilter::parse("*").expect("should parse");
        assert_eq!(filter, IdFilter::All);
        assert!(filter.matches(1));
        assert!(filter.matches(999));
    }

    #[test]
    fn comma_list_matches_only_listed_ids() {
        let filter = IdFilter::parse("1, 2, 3").expect("should parse");
        assert!(filter.matches(2));
        assert!(!filter.matches(4));
    }

    #[test]
    fn empty_value_yields_no_filter() {
        assert_eq!(IdFilter::parse(""), None);
        assert_eq!(IdFilter::parse("   "), None);
    }
}
