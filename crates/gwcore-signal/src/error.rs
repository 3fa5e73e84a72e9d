use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("adding signal {name:?} would exceed max_signals_per_vector ({limit})")]
    SignalLimitExceeded { name: String, limit: usize },

    #[error("index_signals received {names} names but {uids} uids")]
    NameUidLengthMismatch { names: usize, uids: usize },

    #[error("msgpack payload outer array must have length 2, got {len}")]
    MsgpackOuterArityMismatch { len: usize },

    #[error("msgpack payload carries {uids} uids but {values} values")]
    MsgpackUidValueCountMismatch { uids: usize, values: usize },

    #[error("msgpack payload is not well-formed: {reason}")]
    MsgpackMalformed { reason: String },

    #[error("no signal named {0:?} in this vector")]
    UnknownName(String),

    #[error("no signal with uid {0} in this vector")]
    UnknownUid(u32),
}
