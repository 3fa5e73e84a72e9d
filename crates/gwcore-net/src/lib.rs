mod bounded;
mod error;
mod identified;
mod length_prefixed;

pub use bounded::BoundedReader;
pub use error::{BoundedReadError, IdentifiedFrameError, LengthPrefixedError};
pub use identified::{
    pack_identified_frame, read_identified_frame, read_identified_frame_expect,
    unpack_identified_frame, write_identified_frame,
};
pub use length_prefixed::{
    read_length_prefixed_frame, write_length_prefixed_frame, LengthPrefixKind,
};
