use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LimitsError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("register_retry_ceiling ({register_retry_ceiling}) must allow at least one retry")]
    RegisterRetryCeilingTooSmall { register_retry_ceiling: u32 },

    #[error(
        "max_ncodec_stream_bytes ({max_ncodec_stream_bytes}) cannot exceed max_frame_bytes \
         ({max_frame_bytes})"
    )]
    NcodecStreamExceedsFrame {
        max_ncodec_stream_bytes: usize,
        max_frame_bytes: usize,
    },
}
