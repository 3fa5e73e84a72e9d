mod error;

pub use error::LimitsError;

/// Shared, validated resource budgets for the gateway core boundary crates.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_signals_per_vector: usize,
    pub max_channels: usize,
    pub max_frame_bytes: usize,
    pub max_ncodec_stream_bytes: usize,
    pub register_retry_ceiling: u32,
}

impl Limits {
    pub const DEFAULT_MAX_SIGNALS_PER_VECTOR: usize = 4_096;
    pub const DEFAULT_MAX_CHANNELS: usize = 256;
    pub const DEFAULT_MAX_FRAME_BYTES: usize = 1_048_576;
    pub const DEFAULT_MAX_NCODEC_STREAM_BYTES: usize = 1_048_576;
    pub const DEFAULT_REGISTER_RETRY_CEILING: u32 = 600;

    /// Safe defaults aligned with the reference gateway configuration.
    #[must_use]
    pub const fn conservative_defaults() -> Self {
        Self {
            max_signals_per_vector: Self::DEFAULT_MAX_SIGNALS_PER_VECTOR,
            max_channels: Self::DEFAULT_MAX_CHANNELS,
            max_frame_bytes: Self::DEFAULT_MAX_FRAME_BYTES,
            max_ncodec_stream_bytes: Self::DEFAULT_MAX_NCODEC_STREAM_BYTES,
            register_retry_ceiling: Self::DEFAULT_REGISTER_RETRY_CEILING,
        }
    }

    /// Validate internal invariants before exposing limits to boundary crates.
    pub fn validate(&self) -> Result<(), LimitsError> {
        ensure_non_zero("max_signals_per_vector", self.max_signals_per_vector)?;
        ensure_non_zero("max_channels", self.max_channels)?;
        ensure_non_zero("max_frame_bytes", self.max_frame_bytes)?;
        ensure_non_zero("max_ncodec_stream_bytes", self.max_ncodec_stream_bytes)?;

        if self.register_retry_ceiling == 0 {
            return Err(LimitsError::RegisterRetryCeilingTooSmall {
                register_retry_ceiling: self.register_retry_ceiling,
            });
        }

        if self.max_ncodec_stream_bytes > self.max_frame_bytes {
            return Err(LimitsError::NcodecStreamExceedsFrame {
                max_ncodec_stream_bytes: self.max_ncodec_stream_bytes,
                max_frame_bytes: self.max_frame_bytes,
            });
        }

        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::conservative_defaults()
    }
}

fn ensure_non_zero(field: &'static str, value: usize) -> Result<(), LimitsError> {
    if value == 0 {
        return Err(LimitsError::Zero { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Limits, LimitsError};

    #[test]
    fn conservative_defaults_validate() {
        let limits = Limits::conservative_defaults();
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn rejects_zero_max_signals() {
        let limits = Limits {
            max_signals_per_vector: 0,
            ..Limits::default()
        };
        assert_eq!(
            limits.validate(),
            Err(LimitsError::Zero {
                field: "max_signals_per_vector"
            })
        );
    }

    #[test]
    fn rejects_stream_bytes_exceeding_frame_bytes() {
        let limits = Limits {
            max_ncodec_stream_bytes: 2_000_000,
            max_frame_bytes: 1_000_000,
            ..Limits::default()
        };
        assert_eq!(
            limits.validate(),
            Err(LimitsError::NcodecStreamExceedsFrame {
                max_ncodec_stream_bytes: 2_000_000,
                max_frame_bytes: 1_000_000,
            })
        );
    }

    #[test]
    fn rejects_zero_register_retry_ceiling() {
        let limits = Limits {
            register_retry_ceiling: 0,
            ..Limits::default()
        };
        assert_eq!(
            limits.validate(),
            Err(LimitsError::RegisterRetryCeilingTooSmall {
                register_retry_ceiling: 0
            })
        );
    }
}
