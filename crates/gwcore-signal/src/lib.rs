mod error;
mod value;
mod vector;

pub use error::SignalError;
pub use value::SignalValue;
pub use vector::{BinaryVector, ScalarVector, Signal, SignalVector};

/// Tagged union of the two vector kinds, for callers (the Gateway Engine)
/// that store both scalar and binary channels in one map without collapsing
/// their distinct reset/merge semantics into a single generic type.
#[derive(Debug, Clone)]
pub enum AnySignalVector {
    Scalar(ScalarVector),
    Binary(BinaryVector),
}

impl AnySignalVector {
    #[must_use]
    pub fn as_scalar(&self) -> Option<&ScalarVector> {
        match self {
            Self::Scalar(vector) => Some(vector),
            Self::Binary(_) => None,
        }
    }

    #[must_use]
    pub fn as_scalar_mut(&mut self) -> Option<&mut ScalarVector> {
        match self {
            Self::Scalar(vector) => Some(vector),
            Self::Binary(_) => None,
        }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&BinaryVector> {
        match self {
            Self::Binary(vector) => Some(vector),
            Self::Scalar(_) => None,
        }
    }

    #[must_use]
    pub fn as_binary_mut(&mut self) -> Option<&mut BinaryVector> {
        match self {
            Self::Binary(vector) => Some(vector),
            Self::Scalar(_) => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(vector) => vector.len(),
            Self::Binary(vector) => vector.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
