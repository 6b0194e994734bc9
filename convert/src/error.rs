//! Conversion errors.

use wire::{ErrorCode, WireError};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A granular update was computed against another version of the value.
    #[error("stale version: client holds {expected}, update targets {actual}")]
    StaleVersion { expected: i64, actual: i64 },
    /// No converter is registered for the named type.
    #[error("unknown type: {0}")]
    UnknownType(String),
    /// A granular update arrived for a slot with no (compatible) previous value.
    #[error("granular update for {0} without a previous value")]
    MissingPrevious(&'static str),
    /// An array op addresses indices the array does not have.
    #[error("array op {kind} [{start}, {end}] out of range for length {len}")]
    OpOutOfRange { kind: &'static str, start: usize, end: usize, len: usize },
    /// Date text or timestamp could not be interpreted.
    #[error("invalid date: {0}")]
    InvalidDate(String),
    /// The envelope itself is malformed.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl ErrorCode for ConvertError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::StaleVersion { .. } => "E_STALE_VERSION",
            Self::UnknownType(_) => "E_UNKNOWN_TYPE",
            Self::MissingPrevious(_) => "E_MISSING_PREVIOUS",
            Self::OpOutOfRange { .. } => "E_OP_OUT_OF_RANGE",
            Self::InvalidDate(_) => "E_INVALID_DATE",
            Self::Wire(e) => e.error_code(),
        }
    }

    /// Stale updates recover once the server resends a full value.
    fn retryable(&self) -> bool {
        matches!(self, Self::StaleVersion { .. })
    }
}
