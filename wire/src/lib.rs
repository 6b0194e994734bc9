//! Shared JSON wire contract between the form server and the browser side.
//!
//! This crate owns every shape that crosses the boundary: the versioned
//! value envelopes used for property values and their deltas
//! ([`envelope`]), the designer edit batch consumed by the reconciler
//! ([`batch`]), and the postMessage events exchanged with the designer
//! host frame ([`message`]). Payloads stay flexible (`serde_json::Value`)
//! where the type of the carried value is only known to the converters.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`envelope`] | `v` / `g` / `u` / `n` value envelopes and array ops |
//! | [`batch`] | Designer edit batch (`ng2containers`, `ng2components`, ...) |
//! | [`message`] | Designer postMessage events keyed by `id` |

pub mod batch;
pub mod envelope;
pub mod message;

pub use batch::{ComponentDelta, ContainerDelta, DesignBatch, Layout, ParentRef};
pub use envelope::{ArrayOp, Envelope, OpKind, Update, UpdateTarget};
pub use message::{DesignerMessage, Guide, GuideStyle, SnapProperties, SnapTarget, SnapThresholdValues, WirePoint};

// =============================================================================
// ERRORS
// =============================================================================

/// Grepable error code and retryable flag shared by every crate's error enum.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Error returned while reading wire shapes.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The value does not have the shape of any known envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    /// A granular array op carries an opcode outside CHANGED/INSERT/DELETE.
    #[error("unknown array opcode: {0}")]
    UnknownOpcode(i64),
    /// A batch or message could not be deserialized.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl ErrorCode for WireError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope(_) => "E_MALFORMED_ENVELOPE",
            Self::UnknownOpcode(_) => "E_UNKNOWN_OPCODE",
            Self::Json(_) => "E_INVALID_JSON",
        }
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
