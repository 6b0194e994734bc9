use convert::ConvertError;
use wire::{ErrorCode, WireError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} line {line}: {source}")]
    Batch {
        path: String,
        line: usize,
        #[source]
        source: WireError,
    },
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "E_IO",
            Self::Json { .. } => "E_INVALID_JSON",
            Self::Batch { source, .. } => source.error_code(),
            Self::Output(_) => "E_OUTPUT",
            Self::Convert(e) => e.error_code(),
        }
    }
}
