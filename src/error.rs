use thiserror::Error;

/// Everything that can go wrong while resolving, fetching, extracting or
/// storing a single fund.
#[derive(Debug, Error)]
pub enum FundError {
    /// No symbol matched the code, or the report page carries the
    /// non-existent-fund marker.
    #[error("no fund found for {code}")]
    NotFound { code: String },

    /// Network-level failure after all retry attempts.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response from the report endpoint.
    #[error("unexpected HTTP status {status}")]
    Http { status: u16 },

    /// Response body we could not make sense of.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("failed to persist {id}: {reason}")]
    Persistence { id: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl FundError {
    /// Process exit code for a fatal (non-batch) failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            FundError::Config(_) => 2,
            FundError::NotFound { .. }
            | FundError::Transport(_)
            | FundError::Http { .. }
            | FundError::Parse(_) => 3,
            FundError::Persistence { .. } => 4,
        }
    }
}
