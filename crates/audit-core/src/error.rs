use thiserror::Error;

/// Failures at the market-data boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Output error: {0}")]
    Output(String),
}

impl From<std::io::Error> for AuditError {
    fn from(e: std::io::Error) -> Self {
        AuditError::Output(e.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(e: serde_json::Error) -> Self {
        AuditError::Output(e.to_string())
    }
}
