//! Error types for the aironet core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Hash already used: {0}")]
    HashReused(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse categorization the HTTP layer maps to status codes. The core
/// reports every failure as a reason string plus one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    Upstream,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::BadRequest,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::HashReused(_) => ErrorKind::Conflict,
            Error::Ledger(_) => ErrorKind::Upstream,
            Error::Storage(_) | Error::Io(_) | Error::Json(_) | Error::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Error::Validation(reason.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    pub fn ledger(reason: impl Into<String>) -> Self {
        Error::Ledger(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_status_categories() {
        assert_eq!(
            Error::validation("invalid withdrawal sum").kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(Error::not_found("miner").kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::HashReused("abc123".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(Error::ledger("send failed").kind(), ErrorKind::Upstream);
        assert_eq!(Error::Storage("closed".into()).kind(), ErrorKind::Internal);
    }
}
