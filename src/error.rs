//! Error types for the annotation pipeline.
//!
//! Only [`Error::Decode`] is expected to reach the caller of a full document
//! run. Cache and analysis failures are absorbed at the component boundary
//! and turned into degraded-but-valid data.

use thiserror::Error;

/// Top-level error for document-level operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The rendering collaborator could not decode the document at all.
    #[error("document could not be decoded: {0}")]
    Decode(String),

    #[error("page {page} is out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    /// The entity automaton could not be compiled.
    #[error("failed to build entity index: {0}")]
    Index(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Failure of the durable cache store. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("storage quota exceeded ({needed} bytes needed, {available} available)")]
    Quota { needed: usize, available: usize },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("cache entry could not be serialized: {0}")]
    Serialize(String),
}

/// Failure of the remote analysis call or of decoding its payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("analysis request failed: {0}")]
    Transport(String),

    #[error("analysis service returned {code} {reason}")]
    Status { code: u16, reason: String },

    #[error("analysis response had no candidate text")]
    InvalidEnvelope,

    #[error("no JSON object found in analysis response")]
    NoJsonObject,

    #[error("analysis payload is not valid JSON: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_converts() {
        let err: Error = CacheError::Unavailable("no window".into()).into();
        assert!(matches!(err, Error::Cache(CacheError::Unavailable(_))));
        assert_eq!(err.to_string(), "storage unavailable: no window");
    }

    #[test]
    fn test_status_message() {
        let err = AnalysisError::Status { code: 503, reason: "Service Unavailable".into() };
        assert_eq!(err.to_string(), "analysis service returned 503 Service Unavailable");
    }
}
