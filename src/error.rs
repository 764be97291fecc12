//! Error types for the uploader.

use thiserror::Error;

/// Main error type for upload operations.
#[derive(Error, Debug)]
pub enum UploadError {
    /// Bad or missing credential-store fields.
    #[error("Config error: {0}")]
    Config(String),

    /// Token refresh exchange failed; no valid token exists.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Opening the upload session failed.
    #[error("Failed to create upload session, status: {status}, response: {body}")]
    Session { status: u16, body: String },

    /// A single chunk attempt failed (read, transport or HTTP level).
    #[error("Chunk {start}-{end} failed{}: {message}", status_suffix(.status))]
    ChunkUpload {
        start: u64,
        end: u64,
        status: Option<u16>,
        message: String,
    },

    /// One or more chunks exhausted their retries.
    #[error("{failed} of {total} chunks failed after retries (first failure: {detail})")]
    ChunksFailed {
        failed: usize,
        total: usize,
        detail: String,
    },

    /// The uploaded item could not be resolved after all chunks succeeded.
    #[error("Failed to resolve uploaded item '{path}'{}: {message}", status_suffix(.status))]
    Metadata {
        path: String,
        status: Option<u16>,
        message: String,
    },

    /// The remote content hash could not be fetched.
    #[error("Failed to fetch remote hash for item {item_id}: {message}")]
    HashFetch { item_id: String, message: String },

    /// The operation was cancelled before completion.
    #[error("Upload cancelled")]
    Cancelled,

    /// A remote call returned a non-success status.
    #[error("{operation} failed, status: {status}, response: {body}")]
    Api {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The server answered with a body we could not interpret.
    #[error("Invalid response for {operation}: {message}")]
    InvalidResponse {
        operation: &'static str,
        message: String,
    },

    /// Caller supplied something unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Network request error.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

impl UploadError {
    /// Whether this error must abort the calling operation.
    ///
    /// Hash fetch failures only mean the integrity check could not run; the
    /// uploaded bytes are already on the remote.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, UploadError::HashFetch { .. })
    }

    /// Retry classifier for chunk transfers.
    pub fn is_chunk_failure(&self) -> bool {
        matches!(self, UploadError::ChunkUpload { .. })
    }

    /// Retry classifier for remote hash lookups.
    pub fn is_hash_fetch(&self) -> bool {
        matches!(self, UploadError::HashFetch { .. })
    }
}

/// Result type alias for upload operations.
pub type Result<T> = std::result::Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_error_display() {
        let err = UploadError::ChunkUpload {
            start: 0,
            end: 99,
            status: Some(500),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Chunk 0-99 failed (status 500): boom");

        let err = UploadError::ChunkUpload {
            start: 100,
            end: 199,
            status: None,
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "Chunk 100-199 failed: connection reset");
    }

    #[test]
    fn test_classifiers() {
        let chunk = UploadError::ChunkUpload {
            start: 0,
            end: 1,
            status: None,
            message: String::new(),
        };
        assert!(chunk.is_chunk_failure());
        assert!(!chunk.is_hash_fetch());

        let hash = UploadError::HashFetch {
            item_id: "abc".to_string(),
            message: "not yet available".to_string(),
        };
        assert!(hash.is_hash_fetch());
        assert!(!hash.is_fatal());

        let parse = UploadError::InvalidResponse {
            operation: "item hash",
            message: "expected object".to_string(),
        };
        assert!(!parse.is_chunk_failure());
        assert!(!parse.is_hash_fetch());
        assert!(parse.is_fatal());
        assert!(UploadError::Auth("expired".into()).is_fatal());
    }
}
