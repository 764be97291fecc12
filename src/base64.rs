//! Base64 helpers for hash transport.
//!
//! The drive reports content hashes in standard (padded) base64, so local
//! digests are encoded the same way before comparison.

use base64::{engine::general_purpose, Engine};

/// Encode bytes to standard, padded base64.
///
/// # Example
/// ```
/// use onedrive_uploader::base64::base64_encode;
/// assert_eq!(base64_encode(b"hi"), "aGk=");
/// ```
pub fn base64_encode(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}
