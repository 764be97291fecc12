//! Content hashing and post-upload integrity checks.

pub mod quickxor;
pub mod verify;

use std::path::Path;

use tokio::io::AsyncReadExt;

pub use quickxor::QuickXorHash;
pub use verify::{IntegrityStatus, IntegrityVerifier};

use crate::error::Result;

const READ_BUFFER: usize = 1024 * 1024;

/// Stream a file through QuickXorHash and return the base64 digest.
pub async fn hash_file(path: impl AsRef<Path>) -> Result<String> {
    let mut file = tokio::fs::File::open(path.as_ref()).await?;
    let mut hasher = QuickXorHash::new();
    let mut buffer = vec![0u8; READ_BUFFER];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.to_base64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_hash_file_matches_in_memory() {
        let data: Vec<u8> = (0..3 * READ_BUFFER as u32 + 17).map(|i| (i % 253) as u8).collect();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        let from_file = hash_file(file.path()).await.unwrap();
        assert_eq!(from_file, quickxor::quickxor_base64(&data));
    }

    #[tokio::test]
    async fn test_hash_missing_file() {
        assert!(hash_file("/nonexistent/file.bin").await.is_err());
    }
}
