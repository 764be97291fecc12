//! Wire types for the token endpoint and the Graph drive API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Successful refresh-token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Some providers omit a rotated refresh token; keep the old one then.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Response to a session-open request.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadSessionResponse {
    #[serde(rename = "uploadUrl")]
    pub upload_url: String,
}

/// A file or folder record in the drive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Item record as returned with `select=id,file`.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemFileFacet {
    #[serde(default)]
    pub file: Option<FileFacet>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileFacet {
    #[serde(default)]
    pub hashes: Option<FileHashes>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileHashes {
    #[serde(rename = "quickXorHash", default)]
    pub quick_xor_hash: Option<String>,
}

impl ItemFileFacet {
    /// The QuickXorHash, if the service has computed it yet.
    pub fn quick_xor_hash(self) -> Option<String> {
        self.file
            .and_then(|f| f.hashes)
            .and_then(|h| h.quick_xor_hash)
            .filter(|h| !h.is_empty())
    }
}

/// Byte range of one chunk within a file of `total` bytes (`end` inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// How the session answered an accepted chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkAck {
    /// Chunk stored, more ranges expected (202).
    Accepted,
    /// Chunk stored and the file is complete (200/201); carries the created
    /// item when the body could be read.
    Completed(Option<DriveItem>),
}
