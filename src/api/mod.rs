//! Drive API seam and its Graph implementation.

pub mod client;
pub mod error;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

use crate::error::Result;
use crate::quota::Quota;

pub use client::{GraphClient, GraphEndpoints};
pub use types::{ChunkAck, ContentRange, DriveItem, TokenGrant};

/// Remote operations the uploader depends on.
///
/// Every method maps a non-success response to the failure kind of that
/// operation (`Auth`, `Session`, `ChunkUpload`, `Metadata`, `HashFetch`,
/// `Api`), carrying status and body.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Exchange a refresh token for a new access token.
    async fn refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant>;

    /// Open an upload session for `remote_path` (rename on conflict) and
    /// return the session upload URL.
    async fn create_upload_session(&self, token: &str, remote_path: &str) -> Result<String>;

    /// Send one byte range to an upload session.
    async fn upload_chunk(
        &self,
        upload_url: &str,
        range: ContentRange,
        data: Vec<u8>,
    ) -> Result<ChunkAck>;

    /// Discard an upload session.
    async fn delete_upload_session(&self, upload_url: &str) -> Result<()>;

    /// Look up an item by its path relative to the drive root.
    async fn item_by_path(&self, token: &str, remote_path: &str) -> Result<DriveItem>;

    /// Fetch the item's QuickXorHash; `None` when not computed yet.
    async fn item_hash(&self, token: &str, item_id: &str) -> Result<Option<String>>;

    /// Fetch drive capacity figures.
    async fn drive_quota(&self, token: &str) -> Result<Quota>;
}
