//! Upload session lifecycle.

use tracing::{debug, info, warn};

use crate::api::DriveApi;
use crate::auth::CredentialManager;
use crate::error::Result;

/// An open upload session. Created per upload and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    /// Requested drive path.
    pub remote_path: String,
    /// Session endpoint chunks are sent to.
    pub upload_url: String,
    /// File size declared by every chunk's content range.
    pub size: u64,
}

impl UploadSession {
    /// Open a session for `remote_path`; name conflicts produce a renamed item.
    pub async fn open(
        api: &dyn DriveApi,
        credentials: &CredentialManager,
        remote_path: &str,
        size: u64,
    ) -> Result<Self> {
        let token = credentials.access_token().await?;
        let upload_url = api.create_upload_session(&token, remote_path).await?;
        info!("upload session opened for {}", remote_path);
        debug!("session endpoint: {}", upload_url);

        Ok(Self {
            remote_path: remote_path.to_string(),
            upload_url,
            size,
        })
    }

    /// Discard the session after a failed or cancelled upload.
    ///
    /// Failures are logged only; the service expires abandoned sessions on
    /// its own.
    pub async fn discard(&self, api: &dyn DriveApi) {
        match api.delete_upload_session(&self.upload_url).await {
            Ok(()) => debug!("upload session for {} discarded", self.remote_path),
            Err(e) => warn!(
                "failed to discard upload session for {}: {}",
                self.remote_path, e
            ),
        }
    }
}
