//! Chunked upload orchestration.
//!
//! An upload runs in four steps:
//!
//! 1. open an upload session for the target path (rename on conflict),
//! 2. dispatch every chunk through the bounded worker pool,
//! 3. resolve the created item by path,
//! 4. optionally compare QuickXorHash digests.
//!
//! Steps 1 to 3 are all-or-nothing: any failure aborts the upload, and a
//! failed or cancelled dispatch discards the session. Step 4 never fails the
//! upload; its outcome is reported as an [`IntegrityStatus`].

pub mod chunk;
pub mod item;
pub mod scheduler;
pub mod session;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

pub use chunk::{plan_chunks, select_chunk_size, ChunkTask};
pub use scheduler::{ChunkOutcome, ChunkScheduler, DispatchReport};
pub use session::UploadSession;

use crate::api::{DriveApi, GraphClient};
use crate::auth::{CredentialManager, Credentials};
use crate::cancel::CancelToken;
use crate::config::RemoteConfig;
use crate::error::{Result, UploadError};
use crate::hash::{IntegrityStatus, IntegrityVerifier};
use crate::http::HttpClient;
use crate::progress::ProgressCallback;
use crate::quota::Quota;
use crate::retry::RetryPolicy;

/// Tunables for one [`Uploader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Chunk size in bytes; 0 selects one from the file size.
    pub chunk_size: u64,
    /// Chunks in flight at once.
    pub parallelism: usize,
    /// Attempts per chunk, the first one included.
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Attempts to fetch the remote hash, the first one included.
    pub hash_retries: u32,
    pub hash_retry_delay: Duration,
    pub skip_hash: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: 0,
            parallelism: 1,
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            hash_retries: 5,
            hash_retry_delay: Duration::from_secs(10),
            skip_hash: false,
        }
    }
}

/// The uploaded item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub item_id: String,
    /// Final name, which differs from the requested one after a rename.
    pub name: String,
    /// Requested drive path.
    pub remote_path: String,
    pub size: u64,
    pub success: bool,
}

/// Upload result plus the integrity check outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub result: UploadResult,
    pub integrity: IntegrityStatus,
}

/// Uploads local files into one drive.
pub struct Uploader {
    api: Arc<dyn DriveApi>,
    credentials: Arc<CredentialManager>,
    options: UploadOptions,
    progress_callback: Option<ProgressCallback>,
    cancel: CancelToken,
}

impl Uploader {
    /// Create an uploader over any [`DriveApi`].
    pub fn new(api: Arc<dyn DriveApi>, credentials: Credentials, options: UploadOptions) -> Self {
        let credentials = Arc::new(CredentialManager::new(credentials, api.clone()));
        Self {
            api,
            credentials,
            options,
            progress_callback: None,
            cancel: CancelToken::new(),
        }
    }

    /// Create an uploader for a configured remote over the Graph API.
    ///
    /// # Example
    /// ```no_run
    /// # use onedrive_uploader::{ConfigRegistry, HttpClient, UploadOptions, Uploader};
    /// # async fn example() -> onedrive_uploader::Result<()> {
    /// let registry = ConfigRegistry::load("rclone.conf").await?;
    /// let remote = registry.remote("oned")?;
    /// let mut uploader = Uploader::from_remote(&remote, HttpClient::new()?, UploadOptions::default());
    ///
    /// let report = uploader.upload("video.mp4", &remote.remote_path("videos", "video.mp4")).await?;
    /// println!("{} -> {}", report.result.item_id, report.integrity);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_remote(remote: &RemoteConfig, http: HttpClient, options: UploadOptions) -> Self {
        Self::new(
            Arc::new(GraphClient::new(http)),
            remote.credentials(),
            options,
        )
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut UploadOptions {
        &mut self.options
    }

    /// Shared credential state; snapshot it to persist rotated tokens.
    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    /// Register a progress callback, called after every accepted chunk.
    ///
    /// Returning `false` from the callback cancels the upload.
    ///
    /// # Example
    /// ```no_run
    /// # use onedrive_uploader::Uploader;
    /// # fn example(uploader: &mut Uploader) {
    /// uploader.watch_status(Box::new(|progress| {
    ///     println!("{}% complete", progress.percent() as u32);
    ///     true // continue transfer
    /// }));
    /// # }
    /// ```
    pub fn watch_status(&mut self, callback: ProgressCallback) {
        self.progress_callback = Some(callback);
    }

    /// Clear the progress callback.
    pub fn clear_status(&mut self) {
        self.progress_callback = None;
    }

    /// Token that cancels uploads of this uploader when raised.
    ///
    /// New chunk attempts stop; attempts in flight finish first. The token
    /// stays raised, so every later upload fails with `Cancelled` until
    /// [`reset_cancel`](Self::reset_cancel) is called.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Replace the cancel token with a fresh one and return it.
    ///
    /// Clones of the previous token no longer affect this uploader.
    pub fn reset_cancel(&mut self) -> CancelToken {
        self.cancel = CancelToken::new();
        self.cancel.clone()
    }

    /// Upload `local_path` to `remote_path` and resolve the created item.
    pub async fn upload_file(
        &mut self,
        local_path: impl AsRef<Path>,
        remote_path: &str,
    ) -> Result<UploadResult> {
        let local_path = local_path.as_ref();
        let metadata = tokio::fs::metadata(local_path).await?;
        if !metadata.is_file() {
            return Err(UploadError::InvalidInput(format!(
                "{} is not a regular file",
                local_path.display()
            )));
        }
        let size = metadata.len();
        if size == 0 {
            return Err(UploadError::InvalidInput(format!(
                "{} is empty; upload sessions cannot carry zero bytes",
                local_path.display()
            )));
        }

        let chunk_size = if self.options.chunk_size == 0 {
            let selected = select_chunk_size(size);
            info!("selected chunk size {} for {} bytes", selected, size);
            selected
        } else {
            self.options.chunk_size
        };
        let tasks = plan_chunks(size, chunk_size);

        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }
        let session =
            UploadSession::open(self.api.as_ref(), &self.credentials, remote_path, size).await?;

        let scheduler = ChunkScheduler::new(
            self.api.as_ref(),
            &self.credentials,
            RetryPolicy::for_chunks(self.options.max_retries, self.options.retry_delay),
            self.options.parallelism,
        );
        let report = scheduler
            .dispatch(
                local_path,
                &session,
                tasks,
                &self.cancel,
                self.progress_callback.as_mut(),
            )
            .await;

        let completed = match report.into_result() {
            Ok(completed) => completed,
            Err(e) => {
                warn!("upload of {} failed: {}", remote_path, e);
                session.discard(self.api.as_ref()).await;
                return Err(e);
            }
        };
        info!("all chunks of {} accepted", remote_path);

        let item = item::resolve_item(
            self.api.as_ref(),
            &self.credentials,
            remote_path,
            completed.as_ref(),
        )
        .await?;
        info!("uploaded {} as item {}", remote_path, item.id);

        Ok(UploadResult {
            item_id: item.id,
            name: item.name,
            remote_path: remote_path.to_string(),
            size,
            success: true,
        })
    }

    /// Compare the local file with the remote item's QuickXorHash.
    pub async fn verify(&self, local_path: impl AsRef<Path>, item_id: &str) -> IntegrityStatus {
        let verifier = IntegrityVerifier::new(
            self.api.clone(),
            self.credentials.clone(),
            self.options.hash_retries,
            self.options.hash_retry_delay,
        );
        verifier.verify(local_path, item_id, &self.cancel).await
    }

    /// Upload, then verify unless `skip_hash` is set.
    pub async fn upload(
        &mut self,
        local_path: impl AsRef<Path>,
        remote_path: &str,
    ) -> Result<UploadReport> {
        let local_path = local_path.as_ref();
        let result = self.upload_file(local_path, remote_path).await?;

        let integrity = if self.options.skip_hash {
            IntegrityStatus::Skipped
        } else {
            self.verify(local_path, &result.item_id).await
        };

        Ok(UploadReport { result, integrity })
    }

    /// Fetch the drive quota.
    pub async fn quota(&self) -> Result<Quota> {
        let token = self.credentials.access_token().await?;
        self.api.drive_quota(&token).await
    }
}
