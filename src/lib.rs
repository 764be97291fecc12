//! # onedrive-uploader
//!
//! Chunked, parallel uploads to OneDrive upload sessions.
//!
//! ## Features
//!
//! - **Upload sessions**: files are sent as absolute byte ranges to a Graph
//!   upload session; name conflicts produce a renamed item, never an
//!   overwrite.
//! - **Parallel chunks**: a bounded worker pool with a fixed-delay retry per
//!   chunk. A chunk that runs out of attempts fails the whole upload.
//! - **Token refresh**: the access token is checked before every chunk
//!   attempt and refreshed exactly once when it expires, however many workers
//!   are running.
//! - **Integrity check**: the local QuickXorHash is compared with the one the
//!   service computes, retrying while the remote hash is not available yet.
//! - **Progress and cancellation**: progress callbacks and a shareable
//!   [`CancelToken`].
//! - **rclone credentials**: remotes are read from an rclone-style config
//!   file.
//!
//! ## Example
//!
//! ```no_run
//! use onedrive_uploader::{ConfigRegistry, HttpClient, UploadOptions, Uploader};
//!
//! # async fn example() -> onedrive_uploader::Result<()> {
//! let registry = ConfigRegistry::load("rclone.conf").await?;
//! let remote = registry.remote("oned")?;
//!
//! let options = UploadOptions {
//!     parallelism: 4,
//!     ..UploadOptions::default()
//! };
//! let mut uploader = Uploader::from_remote(&remote, HttpClient::new()?, options);
//! uploader.watch_status(Box::new(|progress| {
//!     println!("{:.1}%", progress.percent());
//!     true
//! }));
//!
//! let path = remote.remote_path("backups", "archive.tar");
//! let report = uploader.upload("archive.tar", &path).await?;
//! println!("item {}: {}", report.result.item_id, report.integrity);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod base64;
pub mod cancel;
pub mod config;
pub mod error;
pub mod hash;
pub mod http;
pub mod path;
pub mod progress;
pub mod quota;
pub mod retry;
pub mod upload;

// Re-export commonly used types
pub use api::{DriveApi, DriveItem, GraphClient, GraphEndpoints};
pub use auth::{CredentialManager, Credentials};
pub use cancel::CancelToken;
pub use config::{ConfigRegistry, RemoteConfig};
pub use error::{Result, UploadError};
pub use hash::{hash_file, IntegrityStatus, IntegrityVerifier, QuickXorHash};
pub use http::HttpClient;
pub use progress::{ProgressCallback, TransferProgress};
pub use quota::{format_bytes, Quota};
pub use retry::RetryPolicy;
pub use upload::{UploadOptions, UploadReport, UploadResult, Uploader};
