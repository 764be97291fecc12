//! Local-versus-remote hash comparison.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::hash_file;
use crate::api::DriveApi;
use crate::auth::CredentialManager;
use crate::cancel::CancelToken;
use crate::error::{Result, UploadError};
use crate::retry::RetryPolicy;

/// Outcome of an integrity check. None of these undo an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityStatus {
    /// Local and remote digests are identical.
    Verified { hash: String },
    /// Digests differ; the remote copy is probably corrupt or truncated.
    Mismatch { local: String, remote: String },
    /// No comparison was possible (remote hash unavailable, local read error).
    Unverified { reason: String },
    /// Verification was turned off.
    Skipped,
}

impl IntegrityStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, IntegrityStatus::Verified { .. })
    }
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityStatus::Verified { hash } => {
                write!(f, "Integrity verified: QuickXorHash {}", hash)
            }
            IntegrityStatus::Mismatch { local, remote } => write!(
                f,
                "Integrity check failed: local QuickXorHash {} != remote {}",
                local, remote
            ),
            IntegrityStatus::Unverified { reason } => {
                write!(f, "Integrity unverified: {}", reason)
            }
            IntegrityStatus::Skipped => write!(f, "Integrity check skipped"),
        }
    }
}

/// Compares the QuickXorHash of a local file with the one the service
/// computed for the uploaded item.
///
/// The service fills in the hash some time after the upload completes, so
/// the remote fetch is retried with a fixed delay. Only `HashFetch` failures
/// (including "not available yet") are retried.
pub struct IntegrityVerifier {
    api: Arc<dyn DriveApi>,
    credentials: Arc<CredentialManager>,
    policy: RetryPolicy,
}

impl IntegrityVerifier {
    pub fn new(
        api: Arc<dyn DriveApi>,
        credentials: Arc<CredentialManager>,
        attempts: u32,
        delay: Duration,
    ) -> Self {
        Self {
            api,
            credentials,
            policy: RetryPolicy::for_hash_fetch(attempts, delay),
        }
    }

    /// Fetch the remote digest, retrying until it is available.
    pub async fn fetch_remote_hash(&self, item_id: &str, cancel: &CancelToken) -> Result<String> {
        let api = self.api.as_ref();
        let credentials = self.credentials.as_ref();

        let attempted = self
            .policy
            .run("fetch remote hash", cancel, move |_| async move {
                let token = credentials.access_token().await?;
                api.item_hash(&token, item_id)
                    .await?
                    .ok_or_else(|| UploadError::HashFetch {
                        item_id: item_id.to_string(),
                        message: "hash not available yet".to_string(),
                    })
            })
            .await;

        attempted.result
    }

    /// Hash `local_path` and compare it with the remote digest of `item_id`.
    pub async fn verify(
        &self,
        local_path: impl AsRef<Path>,
        item_id: &str,
        cancel: &CancelToken,
    ) -> IntegrityStatus {
        let (local, remote) = tokio::join!(
            hash_file(local_path.as_ref()),
            self.fetch_remote_hash(item_id, cancel)
        );

        let local = match local {
            Ok(hash) => hash,
            Err(e) => {
                warn!("local hash failed: {}", e);
                return IntegrityStatus::Unverified {
                    reason: format!("local hash failed: {}", e),
                };
            }
        };
        let remote = match remote {
            Ok(hash) => hash,
            Err(e) => {
                warn!("remote hash unavailable: {}", e);
                return IntegrityStatus::Unverified {
                    reason: e.to_string(),
                };
            }
        };

        if local == remote {
            info!("QuickXorHash match: {}", local);
            IntegrityStatus::Verified { hash: local }
        } else {
            warn!("QuickXorHash mismatch: local {} remote {}", local, remote);
            IntegrityStatus::Mismatch { local, remote }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{FakeDrive, ITEM_ID};
    use crate::auth::Credentials;
    use crate::hash::quickxor::quickxor_base64;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn verifier(fake: &Arc<FakeDrive>, attempts: u32) -> IntegrityVerifier {
        let credentials = Credentials {
            client_id: "c".to_string(),
            client_secret: "s".to_string(),
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expiry: Utc::now() + ChronoDuration::hours(1),
        };
        let credentials = Arc::new(CredentialManager::new(credentials, fake.clone()));
        IntegrityVerifier::new(fake.clone(), credentials, attempts, Duration::ZERO)
    }

    fn source(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file
    }

    #[tokio::test]
    async fn test_match_after_hash_appears() {
        let fake = Arc::new(FakeDrive::new());
        {
            let mut state = fake.state();
            state.hash_failures = 2;
            state.remote_hash = Some(quickxor_base64(b"payload"));
        }
        let file = source(b"payload");

        let status = verifier(&fake, 3)
            .verify(file.path(), ITEM_ID, &CancelToken::new())
            .await;
        assert!(status.is_verified(), "{}", status);
        assert_eq!(fake.state().hash_calls, 3);
    }

    #[tokio::test]
    async fn test_mismatch_is_reported() {
        let fake = Arc::new(FakeDrive::new());
        fake.state().remote_hash = Some(quickxor_base64(b"other"));
        let file = source(b"payload");

        let status = verifier(&fake, 1)
            .verify(file.path(), ITEM_ID, &CancelToken::new())
            .await;
        assert_eq!(
            status,
            IntegrityStatus::Mismatch {
                local: quickxor_base64(b"payload"),
                remote: quickxor_base64(b"other"),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_hash_field_exhausts_retries() {
        let fake = Arc::new(FakeDrive::new());
        let file = source(b"payload");

        let status = verifier(&fake, 4)
            .verify(file.path(), ITEM_ID, &CancelToken::new())
            .await;
        assert!(matches!(status, IntegrityStatus::Unverified { .. }));
        assert_eq!(fake.state().hash_calls, 4);
    }

    #[tokio::test]
    async fn test_malformed_hash_reply_is_not_retried() {
        let fake = Arc::new(FakeDrive::new());
        fake.state().malformed_hash = true;
        let file = source(b"payload");

        let status = verifier(&fake, 5)
            .verify(file.path(), ITEM_ID, &CancelToken::new())
            .await;
        match status {
            IntegrityStatus::Unverified { reason } => {
                assert!(reason.contains("fetch item hash"), "{}", reason)
            }
            other => panic!("unexpected status: {}", other),
        }
        assert_eq!(fake.state().hash_calls, 1);
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(IntegrityStatus::Skipped.to_string(), "Integrity check skipped");
        let unverified = IntegrityStatus::Unverified {
            reason: "timeout".to_string(),
        };
        assert_eq!(unverified.to_string(), "Integrity unverified: timeout");
    }
}
