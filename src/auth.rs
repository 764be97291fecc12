//! Bearer token state and refresh.
//!
//! One [`CredentialManager`] is shared by every chunk worker of an upload.
//! Workers call [`CredentialManager::access_token`] right before each network
//! call; a refresh happens under the same lock, so concurrent workers never
//! see a half-updated token and an expired token is refreshed exactly once.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::DriveApi;
use crate::error::{Result, UploadError};

/// Client identity plus the current token pair.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of `access_token`.
    pub expiry: DateTime<Utc>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl Credentials {
    /// Whether the access token is still usable at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }
}

/// Guarded owner of [`Credentials`].
pub struct CredentialManager {
    state: Mutex<Credentials>,
    api: Arc<dyn DriveApi>,
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialManager").finish_non_exhaustive()
    }
}

impl CredentialManager {
    pub fn new(credentials: Credentials, api: Arc<dyn DriveApi>) -> Self {
        Self {
            state: Mutex::new(credentials),
            api,
        }
    }

    /// Refresh the token if it has expired at `now`.
    pub async fn ensure_valid_at(&self, now: DateTime<Utc>) -> Result<()> {
        let mut creds = self.state.lock().await;
        Self::refresh_locked(&mut creds, self.api.as_ref(), now).await
    }

    /// Refresh the token if it has expired.
    pub async fn ensure_valid(&self) -> Result<()> {
        self.ensure_valid_at(Utc::now()).await
    }

    /// Ensure validity at `now` and return the current access token.
    pub async fn access_token_at(&self, now: DateTime<Utc>) -> Result<String> {
        let mut creds = self.state.lock().await;
        Self::refresh_locked(&mut creds, self.api.as_ref(), now).await?;
        Ok(creds.access_token.clone())
    }

    /// Ensure validity and return the current access token.
    pub async fn access_token(&self) -> Result<String> {
        self.access_token_at(Utc::now()).await
    }

    /// Copy of the current state (for persisting rotated tokens).
    pub async fn snapshot(&self) -> Credentials {
        self.state.lock().await.clone()
    }

    async fn refresh_locked(
        creds: &mut Credentials,
        api: &dyn DriveApi,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if creds.is_valid_at(now) {
            return Ok(());
        }

        debug!("access token expired at {}, refreshing", creds.expiry);
        let grant = api
            .refresh_token(&creds.client_id, &creds.client_secret, &creds.refresh_token)
            .await
            .map_err(|e| match e {
                UploadError::Auth(msg) => UploadError::Auth(msg),
                other => UploadError::Auth(other.to_string()),
            })?;

        let expiry = ChronoDuration::try_seconds(grant.expires_in.max(0))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                UploadError::Auth(format!(
                    "token response has out-of-range expires_in: {}",
                    grant.expires_in
                ))
            })?;

        creds.access_token = grant.access_token;
        if let Some(refresh_token) = grant.refresh_token.filter(|t| !t.is_empty()) {
            creds.refresh_token = refresh_token;
        }
        creds.expiry = expiry;
        info!("access token refreshed, valid until {}", creds.expiry);
        Ok(())
    }
}
