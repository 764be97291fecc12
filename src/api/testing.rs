//! In-memory [`DriveApi`] for unit tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::types::{ChunkAck, ContentRange, DriveItem, TokenGrant};
use super::DriveApi;
use crate::error::{Result, UploadError};
use crate::path::split_parent;
use crate::quota::Quota;

pub(crate) const UPLOAD_URL: &str = "https://upload.example.test/session/1";
pub(crate) const ITEM_ID: &str = "ITEM123";

/// Knobs and recordings of a [`FakeDrive`].
#[derive(Debug)]
pub(crate) struct FakeState {
    pub refresh_calls: u32,
    pub grant_expires_in: i64,
    pub fail_refresh: bool,

    pub session_status: Option<u16>,
    pub sessions_opened: Vec<String>,
    pub sessions_deleted: u32,

    /// Failures still to inject per chunk start offset (`u32::MAX` = always).
    pub chunk_failures: HashMap<u64, u32>,
    pub chunk_attempts: HashMap<u64, u32>,
    pub uploaded: Vec<ContentRange>,
    pub received: u64,
    pub in_flight: usize,
    pub max_in_flight: usize,
    /// Name reported by the completing chunk; defaults to the session leaf.
    pub completed_name: Option<String>,

    pub item_status: Option<u16>,
    pub item_id: String,
    pub item_lookups: Vec<String>,

    pub hash_failures: u32,
    pub hash_calls: u32,
    /// Answer every hash fetch with an unreadable body.
    pub malformed_hash: bool,
    pub remote_hash: Option<String>,

    pub quota: Quota,
    pub tokens_seen: Vec<String>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            refresh_calls: 0,
            grant_expires_in: 3600,
            fail_refresh: false,
            session_status: None,
            sessions_opened: Vec::new(),
            sessions_deleted: 0,
            chunk_failures: HashMap::new(),
            chunk_attempts: HashMap::new(),
            uploaded: Vec::new(),
            received: 0,
            in_flight: 0,
            max_in_flight: 0,
            completed_name: None,
            item_status: None,
            item_id: ITEM_ID.to_string(),
            item_lookups: Vec::new(),
            hash_failures: 0,
            hash_calls: 0,
            malformed_hash: false,
            remote_hash: None,
            quota: Quota::default(),
            tokens_seen: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDrive {
    state: Mutex<FakeState>,
}

impl FakeDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Uploaded ranges sorted by start offset.
    pub fn uploaded_ranges(&self) -> Vec<(u64, u64)> {
        let mut ranges: Vec<_> = self
            .state()
            .uploaded
            .iter()
            .map(|r| (r.start, r.end))
            .collect();
        ranges.sort_unstable();
        ranges
    }
}

#[async_trait]
impl DriveApi for FakeDrive {
    async fn refresh_token(
        &self,
        _client_id: &str,
        _client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant> {
        let mut state = self.state();
        state.refresh_calls += 1;
        if state.fail_refresh {
            return Err(UploadError::Auth(format!(
                "token refresh failed, status: 400, response: invalid_grant: {}",
                refresh_token
            )));
        }
        Ok(TokenGrant {
            access_token: format!("access-{}", state.refresh_calls),
            refresh_token: Some(format!("refresh-{}", state.refresh_calls)),
            expires_in: state.grant_expires_in,
        })
    }

    async fn create_upload_session(&self, token: &str, remote_path: &str) -> Result<String> {
        let mut state = self.state();
        state.tokens_seen.push(token.to_string());
        if let Some(status) = state.session_status {
            return Err(UploadError::Session {
                status,
                body: "accessDenied: nope".to_string(),
            });
        }
        state.sessions_opened.push(remote_path.to_string());
        Ok(UPLOAD_URL.to_string())
    }

    async fn upload_chunk(
        &self,
        upload_url: &str,
        range: ContentRange,
        data: Vec<u8>,
    ) -> Result<ChunkAck> {
        {
            let mut state = self.state();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let mut state = self.state();
        state.in_flight -= 1;
        assert_eq!(upload_url, UPLOAD_URL);
        assert_eq!(data.len() as u64, range.end - range.start + 1);
        *state.chunk_attempts.entry(range.start).or_insert(0) += 1;

        if let Some(left) = state.chunk_failures.get_mut(&range.start) {
            if *left > 0 {
                if *left != u32::MAX {
                    *left -= 1;
                }
                return Err(UploadError::ChunkUpload {
                    start: range.start,
                    end: range.end,
                    status: Some(503),
                    message: "serviceNotAvailable: try later".to_string(),
                });
            }
        }

        state.uploaded.push(range);
        state.received += data.len() as u64;
        if state.received < range.total {
            return Ok(ChunkAck::Accepted);
        }

        let name = match &state.completed_name {
            Some(name) => name.clone(),
            None => state
                .sessions_opened
                .last()
                .map(|path| split_parent(path).1.to_string())
                .unwrap_or_default(),
        };
        Ok(ChunkAck::Completed(Some(DriveItem {
            id: state.item_id.clone(),
            name,
            size: Some(range.total),
        })))
    }

    async fn delete_upload_session(&self, _upload_url: &str) -> Result<()> {
        self.state().sessions_deleted += 1;
        Ok(())
    }

    async fn item_by_path(&self, token: &str, remote_path: &str) -> Result<DriveItem> {
        let mut state = self.state();
        state.tokens_seen.push(token.to_string());
        state.item_lookups.push(remote_path.to_string());
        if let Some(status) = state.item_status {
            return Err(UploadError::Metadata {
                path: remote_path.to_string(),
                status: Some(status),
                message: "itemNotFound: missing".to_string(),
            });
        }
        Ok(DriveItem {
            id: state.item_id.clone(),
            name: split_parent(remote_path).1.to_string(),
            size: None,
        })
    }

    async fn item_hash(&self, token: &str, item_id: &str) -> Result<Option<String>> {
        let mut state = self.state();
        state.tokens_seen.push(token.to_string());
        state.hash_calls += 1;
        if state.malformed_hash {
            return Err(UploadError::InvalidResponse {
                operation: "fetch item hash",
                message: "expected value at line 1 column 1".to_string(),
            });
        }
        if state.hash_failures > 0 {
            state.hash_failures -= 1;
            return Err(UploadError::HashFetch {
                item_id: item_id.to_string(),
                message: "status: 404, response: itemNotFound: pending".to_string(),
            });
        }
        Ok(state.remote_hash.clone())
    }

    async fn drive_quota(&self, token: &str) -> Result<Quota> {
        let mut state = self.state();
        state.tokens_seen.push(token.to_string());
        Ok(state.quota.clone())
    }
}
