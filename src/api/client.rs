//! Graph drive client with request/response handling.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::error::describe_body;
use super::types::{ChunkAck, ContentRange, DriveItem, ItemFileFacet, TokenGrant, UploadSessionResponse};
use super::DriveApi;
use crate::error::{Result, UploadError};
use crate::http::{HttpClient, HttpResponse};
use crate::path::encode_path;
use crate::quota::Quota;

/// OAuth token endpoint for personal and work accounts.
const TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";

/// Graph API root.
const GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// Endpoint roots used by [`GraphClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEndpoints {
    pub token_url: String,
    pub graph_base: String,
}

impl Default for GraphEndpoints {
    fn default() -> Self {
        Self {
            token_url: TOKEN_URL.to_string(),
            graph_base: GRAPH_URL.to_string(),
        }
    }
}

impl GraphEndpoints {
    fn drive_url(&self) -> String {
        format!("{}/me/drive", self.graph_base.trim_end_matches('/'))
    }

    /// URL addressing an item by path, e.g. `.../me/drive/root:/a/b.txt`.
    fn path_url(&self, remote_path: &str) -> String {
        format!("{}/root:/{}", self.drive_url(), encode_path(remote_path))
    }

    fn session_url(&self, remote_path: &str) -> String {
        format!("{}:/createUploadSession", self.path_url(remote_path))
    }

    fn item_hash_url(&self, item_id: &str) -> String {
        format!(
            "{}/items/{}?select=id,file",
            self.drive_url(),
            encode_path(item_id)
        )
    }
}

#[derive(Debug, Deserialize)]
struct DriveRecord {
    #[serde(default)]
    quota: Option<Quota>,
}

/// Graph-backed [`DriveApi`].
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: HttpClient,
    endpoints: GraphEndpoints,
}

impl GraphClient {
    /// Create a client against the public Graph endpoints.
    pub fn new(http: HttpClient) -> Self {
        Self::with_endpoints(http, GraphEndpoints::default())
    }

    /// Create a client against custom endpoints (national clouds, tests).
    pub fn with_endpoints(http: HttpClient, endpoints: GraphEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// Endpoints in use.
    pub fn endpoints(&self) -> &GraphEndpoints {
        &self.endpoints
    }
}

#[async_trait]
impl DriveApi for GraphClient {
    async fn refresh_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant> {
        debug!("refreshing access token via {}", self.endpoints.token_url);
        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post_form(&self.endpoints.token_url, &form)
            .await
            .map_err(|e| UploadError::Auth(format!("token refresh request failed: {}", e)))?;

        if !response.is_success() {
            return Err(UploadError::Auth(format!(
                "token refresh failed, status: {}, response: {}",
                response.status,
                describe_body(&response.body)
            )));
        }

        let grant: TokenGrant = serde_json::from_str(&response.body)
            .map_err(|e| UploadError::Auth(format!("malformed token response: {}", e)))?;
        if grant.access_token.is_empty() {
            return Err(UploadError::Auth(
                "token response carried no access token".to_string(),
            ));
        }

        Ok(grant)
    }

    async fn create_upload_session(&self, token: &str, remote_path: &str) -> Result<String> {
        let url = self.endpoints.session_url(remote_path);
        debug!("creating upload session: {}", url);

        let body = json!({
            "item": {
                "@microsoft.graph.conflictBehavior": "rename"
            }
        });
        let response = self.http.post_json(&url, token, &body).await?;

        if !response.is_success() {
            return Err(UploadError::Session {
                status: response.status,
                body: describe_body(&response.body),
            });
        }

        let session: UploadSessionResponse =
            serde_json::from_str(&response.body).map_err(|e| UploadError::InvalidResponse {
                operation: "create upload session",
                message: e.to_string(),
            })?;
        if session.upload_url.is_empty() {
            return Err(UploadError::InvalidResponse {
                operation: "create upload session",
                message: "empty uploadUrl".to_string(),
            });
        }

        Ok(session.upload_url)
    }

    async fn upload_chunk(
        &self,
        upload_url: &str,
        range: ContentRange,
        data: Vec<u8>,
    ) -> Result<ChunkAck> {
        let header = range.to_string();
        debug!("uploading {}", header);

        let response = self
            .http
            .put_range(upload_url, &header, data)
            .await
            .map_err(|e| UploadError::ChunkUpload {
                start: range.start,
                end: range.end,
                status: None,
                message: e.to_string(),
            })?;

        chunk_ack(range, &response)
    }

    async fn delete_upload_session(&self, upload_url: &str) -> Result<()> {
        let response = self.http.delete(upload_url).await?;
        if !response.is_success() {
            return Err(UploadError::Api {
                operation: "discard upload session",
                status: response.status,
                body: describe_body(&response.body),
            });
        }
        Ok(())
    }

    async fn item_by_path(&self, token: &str, remote_path: &str) -> Result<DriveItem> {
        let url = self.endpoints.path_url(remote_path);
        debug!("resolving item: {}", url);

        let metadata_err = |status: Option<u16>, message: String| UploadError::Metadata {
            path: remote_path.to_string(),
            status,
            message,
        };

        let response = self
            .http
            .get(&url, token)
            .await
            .map_err(|e| metadata_err(None, e.to_string()))?;

        if !response.is_success() {
            return Err(metadata_err(
                Some(response.status),
                describe_body(&response.body),
            ));
        }

        serde_json::from_str(&response.body)
            .map_err(|e| metadata_err(None, format!("malformed item record: {}", e)))
    }

    async fn item_hash(&self, token: &str, item_id: &str) -> Result<Option<String>> {
        let url = self.endpoints.item_hash_url(item_id);

        let response =
            self.http
                .get(&url, token)
                .await
                .map_err(|e| UploadError::HashFetch {
                    item_id: item_id.to_string(),
                    message: e.to_string(),
                })?;

        item_hash_from(item_id, &response)
    }

    async fn drive_quota(&self, token: &str) -> Result<Quota> {
        let response = self.http.get(&self.endpoints.drive_url(), token).await?;

        if !response.is_success() {
            return Err(UploadError::Api {
                operation: "fetch drive quota",
                status: response.status,
                body: describe_body(&response.body),
            });
        }

        let drive: DriveRecord =
            serde_json::from_str(&response.body).map_err(|e| UploadError::InvalidResponse {
                operation: "fetch drive quota",
                message: e.to_string(),
            })?;

        drive.quota.ok_or_else(|| UploadError::InvalidResponse {
            operation: "fetch drive quota",
            message: "drive record has no quota".to_string(),
        })
    }
}

/// Classify the reply to a chunk PUT: 202 continues, 200/201 completes,
/// anything else fails the range.
fn chunk_ack(range: ContentRange, response: &HttpResponse) -> Result<ChunkAck> {
    match response.status {
        202 => Ok(ChunkAck::Accepted),
        200 | 201 => Ok(ChunkAck::Completed(
            serde_json::from_str::<DriveItem>(&response.body).ok(),
        )),
        status => Err(UploadError::ChunkUpload {
            start: range.start,
            end: range.end,
            status: Some(status),
            message: describe_body(&response.body),
        }),
    }
}

/// Read the QuickXorHash out of an item reply.
///
/// A non-success status is a (retryable) `HashFetch` failure; a body that is
/// not an item record is `InvalidResponse`.
fn item_hash_from(item_id: &str, response: &HttpResponse) -> Result<Option<String>> {
    if !response.is_success() {
        return Err(UploadError::HashFetch {
            item_id: item_id.to_string(),
            message: format!(
                "status: {}, response: {}",
                response.status,
                describe_body(&response.body)
            ),
        });
    }

    let item: ItemFileFacet =
        serde_json::from_str(&response.body).map_err(|e| UploadError::InvalidResponse {
            operation: "fetch item hash",
            message: e.to_string(),
        })?;

    Ok(item.quick_xor_hash())
}
