//! Resolve the uploaded item once every chunk has landed.

use tracing::{debug, info};

use crate::api::{DriveApi, DriveItem};
use crate::auth::CredentialManager;
use crate::error::{Result, UploadError};
use crate::path::{join_remote_path, split_parent};

/// Look up the uploaded item by path.
///
/// The identifier always comes from a path query, never from the final chunk
/// response. When that response reports a different leaf name (the service
/// renamed the file on conflict), the renamed path is queried instead.
pub async fn resolve_item(
    api: &dyn DriveApi,
    credentials: &CredentialManager,
    remote_path: &str,
    completed: Option<&DriveItem>,
) -> Result<DriveItem> {
    let (parent, requested_name) = split_parent(remote_path);
    let lookup_path = match completed.map(|item| item.name.as_str()) {
        Some(name) if !name.is_empty() && name != requested_name => {
            info!("service renamed {} to {}", requested_name, name);
            join_remote_path(&[parent, name])
        }
        _ => remote_path.to_string(),
    };

    debug!("resolving uploaded item at {}", lookup_path);
    let token = credentials.access_token().await?;
    let item = api.item_by_path(&token, &lookup_path).await?;

    if item.id.is_empty() {
        return Err(UploadError::Metadata {
            path: lookup_path,
            status: None,
            message: "item record has an empty id".to_string(),
        });
    }

    Ok(item)
}
