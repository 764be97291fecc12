//! Credential store and per-remote settings.

mod rclone;
mod registry;

use chrono::{DateTime, Utc};

pub use rclone::{parse_sections, Section, TokenBlob};
pub use registry::ConfigRegistry;

use crate::auth::Credentials;
use crate::error::{Result, UploadError};
use crate::path::{encode_path, join_remote_path};

/// Settings for one named remote.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expiry: DateTime<Utc>,
    pub drive_id: String,
    pub drive_type: String,
    /// Folder all uploads go under; empty means the drive root.
    pub root_folder: String,
    /// Public index URL used to build download links.
    pub base_url: Option<String>,
}

impl RemoteConfig {
    /// Validate a section and build the remote from it.
    pub fn from_section(section: &Section) -> Result<Self> {
        let name = section.name.as_str();
        let required = |key: &str| -> Result<String> {
            match section.get(key) {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => Err(UploadError::Config(format!(
                    "[{}] missing required key '{}'",
                    name, key
                ))),
            }
        };

        let client_id = required("client_id")?;
        let client_secret = required("client_secret")?;
        let token = rclone::parse_token(name, &required("token")?)?;
        let drive_id = required("drive_id")?;
        let drive_type = required("drive_type")?;

        if token.access_token.is_empty() || token.refresh_token.is_empty() {
            return Err(UploadError::Config(format!(
                "[{}] token: access_token and refresh_token are required",
                name
            )));
        }
        let expiry = DateTime::parse_from_rfc3339(&token.expiry)
            .map_err(|e| {
                UploadError::Config(format!(
                    "[{}] token: invalid expiry '{}': {}",
                    name, token.expiry, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(Self {
            name: name.to_string(),
            client_id,
            client_secret,
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expiry,
            drive_id,
            drive_type,
            root_folder: join_remote_path(&[section.get("root_folder").unwrap_or("")]),
            base_url: section
                .get("base_url")
                .filter(|url| !url.is_empty())
                .map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    /// Initial credential state for this remote.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expiry: self.expiry,
        }
    }

    /// Drive path for `file_name` inside `folder`, under the root folder.
    pub fn remote_path(&self, folder: &str, file_name: &str) -> String {
        join_remote_path(&[&self.root_folder, folder, file_name])
    }

    /// Public download link for `file_name` inside `folder`.
    ///
    /// The index serves the root folder as its top level, so it is not part
    /// of the link.
    pub fn download_url(&self, folder: &str, file_name: &str) -> Option<String> {
        let base = self.base_url.as_deref()?;
        let path = join_remote_path(&[folder, file_name]);
        Some(format!("{}/{}", base, encode_path(&path)))
    }
}
