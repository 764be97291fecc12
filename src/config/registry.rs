//! All remotes of a credential store.

use std::path::Path;

use tracing::debug;

use super::rclone::{parse_sections, Section};
use super::RemoteConfig;
use crate::error::{Result, UploadError};

/// Parsed credential store, built once and passed by reference.
///
/// Sections are validated lazily by [`ConfigRegistry::remote`] so that one
/// broken remote does not prevent using the others.
#[derive(Debug, Clone, Default)]
pub struct ConfigRegistry {
    sections: Vec<Section>,
}

impl ConfigRegistry {
    /// Parse a credential store from text.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            sections: parse_sections(text)?,
        })
    }

    /// Read and parse a credential store file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading credential store from {}", path.display());
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            UploadError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Remote names in file order, without duplicates.
    pub fn remote_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for section in &self.sections {
            if !names.contains(&section.name.as_str()) {
                names.push(&section.name);
            }
        }
        names
    }

    /// Validated settings for remote `name`.
    ///
    /// A section name repeated in the file merges its keys, later ones
    /// winning.
    pub fn remote(&self, name: &str) -> Result<RemoteConfig> {
        if !self.sections.iter().any(|s| s.name == name) {
            return Err(UploadError::Config(format!(
                "no remote named '{}' in credential store",
                name
            )));
        }

        let entries: Vec<(String, String)> = self
            .sections
            .iter()
            .filter(|s| s.name == name)
            .flat_map(|s| s.entries.iter().cloned())
            .collect();

        RemoteConfig::from_section(&Section {
            name: name.to_string(),
            entries,
        })
    }

    /// Drive path for an upload to `remote`, including its root folder.
    pub fn remote_path(&self, remote: &str, folder: &str, file_name: &str) -> Result<String> {
        Ok(self.remote(remote)?.remote_path(folder, file_name))
    }

    /// Public download link for a file uploaded to `remote`.
    pub fn download_url(&self, remote: &str, folder: &str, file_name: &str) -> Result<Option<String>> {
        Ok(self.remote(remote)?.download_url(folder, file_name))
    }
}
