//! rclone-style credential store parsing.
//!
//! The store is a sectioned `key = value` file:
//!
//! ```text
//! # comment
//! [oned]
//! type = onedrive
//! client_id = ...
//! token = {"access_token":"...","refresh_token":"...","expiry":"2024-05-01T10:00:00Z"}
//! ```

use serde::Deserialize;

use crate::error::{Result, UploadError};

/// One `[name]` section with its keys in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl Section {
    /// Value of `key`; the last assignment wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Token blob stored in the `token` key.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBlob {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expiry: String,
}

/// Split the store into sections.
///
/// Lines outside any section are ignored, as are blank lines and `#`/`;`
/// comments. Within a section, a line without `=` is an error.
pub fn parse_sections(text: &str) -> Result<Vec<Section>> {
    let mut sections: Vec<Section> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].trim();
            if name.is_empty() {
                return Err(UploadError::Config(format!(
                    "line {}: empty section name",
                    index + 1
                )));
            }
            sections.push(Section {
                name: name.to_string(),
                entries: Vec::new(),
            });
            continue;
        }

        let Some(section) = sections.last_mut() else {
            continue;
        };
        let Some((key, value)) = line.split_once('=') else {
            return Err(UploadError::Config(format!(
                "line {} in [{}]: expected key = value",
                index + 1,
                section.name
            )));
        };
        section
            .entries
            .push((key.trim().to_string(), value.trim().to_string()));
    }

    Ok(sections)
}

/// Parse the JSON `token` value of `section`.
pub fn parse_token(section: &str, raw: &str) -> Result<TokenBlob> {
    serde_json::from_str(raw)
        .map_err(|e| UploadError::Config(format!("[{}] token: malformed JSON: {}", section, e)))
}
