//! Remote path helpers.
//!
//! Remote paths are kept relative to the drive root without leading or
//! trailing slashes (`Public/videos/clip.mp4`); the empty string is the root.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in a path segment (RFC 3986 unreserved).
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Join path fragments, collapsing duplicate and surrounding slashes.
///
/// Segments are kept byte for byte; a name with surrounding spaces stays that
/// way.
pub fn join_remote_path(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|part| part.split(['/', '\\']))
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-encode each segment of a remote path.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a normalized remote path into parent and leaf name.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}
