//! Graph error bodies.

use serde::Deserialize;

/// Longest raw body kept in an error message.
const MAX_BODY_CHARS: usize = 512;

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorDetail,
}

/// Error object returned by Graph (`{"error":{"code":..,"message":..}}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Token endpoint error (`{"error":"invalid_grant","error_description":..}`).
#[derive(Debug, Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Parse a Graph error body, if it is one.
pub fn parse_graph_error(body: &str) -> Option<GraphErrorDetail> {
    serde_json::from_str::<GraphErrorEnvelope>(body)
        .ok()
        .map(|e| e.error)
}

/// Condense a response body for diagnostics.
///
/// Known error shapes become `code: message`; anything else is kept verbatim
/// up to a length cap.
pub fn describe_body(body: &str) -> String {
    if let Some(detail) = parse_graph_error(body) {
        return format!("{}: {}", detail.code, detail.message);
    }
    if let Ok(err) = serde_json::from_str::<OAuthError>(body) {
        let first_line = err.error_description.lines().next().unwrap_or("");
        return format!("{}: {}", err.error, first_line);
    }

    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_BODY_CHARS {
        let cut: String = trimmed.chars().take(MAX_BODY_CHARS).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}
