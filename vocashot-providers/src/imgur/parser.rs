//! Imgur response parsing.

use serde::Deserialize;
use vocashot_upload::{RejectCause, UploadError};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Extracts `data.link` from a 2xx upload response.
pub fn parse_upload(body: &str) -> Result<String, UploadError> {
    let response: UploadResponse = serde_json::from_str(body)
        .map_err(|e| UploadError::InvalidResponse(format!("JSON error: {e}")))?;

    let data = response
        .data
        .ok_or_else(|| UploadError::InvalidResponse("missing data".to_string()))?;

    if response.success == Some(false) {
        let message = match data.error {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other
                .pointer("/message")
                .and_then(|m| m.as_str())
                .map_or_else(|| other.to_string(), str::to_string),
            None => "Unknown error".to_string(),
        };
        return Err(UploadError::rejected(RejectCause::Payload, message));
    }

    data.link
        .filter(|link| !link.is_empty())
        .ok_or_else(|| UploadError::InvalidResponse("missing data.link".to_string()))
}
