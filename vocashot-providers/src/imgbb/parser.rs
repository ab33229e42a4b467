//! ImgBB response parsing.

use serde::Deserialize;
use vocashot_upload::{RejectCause, UploadError};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<UploadData>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    display_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Extracts the image URL from a 2xx upload response.
pub fn parse_upload(body: &str) -> Result<String, UploadError> {
    let response: UploadResponse = serde_json::from_str(body)
        .map_err(|e| UploadError::InvalidResponse(format!("JSON error: {e}")))?;

    if !response.success {
        let message = response
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Unknown error".to_string());
        let cause = if message.to_ascii_lowercase().contains("key") {
            RejectCause::Credential
        } else {
            RejectCause::Payload
        };
        return Err(UploadError::rejected(cause, message));
    }

    response
        .data
        .and_then(|d| d.url.or(d.display_url))
        .filter(|url| !url.is_empty())
        .ok_or_else(|| UploadError::InvalidResponse("missing data.url".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let body = r#"{
            "data": {
                "id": "2ndCYJK",
                "url": "https://i.ibb.co/w04Prt6/c1f64245afb2.gif",
                "display_url": "https://i.ibb.co/98W13PY/c1f64245afb2.gif"
            },
            "success": true,
            "status": 200
        }"#;
        assert_eq!(
            parse_upload(body).unwrap(),
            "https://i.ibb.co/w04Prt6/c1f64245afb2.gif"
        );
    }

    #[test]
    fn test_parse_api_error_mentioning_key() {
        let body = r#"{"status_code":400,"error":{"message":"Invalid API v1 key.","code":100},"success":false}"#;
        let err = parse_upload(body).unwrap_err();
        assert!(err.is_credential_problem());
    }

    #[test]
    fn test_parse_api_error_payload() {
        let body = r#"{"error":{"message":"Invalid image source"},"success":false}"#;
        let err = parse_upload(body).unwrap_err();
        assert!(!err.is_credential_problem());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_missing_url() {
        let err = parse_upload(r#"{"success":true,"data":{}}"#).unwrap_err();
        assert!(matches!(err, UploadError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_upload("<html>oops</html>"),
            Err(UploadError::InvalidResponse(_))
        ));
    }
}
