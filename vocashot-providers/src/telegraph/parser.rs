//! Telegraph response parsing.

use serde::Deserialize;
use vocashot_upload::{RejectCause, UploadError};

/// Telegraph answers with either a list of uploaded files or an error object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UploadResponse {
    Files(Vec<UploadedFile>),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    #[serde(default)]
    src: Option<String>,
}

/// Extracts the public URL from a 2xx upload response.
///
/// `public_base` is prepended to the relative `src` path.
pub fn parse_upload(body: &str, public_base: &str) -> Result<String, UploadError> {
    let response: UploadResponse = serde_json::from_str(body)
        .map_err(|e| UploadError::InvalidResponse(format!("JSON error: {e}")))?;

    match response {
        UploadResponse::Error { error } => {
            let cause = if error.to_ascii_lowercase().contains("too big") {
                RejectCause::TooLarge
            } else {
                RejectCause::Payload
            };
            Err(UploadError::rejected(cause, error))
        }
        UploadResponse::Files(files) => {
            let src = files
                .into_iter()
                .find_map(|f| f.src)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| UploadError::InvalidResponse("missing src".to_string()))?;

            if src.starts_with("http://") || src.starts_with("https://") {
                return Ok(src);
            }

            let base = public_base.trim_end_matches('/');
            if src.starts_with('/') {
                Ok(format!("{base}{src}"))
            } else {
                Ok(format!("{base}/{src}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://telegra.ph";

    #[test]
    fn test_parse_relative_src() {
        let url = parse_upload(r#"[{"src":"/file/abc123.jpg"}]"#, BASE).unwrap();
        assert_eq!(url, "https://telegra.ph/file/abc123.jpg");
    }

    #[test]
    fn test_parse_src_without_slash() {
        let url = parse_upload(r#"[{"src":"file/abc.png"}]"#, "https://telegra.ph/").unwrap();
        assert_eq!(url, "https://telegra.ph/file/abc.png");
    }

    #[test]
    fn test_parse_error_object() {
        let err = parse_upload(r#"{"error":"File type invalid"}"#, BASE).unwrap_err();
        assert!(matches!(
            err,
            UploadError::Rejected { cause: RejectCause::Payload, .. }
        ));
    }

    #[test]
    fn test_parse_too_big() {
        let err = parse_upload(r#"{"error":"File too big"}"#, BASE).unwrap_err();
        assert!(matches!(
            err,
            UploadError::Rejected { cause: RejectCause::TooLarge, .. }
        ));
    }

    #[test]
    fn test_parse_empty_array() {
        let err = parse_upload("[]", BASE).unwrap_err();
        assert!(matches!(err, UploadError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_upload("<html>", BASE).unwrap_err();
        assert!(!err.is_retryable());
    }
}
