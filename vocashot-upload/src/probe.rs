//! Probes shared by the host adapters.

use reqwest::StatusCode;
use tracing::debug;
use vocashot_core::UrlCheck;

use crate::http::{HttpClient, ResponseExt};

/// Checks that `url` belongs to the host and serves an image.
///
/// The URL must start with one of `prefixes`; then a HEAD request must
/// answer 200 with an `image/*` content type. A 429 yields
/// [`UrlCheck::Unverifiable`] since the host refused to say either way.
pub async fn check_image_url(http: &HttpClient, url: &str, prefixes: &[&str]) -> UrlCheck {
    if !prefixes.iter().any(|p| url.starts_with(p)) {
        return UrlCheck::NotVerified(format!("unexpected URL shape: {url}"));
    }

    let response = match http.head(url).await {
        Ok(r) => r,
        Err(e) => {
            debug!(url, error = %e, "URL probe failed");
            return UrlCheck::NotVerified(e.to_string());
        }
    };

    if response.is_rate_limited() {
        return UrlCheck::Unverifiable("rate limited during verification".to_string());
    }

    let status = response.status();
    if status != StatusCode::OK {
        return UrlCheck::NotVerified(format!("HTTP {}", status.as_u16()));
    }

    if response.has_image_content_type() {
        UrlCheck::Verified
    } else {
        UrlCheck::NotVerified("not an image content type".to_string())
    }
}

/// Returns true if a GET to `url` succeeds.
pub async fn probe_reachable(http: &HttpClient, url: &str) -> bool {
    match http.get(url).await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!(url, error = %e, "Reachability probe failed");
            false
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_foreign_url_not_verified() {
        let http = HttpClient::new().unwrap();
        let check = check_image_url(&http, "https://evil.com/x.png", &["https://i.ibb.co/"]).await;
        assert!(matches!(check, UrlCheck::NotVerified(_)));
    }

    #[tokio::test]
    async fn test_image_content_type_verifies() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/abc.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .create_async()
            .await;

        let http = HttpClient::new().unwrap();
        let url = format!("{}/abc.png", server.url());
        let check = check_image_url(&http, &url, &[server.url().as_str()]).await;

        assert_eq!(check, UrlCheck::Verified);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_html_not_verified() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/page")
            .with_status(200)
            .with_header("content-type", "text/html")
            .create_async()
            .await;

        let http = HttpClient::new().unwrap();
        let url = format!("{}/page", server.url());
        let check = check_image_url(&http, &url, &[server.url().as_str()]).await;
        assert!(matches!(check, UrlCheck::NotVerified(_)));
    }

    #[tokio::test]
    async fn test_rate_limited_is_unverifiable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/abc.png")
            .with_status(429)
            .create_async()
            .await;

        let http = HttpClient::new().unwrap();
        let url = format!("{}/abc.png", server.url());
        let check = check_image_url(&http, &url, &[server.url().as_str()]).await;
        assert!(matches!(check, UrlCheck::Unverifiable(_)));
        assert!(!check.is_verified());
    }

    #[tokio::test]
    async fn test_probe_reachable() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/").with_status(200).create_async().await;

        let http = HttpClient::new().unwrap();
        assert!(probe_reachable(&http, &server.url()).await);
    }
}
