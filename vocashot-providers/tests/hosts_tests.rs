//! Wire-level adapter tests against a local mock server.

use base64::{Engine, engine::general_purpose::STANDARD};
use mockito::Matcher;
use std::time::Duration;
use tempfile::TempDir;
use vocashot_core::{ImageAsset, ProviderKind, UrlCheck};
use vocashot_providers::{
    HostEndpoints, ImgBBHost, ImgurHost, PostImageHost, ProviderOverride, ProviderRegistry,
    TelegraphHost,
};
use vocashot_upload::{
    HttpClient, ImageHost, RejectCause, RetryPolicy, UploadError, UploadOrchestrator,
    UploadSettings,
};

// ============================================================================
// Helpers
// ============================================================================

const GIF_BYTES: &[u8] = b"GIF89a-not-really-an-image";

fn asset() -> ImageAsset {
    ImageAsset::original(GIF_BYTES.to_vec(), "shot.gif", "image/gif")
}

fn http() -> HttpClient {
    HttpClient::new().unwrap()
}

// ============================================================================
// ImgBB
// ============================================================================

#[tokio::test]
async fn test_imgbb_upload_sends_form_and_parses_url() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("key".into(), "k-123".into()),
            Matcher::UrlEncoded("image".into(), STANDARD.encode(GIF_BYTES)),
            Matcher::UrlEncoded("name".into(), "shot".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"success":true,"status":200,"data":{"url":"https://i.ibb.co/Xy/shot.gif"}}"#)
        .create_async()
        .await;

    let host = ImgBBHost::new("k-123", http()).with_endpoints(HostEndpoints::local(&server.url()));
    let url = host.upload(&asset()).await.unwrap();

    assert_eq!(url, "https://i.ibb.co/Xy/shot.gif");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_imgbb_bad_key_is_credential_problem() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/upload")
        .with_status(400)
        .with_body(r#"{"status_code":400,"error":{"message":"Invalid API v1 key.","code":100}}"#)
        .create_async()
        .await;

    let host = ImgBBHost::new("bad", http()).with_endpoints(HostEndpoints::local(&server.url()));
    let err = host.upload(&asset()).await.unwrap_err();

    assert!(err.is_credential_problem());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_imgbb_rate_limit_carries_retry_after() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/upload")
        .with_status(429)
        .with_header("retry-after", "7")
        .create_async()
        .await;

    let host = ImgBBHost::new("k", http()).with_endpoints(HostEndpoints::local(&server.url()));
    let err = host.upload(&asset()).await.unwrap_err();

    assert!(matches!(err, UploadError::RateLimited { retry_after: Some(7) }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_imgbb_server_error_is_retryable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/upload")
        .with_status(503)
        .create_async()
        .await;

    let host = ImgBBHost::new("k", http()).with_endpoints(HostEndpoints::local(&server.url()));
    let err = host.upload(&asset()).await.unwrap_err();
    assert!(matches!(err, UploadError::Unavailable(_)));
}

#[tokio::test]
async fn test_imgbb_connection_accepts_payload_rejection() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(400)
        .with_body(r#"{"error":{"message":"Invalid base64 string."}}"#)
        .create_async()
        .await;

    let host = ImgBBHost::new("k", http()).with_endpoints(HostEndpoints::local(&server.url()));
    assert!(host.test_connection().await);
}

#[tokio::test]
async fn test_imgbb_connection_rejects_bad_key() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(400)
        .with_body(r#"{"error":{"message":"Invalid API v1 key."}}"#)
        .create_async()
        .await;

    let host = ImgBBHost::new("k", http()).with_endpoints(HostEndpoints::local(&server.url()));
    assert!(!host.test_connection().await);
}

#[test]
fn test_imgbb_debug_hides_key() {
    let host = ImgBBHost::new("super-secret", http());
    assert!(!format!("{host:?}").contains("super-secret"));
}

// ============================================================================
// Telegraph
// ============================================================================

#[tokio::test]
async fn test_telegraph_upload_joins_src() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .match_body(Matcher::Regex(r#"name="file"; filename="shot.gif""#.into()))
        .with_status(200)
        .with_body(r#"[{"src":"/file/abc123.gif"}]"#)
        .create_async()
        .await;

    let host = TelegraphHost::new(http()).with_endpoints(HostEndpoints::local(&server.url()));
    let url = host.upload(&asset()).await.unwrap();

    assert_eq!(url, format!("{}/file/abc123.gif", server.url()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_telegraph_too_large() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/upload")
        .with_status(413)
        .create_async()
        .await;

    let host = TelegraphHost::new(http()).with_endpoints(HostEndpoints::local(&server.url()));
    let err = host.upload(&asset()).await.unwrap_err();
    assert!(matches!(
        err,
        UploadError::Rejected { cause: RejectCause::TooLarge, .. }
    ));
}

#[tokio::test]
async fn test_telegraph_verifies_own_urls_only() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("HEAD", "/file/abc.gif")
        .with_status(200)
        .with_header("content-type", "image/gif")
        .create_async()
        .await;

    let host = TelegraphHost::new(http()).with_endpoints(HostEndpoints::local(&server.url()));

    let own = format!("{}/file/abc.gif", server.url());
    assert_eq!(host.check_url(&own).await, UrlCheck::Verified);
    assert!(host.verify_url(&own).await);
    assert!(!host.verify_url("https://i.imgur.com/abc.gif").await);
}

#[tokio::test]
async fn test_telegraph_connection_probe() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/").with_status(200).create_async().await;

    let host = TelegraphHost::new(http()).with_endpoints(HostEndpoints::local(&server.url()));
    assert!(host.test_connection().await);
}

// ============================================================================
// PostImage
// ============================================================================

#[tokio::test]
async fn test_postimage_upload_scrapes_link() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="upload"; filename="shot.gif""#.into()),
            Matcher::Regex(r#"name="action"\r\n\r\nupload"#.into()),
            Matcher::Regex(r#"name="nsfw"\r\n\r\n0"#.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(r#"<input id="code_direct" value="https://i.postimg.cc/9Qk2/shot.gif">"#)
        .create_async()
        .await;

    let host = PostImageHost::new(http()).with_endpoints(HostEndpoints::local(&server.url()));
    let url = host.upload(&asset()).await.unwrap();

    assert_eq!(url, "https://i.postimg.cc/9Qk2/shot.gif");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_postimage_page_without_link() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/upload")
        .with_status(200)
        .with_body("<html>Something went wrong</html>")
        .create_async()
        .await;

    let host = PostImageHost::new(http()).with_endpoints(HostEndpoints::local(&server.url()));
    let err = host.upload(&asset()).await.unwrap_err();
    assert!(matches!(err, UploadError::InvalidResponse(_)));
    assert!(!err.is_retryable());
}

// ============================================================================
// Imgur
// ============================================================================

#[tokio::test]
async fn test_imgur_upload_sends_client_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .match_header("authorization", "Client-ID cid-42")
        .match_body(Matcher::Regex(r#"name="image"; filename="myshot.gif""#.into()))
        .with_status(200)
        .with_body(r#"{"data":{"link":"https://i.imgur.com/Ab1.gif"},"success":true,"status":200}"#)
        .create_async()
        .await;

    let host = ImgurHost::new("cid-42", http()).with_endpoints(HostEndpoints::local(&server.url()));
    let asset = ImageAsset::original(GIF_BYTES.to_vec(), "my shot!.gif", "image/gif");
    let url = host.upload(&asset).await.unwrap();

    assert_eq!(url, "https://i.imgur.com/Ab1.gif");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_imgur_forbidden_is_credential_problem() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/upload")
        .with_status(403)
        .with_body(r#"{"data":{"error":"Invalid client_id"},"success":false,"status":403}"#)
        .create_async()
        .await;

    let host = ImgurHost::new("nope", http()).with_endpoints(HostEndpoints::local(&server.url()));
    let err = host.upload(&asset()).await.unwrap_err();
    assert!(err.is_credential_problem());
    assert!(err.to_string().contains("Invalid client_id"));
}

#[tokio::test]
async fn test_imgur_connection_uses_auth() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_header("authorization", "Client-ID cid")
        .with_status(200)
        .with_body(r#"{"data":{"UserRemaining":500}}"#)
        .create_async()
        .await;

    let host = ImgurHost::new("cid", http()).with_endpoints(HostEndpoints::local(&server.url()));
    assert!(host.test_connection().await);
    mock.assert_async().await;
}

// ============================================================================
// Registry + Orchestrator
// ============================================================================

#[tokio::test]
async fn test_registry_hosts_fall_through_to_next_provider() {
    let mut telegraph = mockito::Server::new_async().await;
    let mut postimage = mockito::Server::new_async().await;

    let failing = telegraph
        .mock("POST", "/upload")
        .with_status(502)
        .expect(2)
        .create_async()
        .await;
    postimage
        .mock("POST", "/upload")
        .with_status(200)
        .with_body(r#"<a href="https://i.postimg.cc/Zz9/shot.png">"#)
        .create_async()
        .await;

    let hosts = ProviderRegistry::new()
        .with_endpoints(ProviderKind::Telegraph, HostEndpoints::local(&telegraph.url()))
        .with_endpoints(ProviderKind::PostImage, HostEndpoints::local(&postimage.url()))
        .with_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shot.png");
    let mut bytes = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
    bytes.extend_from_slice(&[0u8; 64]);
    std::fs::write(&path, bytes).unwrap();

    let settings = UploadSettings::default()
        .with_retry(RetryPolicy::new(2).with_base_delay(Duration::from_millis(1)))
        .with_verify_urls(false)
        .with_allowed_roots(vec![dir.path().to_path_buf()]);
    let orchestrator = UploadOrchestrator::new(hosts, settings).unwrap();

    let receipt = orchestrator.upload(&path, None).await.unwrap();

    assert_eq!(receipt.provider, "postimage");
    assert_eq!(receipt.url, "https://i.postimg.cc/Zz9/shot.png");
    assert_eq!(receipt.providers_tried(), 2);
    failing.assert_async().await;

    let stats = orchestrator.diagnostics().await;
    let telegraph_stats = stats.iter().find(|s| s.name == "telegraph").unwrap();
    assert_eq!(telegraph_stats.failure_count, 1);
}

#[tokio::test]
async fn test_registry_passes_credential_to_keyed_host() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload")
        .match_body(Matcher::UrlEncoded("key".into(), "from-registry".into()))
        .with_status(200)
        .with_body(r#"{"success":true,"data":{"url":"https://i.ibb.co/Q/shot.gif"}}"#)
        .create_async()
        .await;

    let hosts = ProviderRegistry::new()
        .with_credential(ProviderKind::ImgBB, " from-registry ")
        .with_endpoints(ProviderKind::ImgBB, HostEndpoints::local(&server.url()))
        .with_override(ProviderKind::Telegraph, ProviderOverride::disabled())
        .build()
        .unwrap();

    let imgbb = hosts.iter().find(|h| h.name() == "imgbb").unwrap();
    assert_eq!(imgbb.upload(&asset()).await.unwrap(), "https://i.ibb.co/Q/shot.gif");
    mock.assert_async().await;

    let telegraph = hosts.iter().find(|h| h.name() == "telegraph").unwrap();
    assert!(!telegraph.descriptor().enabled);
}
