//! PostImage HTML scraping.

use regex::Regex;
use std::sync::LazyLock;
use vocashot_upload::UploadError;

// ============================================================================
// Regex Patterns
// ============================================================================

static DIRECT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://i\.postimg\.cc/[a-zA-Z0-9/]+\.[a-zA-Z]{3,4}").expect("Invalid regex")
});

static PAGE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://postimg\.cc/[a-zA-Z0-9]+").expect("Invalid regex"));

/// Extracts the image URL from the upload page.
///
/// Direct image links are preferred over gallery page links.
pub fn parse_upload(html: &str) -> Result<String, UploadError> {
    [&*DIRECT_LINK_RE, &*PAGE_LINK_RE]
        .into_iter()
        .find_map(|re| re.find(html))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| UploadError::InvalidResponse("no image URL in response page".to_string()))
}
