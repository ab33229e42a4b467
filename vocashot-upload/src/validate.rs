//! Source file validation.
//!
//! [`ImageValidator`] resolves a caller-supplied path to a canonical file
//! under one of the allowed roots and checks its size. It never writes.

use image::ImageFormat;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument};

use crate::error::ValidationError;

/// Raster formats accepted as upload sources.
pub const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Bytes read to identify the format.
const SNIFF_LEN: u64 = 16;

/// A validated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Canonical absolute path.
    pub path: PathBuf,
    /// File size in bytes at validation time.
    pub size: u64,
    /// Format identified from the file header.
    pub format: ImageFormat,
}

impl ResolvedPath {
    /// File name component, or `image` if the path has none.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned())
    }
}

// ============================================================================
// Image Validator
// ============================================================================

/// Checks candidate files before any provider sees them.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    allowed_roots: Vec<PathBuf>,
    max_bytes: u64,
}

impl ImageValidator {
    /// Creates a validator for the given roots and hard size ceiling.
    ///
    /// An empty root list means "the current working directory".
    pub fn new(allowed_roots: Vec<PathBuf>, max_bytes: u64) -> Self {
        Self {
            allowed_roots,
            max_bytes,
        }
    }

    /// The hard size ceiling.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Resolves and checks `path`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] that applies.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn validate(&self, path: &Path) -> Result<ResolvedPath, ValidationError> {
        match tokio::fs::symlink_metadata(path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ValidationError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(ValidationError::Io(e)),
        }

        let canonical = match tokio::fs::canonicalize(path).await {
            Ok(p) => p,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // Dangling symlink.
                return Err(ValidationError::NotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(ValidationError::UnsafePath {
                    path: path.to_path_buf(),
                    reason: format!("cannot resolve: {e}"),
                });
            }
        };

        let metadata = tokio::fs::metadata(&canonical).await?;
        if !metadata.is_file() {
            return Err(ValidationError::NotAFile(path.to_path_buf()));
        }

        self.check_roots(path, &canonical).await?;

        let size = metadata.len();
        if size == 0 {
            return Err(ValidationError::Empty(path.to_path_buf()));
        }
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }

        let format = sniff_format(&canonical).await?;

        debug!(resolved = %canonical.display(), size, ?format, "Image validated");
        Ok(ResolvedPath {
            path: canonical,
            size,
            format,
        })
    }

    async fn check_roots(&self, original: &Path, canonical: &Path) -> Result<(), ValidationError> {
        let roots = if self.allowed_roots.is_empty() {
            vec![std::env::current_dir()?]
        } else {
            self.allowed_roots.clone()
        };

        for root in roots {
            // Roots that don't exist can't contain anything.
            let Ok(root) = tokio::fs::canonicalize(&root).await else {
                continue;
            };
            if canonical != root && canonical.starts_with(&root) {
                return Ok(());
            }
        }

        Err(ValidationError::UnsafePath {
            path: original.to_path_buf(),
            reason: "outside allowed directories".to_string(),
        })
    }
}

async fn sniff_format(path: &Path) -> Result<ImageFormat, ValidationError> {
    let file = tokio::fs::File::open(path).await?;
    let mut header = Vec::with_capacity(16);
    file.take(SNIFF_LEN).read_to_end(&mut header).await?;

    match image::guess_format(&header) {
        Ok(format) if ACCEPTED_FORMATS.contains(&format) => Ok(format),
        Ok(format) => Err(ValidationError::UnsupportedFormat(format!("{format:?}"))),
        Err(_) => Err(ValidationError::UnsupportedFormat(
            "unrecognized data".to_string(),
        )),
    }
}

// ============================================================================
// Tests
// ============================================================================
