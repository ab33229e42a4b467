//! Credential lookup for keyed hosts.
//!
//! Sources are tried in order:
//!
//! 1. Environment (`IMGBB_API_KEY`, `IMGUR_CLIENT_ID`)
//! 2. `<dir>/imgbb_credentials.json` / `<dir>/imgur_credentials.json`
//! 3. The system keychain
//!
//! A credential file that exists but is unusable is an error rather than a
//! silent fallthrough.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use vocashot_core::ProviderKind;

use crate::error::StoreError;
use crate::keychain;

// ============================================================================
// Source Table
// ============================================================================

/// Where a keyed host's credential may come from.
struct CredentialSpec {
    env_var: &'static str,
    file_name: &'static str,
    field: &'static str,
}

fn spec_for(kind: ProviderKind) -> Option<CredentialSpec> {
    match kind {
        ProviderKind::ImgBB => Some(CredentialSpec {
            env_var: "IMGBB_API_KEY",
            file_name: "imgbb_credentials.json",
            field: "api_key",
        }),
        ProviderKind::Imgur => Some(CredentialSpec {
            env_var: "IMGUR_CLIENT_ID",
            file_name: "imgur_credentials.json",
            field: "client_id",
        }),
        ProviderKind::Telegraph | ProviderKind::PostImage => None,
    }
}

// ============================================================================
// Credential
// ============================================================================

/// Where a credential was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "detail")]
pub enum CredentialSource {
    /// Environment variable.
    Environment(String),
    /// JSON credential file.
    File(PathBuf),
    /// System keychain.
    Keychain,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment(var) => write!(f, "env {var}"),
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Keychain => f.write_str("keychain"),
        }
    }
}

/// A resolved credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Host it belongs to.
    pub kind: ProviderKind,
    /// The secret itself.
    pub secret: String,
    /// Where it came from.
    pub source: CredentialSource,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .field("secret", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolves credentials from environment, files and keychain.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    search_dir: PathBuf,
    env: Option<BTreeMap<String, String>>,
    use_keychain: bool,
}

impl CredentialResolver {
    /// Looks for credential files in `search_dir`.
    pub fn new(search_dir: impl Into<PathBuf>) -> Self {
        Self {
            search_dir: search_dir.into(),
            env: None,
            use_keychain: true,
        }
    }

    /// Looks for credential files in the current working directory.
    pub fn from_current_dir() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Uses `vars` instead of the process environment.
    #[must_use]
    pub fn with_env(mut self, vars: BTreeMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Skips the keychain.
    #[must_use]
    pub fn without_keychain(mut self) -> Self {
        self.use_keychain = false;
        self
    }

    /// Directory searched for credential files.
    pub fn search_dir(&self) -> &Path {
        &self.search_dir
    }

    /// Resolves the credential for `kind`.
    ///
    /// Keyless hosts always resolve to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Credential`] if a credential file exists but is
    /// unreadable, malformed or lacks the expected field.
    #[instrument(skip(self), fields(provider = %kind))]
    pub fn resolve(&self, kind: ProviderKind) -> Result<Option<Credential>, StoreError> {
        let Some(spec) = spec_for(kind) else {
            return Ok(None);
        };

        if let Some(secret) = self.env_var(spec.env_var) {
            debug!(var = spec.env_var, "Credential from environment");
            return Ok(Some(Credential {
                kind,
                secret,
                source: CredentialSource::Environment(spec.env_var.to_string()),
            }));
        }

        let path = self.search_dir.join(spec.file_name);
        if path.is_file() {
            let secret = read_credential_file(&path, spec.field)?;
            debug!(path = %path.display(), "Credential from file");
            return Ok(Some(Credential {
                kind,
                secret,
                source: CredentialSource::File(path),
            }));
        }

        if self.use_keychain {
            if let Some(secret) = keychain::get_api_key(kind.cli_name()) {
                return Ok(Some(Credential {
                    kind,
                    secret,
                    source: CredentialSource::Keychain,
                }));
            }
        }

        debug!("No credential found");
        Ok(None)
    }

    /// Resolves every keyed host that has a credential.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve).
    pub fn resolve_all(&self) -> Result<Vec<Credential>, StoreError> {
        let mut found = Vec::new();
        for kind in ProviderKind::all() {
            if let Some(credential) = self.resolve(*kind)? {
                found.push(credential);
            }
        }
        Ok(found)
    }

    fn env_var(&self, key: &str) -> Option<String> {
        let value = match &self.env {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }?;
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

fn read_credential_file(path: &Path, field: &str) -> Result<String, StoreError> {
    let invalid = |reason: String| StoreError::Credential {
        path: path.display().to_string(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let json: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| invalid(format!("invalid JSON: {e}")))?;

    json.get(field)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| invalid(format!("missing \"{field}\"")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(dir: &TempDir, vars: &[(&str, &str)]) -> CredentialResolver {
        CredentialResolver::new(dir.path())
            .with_env(
                vars.iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
            )
            .without_keychain()
    }

    #[test]
    fn test_keyless_hosts_need_nothing() {
        let dir = TempDir::new().unwrap();
        let r = resolver(&dir, &[]);
        assert!(r.resolve(ProviderKind::Telegraph).unwrap().is_none());
        assert!(r.resolve(ProviderKind::PostImage).unwrap().is_none());
    }

    #[test]
    fn test_environment_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("imgbb_credentials.json"), r#"{"api_key":"from-file"}"#).unwrap();

        let r = resolver(&dir, &[("IMGBB_API_KEY", " from-env ")]);
        let credential = r.resolve(ProviderKind::ImgBB).unwrap().unwrap();
        assert_eq!(credential.secret, "from-env");
        assert_eq!(credential.source, CredentialSource::Environment("IMGBB_API_KEY".into()));
    }

    #[test]
    fn test_file_fallback() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("imgur_credentials.json"), r#"{"client_id":"cid"}"#).unwrap();

        let r = resolver(&dir, &[("IMGUR_CLIENT_ID", "   ")]);
        let credential = r.resolve(ProviderKind::Imgur).unwrap().unwrap();
        assert_eq!(credential.secret, "cid");
        assert!(matches!(credential.source, CredentialSource::File(_)));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("imgbb_credentials.json"), "not json").unwrap();
        let err = resolver(&dir, &[]).resolve(ProviderKind::ImgBB).unwrap_err();
        assert!(matches!(err, StoreError::Credential { .. }));
    }

    #[test]
    fn test_file_missing_field_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("imgur_credentials.json"), r#"{"api_key":"wrong field"}"#).unwrap();
        let err = resolver(&dir, &[]).resolve(ProviderKind::Imgur).unwrap_err();
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn test_resolve_all() {
        let dir = TempDir::new().unwrap();
        let r = resolver(&dir, &[("IMGUR_CLIENT_ID", "cid")]);
        let all = r.resolve_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind, ProviderKind::Imgur);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credential = Credential {
            kind: ProviderKind::ImgBB,
            secret: "hunter2".into(),
            source: CredentialSource::Keychain,
        };
        assert!(!format!("{credential:?}").contains("hunter2"));
    }
}
