//! Host credentials in the system keychain.
//!
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet)
//!
//! Entries live under service `Vocashot-<provider>`, account `api_key`.
//!
//! ```ignore
//! use vocashot_store::keychain;
//!
//! keychain::store_api_key("imgbb", "0123abcd")?;
//! if keychain::has_api_key("imgbb") {
//!     println!("ImgBB key is configured");
//! }
//! keychain::delete_api_key("imgbb")?;
//! ```

use keyring::Entry;
use tracing::debug;

use crate::error::StoreError;

/// Service name prefix for Vocashot credentials.
const SERVICE_PREFIX: &str = "Vocashot";

/// Account name used for every entry.
const ACCOUNT: &str = "api_key";

fn service_name(provider: &str) -> String {
    format!("{SERVICE_PREFIX}-{provider}")
}

fn entry(provider: &str) -> Result<Entry, StoreError> {
    Entry::new(&service_name(provider), ACCOUNT)
        .map_err(|e| StoreError::Keychain(format!("Failed to create keychain entry: {e}")))
}

/// Stores a credential.
///
/// # Errors
///
/// Returns [`StoreError::Keychain`] if the keychain rejects the write.
pub fn store_api_key(provider: &str, api_key: &str) -> Result<(), StoreError> {
    entry(provider)?
        .set_password(api_key)
        .map_err(|e| StoreError::Keychain(format!("Failed to store API key: {e}")))?;

    debug!(provider, "API key stored in keychain");
    Ok(())
}

/// Retrieves a credential. Missing, blank and unreadable entries all yield `None`.
pub fn get_api_key(provider: &str) -> Option<String> {
    let entry = entry(provider).ok()?;
    match entry.get_password() {
        Ok(key) if !key.trim().is_empty() => {
            debug!(provider, "API key retrieved from keychain");
            Some(key)
        }
        Ok(_) | Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            debug!(provider, error = %e, "Keychain lookup failed");
            None
        }
    }
}

/// Deletes a credential. Deleting a missing entry succeeds.
///
/// # Errors
///
/// Returns [`StoreError::Keychain`] for any other failure.
pub fn delete_api_key(provider: &str) -> Result<(), StoreError> {
    match entry(provider)?.delete_credential() {
        Ok(()) => {
            debug!(provider, "API key deleted from keychain");
            Ok(())
        }
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(StoreError::Keychain(format!("Failed to delete API key: {e}"))),
    }
}

/// Returns true if a non-empty credential is stored.
pub fn has_api_key(provider: &str) -> bool {
    get_api_key(provider).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_format() {
        assert_eq!(service_name("imgbb"), "Vocashot-imgbb");
        assert_eq!(service_name("imgur"), "Vocashot-imgur");
    }
}
