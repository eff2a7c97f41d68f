//! Secure storage for the three session tokens.
//!
//! Tokens are persisted per key under a stable service name so they survive
//! process restarts but not reinstalls. The OS keychain backend is the
//! production store; `MemoryStore` backs headless composition and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use keyring::Entry;
use thiserror::Error;

/// Keychain service name the token entries are namespaced under
const SERVICE_NAME: &str = "com.phantom.auth";

/// The three independently-stored session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKey {
    Access,
    Id,
    Refresh,
}

impl TokenKey {
    pub const ALL: [TokenKey; 3] = [TokenKey::Access, TokenKey::Id, TokenKey::Refresh];

    /// Stable account name the token is stored under.
    pub fn account(self) -> &'static str {
        match self {
            TokenKey::Access => "phantom.accessToken",
            TokenKey::Id => "phantom.idToken",
            TokenKey::Refresh => "phantom.refreshToken",
        }
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    /// The underlying storage backend could not be reached. A failed write
    /// leaves the previously stored value in place.
    #[error("credential storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable per-key token storage.
///
/// The store has no expiry semantics; session validity is decided entirely
/// by the server rejecting stale tokens. Reads and writes are atomic per
/// key only - there is no transaction across the three-key bundle.
pub trait CredentialStore: Send + Sync {
    /// Overwrite any existing value for `key`.
    fn save(&self, key: TokenKey, value: &str) -> Result<(), CredentialError>;

    /// Returns `Ok(None)` if the key was never written or was deleted.
    fn read(&self, key: TokenKey) -> Result<Option<String>, CredentialError>;

    /// Idempotent; deleting an absent key is not an error.
    fn delete(&self, key: TokenKey) -> Result<(), CredentialError>;

    /// Delete all three tokens.
    fn delete_all(&self) -> Result<(), CredentialError> {
        for key in TokenKey::ALL {
            self.delete(key)?;
        }
        Ok(())
    }
}

/// Token storage in the OS keychain via `keyring`.
#[derive(Debug, Default)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(key: TokenKey) -> Result<Entry, CredentialError> {
        Entry::new(SERVICE_NAME, key.account())
            .map_err(|e| CredentialError::Unavailable(e.to_string()))
    }
}

impl CredentialStore for KeyringStore {
    fn save(&self, key: TokenKey, value: &str) -> Result<(), CredentialError> {
        Self::entry(key)?
            .set_password(value)
            .map_err(|e| CredentialError::Unavailable(e.to_string()))
    }

    fn read(&self, key: TokenKey) -> Result<Option<String>, CredentialError> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::Unavailable(e.to_string())),
        }
    }

    fn delete(&self, key: TokenKey) -> Result<(), CredentialError> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Unavailable(e.to_string())),
        }
    }
}

/// In-memory token storage for tests and headless embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<TokenKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn save(&self, key: TokenKey, value: &str) -> Result<(), CredentialError> {
        self.values
            .lock()
            .expect("credential store lock poisoned")
            .insert(key, value.to_string());
        Ok(())
    }

    fn read(&self, key: TokenKey) -> Result<Option<String>, CredentialError> {
        Ok(self
            .values
            .lock()
            .expect("credential store lock poisoned")
            .get(&key)
            .cloned())
    }

    fn delete(&self, key: TokenKey) -> Result<(), CredentialError> {
        self.values
            .lock()
            .expect("credential store lock poisoned")
            .remove(&key);
        Ok(())
    }
}
