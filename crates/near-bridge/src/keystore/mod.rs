//! Key storage.
//!
//! A [`KeyStore`] maps `(network_id, account_id)` to one [`KeyPair`]. Writing
//! the same pair again replaces the previous key. Different storage media
//! implement the same trait:
//!
//! | Store | Medium |
//! |-------|--------|
//! | [`FileKeyStore`] | One JSON file per key under a directory |
//! | [`LocalStorageKeyStore`] | A browser-style string key/value area |
//! | [`InMemoryKeyStore`] | Process memory (testing, scripts) |
//!
//! All stores report a missing key as [`KeyStoreError::KeyNotFound`] and a
//! stored-but-incomplete record as [`KeyStoreError::MalformedRecord`], so
//! signers never need to know which medium they read from.

mod file;
mod in_memory;
mod local_storage;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::KeyStoreError;
use crate::types::{AccountId, KeyPair, NetworkId};

pub use file::FileKeyStore;
pub use in_memory::InMemoryKeyStore;
pub use local_storage::{DEFAULT_PREFIX, LocalStorageKeyStore, MemoryStorage, StorageArea};

/// Persistent or in-memory credential storage.
///
/// # Example
///
/// ```rust
/// use near_bridge::{AccountId, InMemoryKeyStore, KeyPair, KeyStore, NetworkId};
///
/// # fn example() -> Result<(), near_bridge::Error> {
/// let store = InMemoryKeyStore::new();
/// let alice: AccountId = "alice.near".parse()?;
/// let network: NetworkId = "testnet".parse()?;
///
/// store.set_key(&alice, &KeyPair::new("P", "S"), &network)?;
/// assert_eq!(store.get_key(&alice, &network)?, KeyPair::new("P", "S"));
/// assert_eq!(store.get_account_ids(&network)?, vec![alice]);
/// # Ok(())
/// # }
/// ```
pub trait KeyStore: Send + Sync {
    /// Store a key, replacing any key already stored for the pair.
    fn set_key(
        &self,
        account_id: &AccountId,
        key_pair: &KeyPair,
        network_id: &NetworkId,
    ) -> Result<(), KeyStoreError>;

    /// Load the key for an account on a network.
    fn get_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<KeyPair, KeyStoreError>;

    /// List accounts with a key on the given network.
    ///
    /// Returns an empty list when nothing has been stored yet.
    fn get_account_ids(&self, network_id: &NetworkId) -> Result<Vec<AccountId>, KeyStoreError>;

    /// Drop in-process state.
    ///
    /// Whether persisted keys are removed as well depends on the store.
    fn clear(&self) -> Result<(), KeyStoreError>;

    /// Remove the key for an account on a network, if any.
    fn remove_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<(), KeyStoreError>;

    /// Check whether a key is stored for the pair.
    ///
    /// A corrupt record is reported as an error, not as absent.
    fn has_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<bool, KeyStoreError> {
        match self.get_key(account_id, network_id) {
            Ok(_) => Ok(true),
            Err(e) if e.is_key_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl<K: KeyStore + ?Sized> KeyStore for Arc<K> {
    fn set_key(
        &self,
        account_id: &AccountId,
        key_pair: &KeyPair,
        network_id: &NetworkId,
    ) -> Result<(), KeyStoreError> {
        (**self).set_key(account_id, key_pair, network_id)
    }

    fn get_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<KeyPair, KeyStoreError> {
        (**self).get_key(account_id, network_id)
    }

    fn get_account_ids(&self, network_id: &NetworkId) -> Result<Vec<AccountId>, KeyStoreError> {
        (**self).get_account_ids(network_id)
    }

    fn clear(&self) -> Result<(), KeyStoreError> {
        (**self).clear()
    }

    fn remove_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<(), KeyStoreError> {
        (**self).remove_key(account_id, network_id)
    }
}

/// Persisted form of a stored key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyRecord {
    pub account_id: AccountId,
    pub network_id: NetworkId,
    pub public_key: String,
    pub secret_key: String,
}

/// On-disk shape before validation. Every field may be absent.
#[derive(Deserialize)]
struct RawKeyRecord {
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    network_id: Option<String>,
    #[serde(default)]
    public_key: Option<String>,
    #[serde(default)]
    secret_key: Option<String>,
}

impl KeyRecord {
    /// Build the record stored for a key.
    ///
    /// A key pair with an empty public or secret key is a malformed record.
    pub fn new(
        account_id: &AccountId,
        key_pair: &KeyPair,
        network_id: &NetworkId,
    ) -> Result<Self, KeyStoreError> {
        let location = format!("{}:{}", network_id, account_id);
        let public_key = required(
            Some(key_pair.public_key().to_string()),
            "public_key",
            &location,
        )?;
        let secret_key = required(
            Some(key_pair.secret_key().to_string()),
            "secret_key",
            &location,
        )?;
        Ok(Self {
            account_id: account_id.clone(),
            network_id: network_id.clone(),
            public_key,
            secret_key,
        })
    }

    /// Serialize to the stored JSON document.
    pub fn to_json(&self) -> Result<String, KeyStoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a stored document.
    ///
    /// `location` names the record in error messages. The record must carry a
    /// non-empty `public_key`, `secret_key` and `account_id`, and the account
    /// must be the one that was asked for. A missing `network_id` falls back
    /// to the network that was asked for.
    pub fn parse(
        content: &str,
        location: &str,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<Self, KeyStoreError> {
        let raw: RawKeyRecord = serde_json::from_str(content)
            .map_err(|e| KeyStoreError::malformed(location, format!("invalid JSON: {}", e)))?;

        let public_key = required(raw.public_key, "public_key", location)?;
        let secret_key = required(raw.secret_key, "secret_key", location)?;
        let stored_account = required(raw.account_id, "account_id", location)?;

        if stored_account != account_id.as_str() {
            return Err(KeyStoreError::malformed(
                location,
                format!(
                    "record belongs to account '{}', expected '{}'",
                    stored_account, account_id
                ),
            ));
        }

        let network_id = match raw.network_id.filter(|n| !n.is_empty()) {
            Some(stored) if stored != network_id.as_str() => {
                return Err(KeyStoreError::malformed(
                    location,
                    format!(
                        "record belongs to network '{}', expected '{}'",
                        stored, network_id
                    ),
                ));
            }
            _ => network_id.clone(),
        };

        Ok(Self {
            account_id: account_id.clone(),
            network_id,
            public_key,
            secret_key,
        })
    }

    /// The key pair held by this record.
    pub fn key_pair(&self) -> KeyPair {
        KeyPair::new(self.public_key.clone(), self.secret_key.clone())
    }
}

fn required(value: Option<String>, field: &str, location: &str) -> Result<String, KeyStoreError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(KeyStoreError::malformed(
            location,
            format!("missing {}", field),
        )),
    }
}
