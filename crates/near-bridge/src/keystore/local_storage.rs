use std::sync::{Arc, RwLock};

use crate::error::KeyStoreError;
use crate::types::{AccountId, KeyPair, NetworkId};

use super::{KeyRecord, KeyStore};

/// Default entry-key prefix used by [`LocalStorageKeyStore`].
pub const DEFAULT_PREFIX: &str = "nearbridge:keystore:";

/// A browser-style string key/value area.
///
/// Mirrors the shape of the Web Storage API (`localStorage`). Embedders
/// running in a browser implement it over `window.localStorage`;
/// [`MemoryStorage`] covers everything else.
pub trait StorageArea: Send + Sync {
    /// Read a value.
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyStoreError>;

    /// Write a value, replacing any existing one.
    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyStoreError>;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), KeyStoreError>;

    /// All keys currently in the area, in the area's own order.
    fn keys(&self) -> Result<Vec<String>, KeyStoreError>;
}

impl<S: StorageArea + ?Sized> StorageArea for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyStoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), KeyStoreError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, KeyStoreError> {
        (**self).keys()
    }
}

/// Insertion-ordered [`StorageArea`] held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<Vec<(String, String)>>,
}

impl MemoryStorage {
    /// Create an empty storage area.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> KeyStoreError {
    KeyStoreError::Storage("memory storage lock poisoned".to_string())
}

impl StorageArea for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, KeyStoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KeyStoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        match items.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => items.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), KeyStoreError> {
        self.items
            .write()
            .map_err(|_| poisoned())?
            .retain(|(k, _)| k != key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, KeyStoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.iter().map(|(k, _)| k.clone()).collect())
    }
}

/// A key store over a [`StorageArea`].
///
/// Each key is one entry named `{prefix}{network_id}:{account_id}` holding the
/// same JSON record the file store writes. Several stores can share one area
/// as long as their prefixes differ.
///
/// # Example
///
/// ```rust
/// use near_bridge::{KeyPair, KeyStore, LocalStorageKeyStore, MemoryStorage};
///
/// let store = LocalStorageKeyStore::new(MemoryStorage::new());
/// let alice = "alice.near".parse().unwrap();
/// let network = "testnet".parse().unwrap();
///
/// store.set_key(&alice, &KeyPair::new("P", "S"), &network).unwrap();
/// assert_eq!(store.get_key(&alice, &network).unwrap(), KeyPair::new("P", "S"));
/// ```
#[derive(Clone)]
pub struct LocalStorageKeyStore {
    storage: Arc<dyn StorageArea>,
    prefix: String,
}

impl LocalStorageKeyStore {
    /// Create a store over a storage area with the default prefix.
    pub fn new(storage: impl StorageArea + 'static) -> Self {
        Self::with_prefix(Arc::new(storage), DEFAULT_PREFIX)
    }

    /// Create a store over a shared storage area with a custom prefix.
    ///
    /// The prefix should end with a separator such as `:` so that entry keys
    /// stay unambiguous.
    pub fn with_prefix(storage: Arc<dyn StorageArea>, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
        }
    }

    /// The entry-key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Entry key for an account on a network.
    pub fn storage_key(&self, account_id: &AccountId, network_id: &NetworkId) -> String {
        format!("{}{}:{}", self.prefix, network_id, account_id)
    }

    /// Split an entry key of this store into its network and account.
    fn parse_entry(&self, key: &str) -> Option<(NetworkId, AccountId)> {
        let (network_id, account_id) = key.strip_prefix(&self.prefix)?.split_once(':')?;
        Some((network_id.parse().ok()?, account_id.parse().ok()?))
    }
}

impl std::fmt::Debug for LocalStorageKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStorageKeyStore")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl KeyStore for LocalStorageKeyStore {
    fn set_key(
        &self,
        account_id: &AccountId,
        key_pair: &KeyPair,
        network_id: &NetworkId,
    ) -> Result<(), KeyStoreError> {
        let key = self.storage_key(account_id, network_id);
        let content = KeyRecord::new(account_id, key_pair, network_id)?.to_json()?;
        self.storage.set_item(&key, &content)?;
        tracing::debug!(key = %key, "stored key");
        Ok(())
    }

    fn get_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<KeyPair, KeyStoreError> {
        let key = self.storage_key(account_id, network_id);
        let content = self
            .storage
            .get_item(&key)?
            .ok_or_else(|| KeyStoreError::key_not_found(account_id, network_id))?;
        Ok(KeyRecord::parse(&content, &key, account_id, network_id)?.key_pair())
    }

    fn get_account_ids(&self, network_id: &NetworkId) -> Result<Vec<AccountId>, KeyStoreError> {
        let network_prefix = format!("{}{}:", self.prefix, network_id);
        Ok(self
            .storage
            .keys()?
            .iter()
            .filter_map(|key| key.strip_prefix(&network_prefix))
            .filter_map(|rest| match rest.parse::<AccountId>() {
                Ok(account_id) => Some(account_id),
                Err(_) => {
                    tracing::debug!(entry = rest, "ignoring non-conforming storage entry");
                    None
                }
            })
            .collect())
    }

    /// Removes every entry this store owns.
    ///
    /// An entry is owned when the rest after the prefix is exactly
    /// `{network_id}:{account_id}`. Neither part can contain `:`, so a store
    /// whose prefix extends this one (`app:` and `app:x:`) keeps its entries.
    fn clear(&self) -> Result<(), KeyStoreError> {
        for key in self.storage.keys()? {
            if self.parse_entry(&key).is_some() {
                self.storage.remove_item(&key)?;
            }
        }
        Ok(())
    }

    fn remove_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<(), KeyStoreError> {
        self.storage
            .remove_item(&self.storage_key(account_id, network_id))
    }
}
