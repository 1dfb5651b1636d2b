use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::KeyStoreError;
use crate::types::{AccountId, KeyPair, NetworkId};

use super::{KeyRecord, KeyStore};

/// In-memory key store.
///
/// Keys live in process memory and are lost when the process exits. Account
/// listings come back in the order keys were first stored.
///
/// # Example
///
/// ```rust
/// use near_bridge::{InMemoryKeyStore, KeyPair, KeyStore};
///
/// let store = InMemoryKeyStore::new();
/// let alice = "alice.near".parse().unwrap();
/// let network = "testnet".parse().unwrap();
///
/// store.set_key(&alice, &KeyPair::from_random(), &network).unwrap();
/// assert!(store.has_key(&alice, &network).unwrap());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    records: RwLock<Vec<KeyRecord>>,
}

impl InMemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys across all networks.
    ///
    /// Counts the records even after a panic poisoned the lock; the
    /// [`KeyStore`] operations report that case as [`KeyStoreError::Storage`].
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<KeyRecord>>, KeyStoreError> {
        self.records
            .read()
            .map_err(|_| KeyStoreError::Storage("in-memory key store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<KeyRecord>>, KeyStoreError> {
        self.records
            .write()
            .map_err(|_| KeyStoreError::Storage("in-memory key store lock poisoned".to_string()))
    }
}

impl KeyStore for InMemoryKeyStore {
    fn set_key(
        &self,
        account_id: &AccountId,
        key_pair: &KeyPair,
        network_id: &NetworkId,
    ) -> Result<(), KeyStoreError> {
        let record = KeyRecord::new(account_id, key_pair, network_id)?;
        let mut records = self.write()?;
        match records
            .iter_mut()
            .find(|r| &r.account_id == account_id && &r.network_id == network_id)
        {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    fn get_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<KeyPair, KeyStoreError> {
        self.read()?
            .iter()
            .find(|r| &r.account_id == account_id && &r.network_id == network_id)
            .map(KeyRecord::key_pair)
            .ok_or_else(|| KeyStoreError::key_not_found(account_id, network_id))
    }

    fn get_account_ids(&self, network_id: &NetworkId) -> Result<Vec<AccountId>, KeyStoreError> {
        Ok(self
            .read()?
            .iter()
            .filter(|r| &r.network_id == network_id)
            .map(|r| r.account_id.clone())
            .collect())
    }

    fn clear(&self) -> Result<(), KeyStoreError> {
        self.write()?.clear();
        Ok(())
    }

    fn remove_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<(), KeyStoreError> {
        self.write()?
            .retain(|r| !(&r.account_id == account_id && &r.network_id == network_id));
        Ok(())
    }
}
