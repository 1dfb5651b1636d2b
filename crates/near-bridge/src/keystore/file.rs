use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::KeyStoreError;
use crate::types::{AccountId, KeyPair, NetworkId};

use super::{KeyRecord, KeyStore};

/// A key store that keeps one JSON file per key.
///
/// Each key lives at `{key_dir}/{network_id}_{account_id}` with the fields
/// `account_id`, `network_id`, `public_key` and `secret_key`. Listing the
/// accounts of a network is a directory scan filtered on the `{network_id}_`
/// prefix. Entries whose remainder is not a valid account ID are skipped.
///
/// The directory is created on the first write. Until then every lookup
/// reports the key as missing and every listing is empty.
///
/// # Example
///
/// ```rust,no_run
/// use near_bridge::{FileKeyStore, KeyPair, KeyStore};
///
/// let store = FileKeyStore::new("./neardev");
/// let alice = "alice.testnet".parse().unwrap();
/// let network = "testnet".parse().unwrap();
///
/// // Writes ./neardev/testnet_alice.testnet
/// store.set_key(&alice, &KeyPair::from_random(), &network).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct FileKeyStore {
    key_dir: PathBuf,
}

impl FileKeyStore {
    /// Create a store rooted at the given directory.
    ///
    /// Nothing touches the filesystem until a key is read or written.
    pub fn new(key_dir: impl Into<PathBuf>) -> Self {
        Self {
            key_dir: key_dir.into(),
        }
    }

    /// The default key directory, `~/.near-bridge/keys`.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[cfg(feature = "file-keystore")]
    pub fn default_key_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".near-bridge").join("keys"))
    }

    /// Create a store rooted at [`FileKeyStore::default_key_dir`].
    #[cfg(feature = "file-keystore")]
    pub fn from_default_dir() -> Result<Self, crate::error::Error> {
        Self::default_key_dir().map(Self::new).ok_or_else(|| {
            crate::error::Error::Config("Could not determine home directory".to_string())
        })
    }

    /// The directory holding the key files.
    pub fn key_dir(&self) -> &Path {
        &self.key_dir
    }

    /// Path of the file holding a given key.
    pub fn key_path(&self, account_id: &AccountId, network_id: &NetworkId) -> PathBuf {
        self.key_dir.join(format!("{}_{}", network_id, account_id))
    }
}

impl KeyStore for FileKeyStore {
    fn set_key(
        &self,
        account_id: &AccountId,
        key_pair: &KeyPair,
        network_id: &NetworkId,
    ) -> Result<(), KeyStoreError> {
        let content = KeyRecord::new(account_id, key_pair, network_id)?.to_json()?;
        fs::create_dir_all(&self.key_dir)?;

        let path = self.key_path(account_id, network_id);
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        tracing::debug!(path = %path.display(), "stored key");
        Ok(())
    }

    fn get_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<KeyPair, KeyStoreError> {
        let path = self.key_path(account_id, network_id);
        let location = path.display().to_string();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(KeyStoreError::key_not_found(account_id, network_id));
            }
            // Something other than a key file sits where the key should be.
            Err(_) if path.is_dir() => {
                return Err(KeyStoreError::malformed(location, "not a regular file"));
            }
            Err(e) => return Err(e.into()),
        };
        let content = String::from_utf8(bytes)
            .map_err(|_| KeyStoreError::malformed(&location, "not valid UTF-8"))?;

        let record = KeyRecord::parse(&content, &location, account_id, network_id)?;
        Ok(record.key_pair())
    }

    fn get_account_ids(&self, network_id: &NetworkId) -> Result<Vec<AccountId>, KeyStoreError> {
        let entries = match fs::read_dir(&self.key_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{}_", network_id);
        let mut account_ids = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(dir = %self.key_dir.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }

            let file_name = entry.file_name();
            let Some(rest) = file_name.to_str().and_then(|name| name.strip_prefix(&prefix)) else {
                continue;
            };
            match rest.parse::<AccountId>() {
                Ok(account_id) => account_ids.push(account_id),
                Err(_) => {
                    tracing::debug!(file = ?file_name, "ignoring non-conforming key file");
                }
            }
        }

        // Directory order is platform-dependent
        account_ids.sort();
        Ok(account_ids)
    }

    /// A file store keeps no in-process state, so this does nothing.
    /// Key files stay on disk; use [`KeyStore::remove_key`] to delete one.
    fn clear(&self) -> Result<(), KeyStoreError> {
        Ok(())
    }

    fn remove_key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<(), KeyStoreError> {
        let path = self.key_path(account_id, network_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed key");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
