//! Signer trait and implementations.
//!
//! A `Signer` decides which credential signs for an account on a network.
//! It is kept apart from key storage so that signing policy can change
//! without touching how keys are persisted or how requests are sent.
//!
//! # Implementations
//!
//! - [`KeyStoreSigner`] - Looks keys up in a [`KeyStore`]
//! - [`InMemorySigner`] - A single account's key held in memory
//!
//! # Example
//!
//! ```rust
//! use near_bridge::{InMemoryKeyStore, KeyPair, KeyStore, KeyStoreSigner, Signer};
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryKeyStore::new());
//! let alice = "alice.near".parse().unwrap();
//! let network = "testnet".parse().unwrap();
//! store.set_key(&alice, &KeyPair::from_random(), &network).unwrap();
//!
//! let signer = KeyStoreSigner::new(store);
//! let signed = signer.sign_message(b"hello", &alice, &network).unwrap();
//! assert!(signed.signature.verify(b"hello", &signed.public_key));
//! ```

use std::sync::Arc;

use crate::error::{Error, KeyStoreError};
use crate::keystore::KeyStore;
use crate::types::{AccountId, KeyPair, NetworkId, Signature};

// ============================================================================
// Signer Trait
// ============================================================================

/// Resolves the credential used to sign for an account on a network.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use near_bridge::{AccountId, KeyPair, KeyStoreError, NetworkId, Signer};
///
/// struct HardwareSigner { /* device handle */ }
///
/// impl Signer for HardwareSigner {
///     fn key(&self, account_id: &AccountId, network_id: &NetworkId)
///         -> Result<KeyPair, KeyStoreError>
///     {
///         // ask the device for the account's key
///     }
/// }
/// ```
pub trait Signer: Send + Sync {
    /// Get the key pair for an account on a network.
    fn key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<KeyPair, KeyStoreError>;

    /// Resolve the key for an account and sign a message with it.
    fn sign_message(
        &self,
        message: &[u8],
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<SignedMessage, Error> {
        let key_pair = self.key(account_id, network_id)?;
        let signature = key_pair.sign(message)?;
        Ok(SignedMessage {
            public_key: key_pair.public_key().to_string(),
            signature,
        })
    }
}

/// Implement `Signer` for `Arc<dyn Signer>` for convenience.
impl Signer for Arc<dyn Signer> {
    fn key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<KeyPair, KeyStoreError> {
        (**self).key(account_id, network_id)
    }
}

/// A signature together with the public key that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedMessage {
    pub public_key: String,
    pub signature: Signature,
}

// ============================================================================
// KeyStoreSigner
// ============================================================================

/// A signer backed by a [`KeyStore`].
///
/// Every lookup goes straight to the store; nothing is cached, so a key
/// written to the store is used by the very next signature.
#[derive(Clone)]
pub struct KeyStoreSigner {
    key_store: Arc<dyn KeyStore>,
}

impl KeyStoreSigner {
    /// Create a signer over a key store.
    pub fn new(key_store: Arc<dyn KeyStore>) -> Self {
        Self { key_store }
    }

    /// The key store this signer reads from.
    pub fn key_store(&self) -> &Arc<dyn KeyStore> {
        &self.key_store
    }
}

impl std::fmt::Debug for KeyStoreSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStoreSigner").finish_non_exhaustive()
    }
}

impl Signer for KeyStoreSigner {
    fn key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<KeyPair, KeyStoreError> {
        self.key_store.get_key(account_id, network_id)
    }
}

// ============================================================================
// InMemorySigner
// ============================================================================

/// A signer with a single key stored in memory.
///
/// It signs for one account on any network, and reports
/// [`KeyStoreError::KeyNotFound`] for every other account.
///
/// # Example
///
/// ```rust
/// use near_bridge::{InMemorySigner, KeyPair, Signer};
///
/// let signer = InMemorySigner::new("bot.near", KeyPair::from_random()).unwrap();
/// let key = signer.key(&"bot.near".parse().unwrap(), &"testnet".parse().unwrap());
/// assert!(key.is_ok());
/// ```
#[derive(Clone)]
pub struct InMemorySigner {
    account_id: AccountId,
    key_pair: KeyPair,
}

impl InMemorySigner {
    /// Create a signer for an account.
    pub fn new(account_id: impl AsRef<str>, key_pair: KeyPair) -> Result<Self, Error> {
        let account_id: AccountId = account_id.as_ref().parse()?;
        Ok(Self {
            account_id,
            key_pair,
        })
    }

    /// Create a signer from an account and a secret key string.
    ///
    /// The public key is derived from the secret key.
    pub fn from_secret_key(
        account_id: impl AsRef<str>,
        secret_key: impl AsRef<str>,
    ) -> Result<Self, Error> {
        let key_pair = KeyPair::from_secret_key(secret_key)?;
        Self::new(account_id, key_pair)
    }

    /// The account this signer signs for.
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// The public key.
    pub fn public_key(&self) -> &str {
        self.key_pair.public_key()
    }
}

impl std::fmt::Debug for InMemorySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySigner")
            .field("account_id", &self.account_id)
            .field("public_key", &self.key_pair.public_key())
            .finish()
    }
}

impl Signer for InMemorySigner {
    fn key(
        &self,
        account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<KeyPair, KeyStoreError> {
        if account_id == &self.account_id {
            Ok(self.key_pair.clone())
        } else {
            Err(KeyStoreError::key_not_found(account_id, network_id))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
