//! Credential types.

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SignerError;

const ED25519_PREFIX: &str = "ed25519:";

/// Public and secret key material for one account.
///
/// Key strings are opaque to the key stores: a pair is stored and returned
/// exactly as written. Only [`KeyPair::sign`] interprets them, expecting
/// base58 ed25519 keys with an optional `ed25519:` prefix.
///
/// Equality is structural: two pairs are equal when both strings match.
///
/// # Example
///
/// ```rust
/// use near_bridge::KeyPair;
///
/// let key_pair = KeyPair::from_random();
/// assert!(key_pair.public_key().starts_with("ed25519:"));
///
/// let signature = key_pair.sign(b"hello").unwrap();
/// assert!(signature.verify(b"hello", key_pair.public_key()));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPair {
    public_key: String,
    secret_key: String,
}

impl KeyPair {
    /// Wrap existing key strings.
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Generate a random ed25519 key pair.
    ///
    /// The secret key is encoded as the 64-byte seed-plus-public-key form.
    pub fn from_random() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(&signing_key)
    }

    /// Build a key pair from a secret key string, deriving the public key.
    pub fn from_secret_key(secret_key: impl AsRef<str>) -> Result<Self, SignerError> {
        let signing_key = decode_signing_key(secret_key.as_ref())?;
        Ok(Self::new(
            encode_key(signing_key.verifying_key().as_bytes()),
            secret_key.as_ref(),
        ))
    }

    fn from_signing_key(signing_key: &SigningKey) -> Self {
        Self {
            public_key: encode_key(signing_key.verifying_key().as_bytes()),
            secret_key: encode_key(&signing_key.to_keypair_bytes()),
        }
    }

    /// The public key string.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The secret key string.
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Sign a message with the secret key.
    ///
    /// Fails with [`SignerError::InvalidKey`] when the secret key is not a
    /// base58 ed25519 key of 32 or 64 bytes.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, SignerError> {
        let signing_key = decode_signing_key(&self.secret_key)?;
        Ok(Signature(signing_key.sign(message).to_bytes()))
    }
}

impl Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// An ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Create a signature from raw bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Verify this signature against a message and public key string.
    pub fn verify(&self, message: &[u8], public_key: &str) -> bool {
        let Ok(bytes) = decode_key(public_key) else {
            return false;
        };
        let Ok(bytes) = <[u8; 32]>::try_from(bytes.as_slice()) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&bytes) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&self.0);
        verifying_key.verify(message, &signature).is_ok()
    }
}

impl FromStr for Signature {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data = decode_key(s)?;
        let bytes: [u8; 64] = data.as_slice().try_into().map_err(|_| {
            SignerError::InvalidKey(format!("expected 64 signature bytes, got {}", data.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_key(&self.0))
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn encode_key(bytes: &[u8]) -> String {
    format!("{}{}", ED25519_PREFIX, bs58::encode(bytes).into_string())
}

fn decode_key(s: &str) -> Result<Vec<u8>, SignerError> {
    let data = s.strip_prefix(ED25519_PREFIX).unwrap_or(s);
    if let Some((key_type, _)) = data.split_once(':') {
        return Err(SignerError::InvalidKey(format!(
            "unsupported key type '{}'",
            key_type
        )));
    }
    bs58::decode(data)
        .into_vec()
        .map_err(|e| SignerError::InvalidKey(format!("invalid base58: {}", e)))
}

fn decode_signing_key(secret_key: &str) -> Result<SigningKey, SignerError> {
    let data = decode_key(secret_key)?;
    // 64-byte secrets carry the public key after the seed
    let seed: [u8; 32] = match data.len() {
        32 | 64 => data[..32]
            .try_into()
            .map_err(|_| SignerError::InvalidKey("bad seed length".to_string()))?,
        n => {
            return Err(SignerError::InvalidKey(format!(
                "expected 32 or 64 secret key bytes, got {}",
                n
            )));
        }
    };
    Ok(SigningKey::from_bytes(&seed))
}
