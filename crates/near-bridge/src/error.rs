//! Error types for near-bridge.
//!
//! # Error Hierarchy
//!
//! - [`Error`](enum@Error) - Main error type, returned by most operations
//!   - [`KeyStoreError`] - Credential lookup and persistence failures
//!   - [`RpcError`] - Transport failures and node-reported errors
//!   - [`SignerError`] - Key decoding and signing failures
//!   - [`ParseNetworkIdError`] - Invalid network identifier
//!
//! # Branching on Failure Kinds
//!
//! The four failure kinds a caller usually needs to tell apart each have a
//! predicate on [`Error`]:
//!
//! ```rust,no_run
//! use near_bridge::*;
//!
//! # async fn example(near: Near) -> Result<(), Error> {
//! match near
//!     .schedule_function_call(NearToken::from_near(0), "alice.near", "counter.near", "increment", &())
//!     .await
//! {
//!     Ok(receipt) => println!("submitted {}", receipt.hash),
//!     Err(e) if e.is_key_not_found() => println!("import a key for alice.near first"),
//!     Err(e) if e.is_malformed_record() => println!("key storage is corrupt: {e}"),
//!     Err(e) if e.is_transport_failure() => println!("node unreachable: {e}"),
//!     Err(e) if e.is_node_error() => println!("node rejected the call: {e}"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

use crate::types::{AccountId, NetworkId};

/// Error parsing a network identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseNetworkIdError {
    #[error("Network ID is empty")]
    Empty,

    #[error("Network ID '{0}' is too long (max 64 characters)")]
    TooLong(String),

    #[error("Network ID '{0}' contains invalid character '{1}'")]
    InvalidChar(String, char),
}

/// Error decoding a key or producing a signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Error reading or writing credentials.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("Key not found for account {account_id} on network {network_id}")]
    KeyNotFound {
        account_id: AccountId,
        network_id: NetworkId,
    },

    #[error("Malformed key record at {location}: {reason}")]
    MalformedRecord { location: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl KeyStoreError {
    /// Create a key-not-found error for an account/network pair.
    pub fn key_not_found(account_id: &AccountId, network_id: &NetworkId) -> Self {
        KeyStoreError::KeyNotFound {
            account_id: account_id.clone(),
            network_id: network_id.clone(),
        }
    }

    /// Create a malformed-record error.
    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        KeyStoreError::MalformedRecord {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Check if no credential exists for the requested pair.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, KeyStoreError::KeyNotFound { .. })
    }

    /// Check if a stored record exists but is corrupt.
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, KeyStoreError::MalformedRecord { .. })
    }
}

/// Error talking to the node.
#[derive(Debug, Error)]
pub enum RpcError {
    // ─── Transport ───
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // ─── Node ───
    #[error("Node error: {message} (code: {code})")]
    Node {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },
}

impl RpcError {
    /// Create a network error.
    pub fn network(message: impl Into<String>, status_code: Option<u16>) -> Self {
        RpcError::Network {
            message: message.into(),
            status_code,
        }
    }

    /// Create a node error.
    pub fn node(code: i64, message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        RpcError::Node {
            code,
            message: message.into(),
            data,
        }
    }

    /// Check if the request never produced a usable node response.
    ///
    /// Covers connection failures, timeouts, non-success HTTP statuses and
    /// response bodies that could not be decoded.
    pub fn is_transport_failure(&self) -> bool {
        !self.is_node_error()
    }

    /// Check if the node processed the request and reported an error.
    pub fn is_node_error(&self) -> bool {
        matches!(self, RpcError::Node { .. })
    }
}

/// Main error type for near-bridge operations.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Configuration ───
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ─── Parsing ───
    #[error("Invalid account ID: {0}")]
    ParseAccountId(#[from] near_account_id::ParseAccountError),

    #[error(transparent)]
    ParseNetworkId(#[from] ParseNetworkIdError),

    // ─── RPC ───
    #[error(transparent)]
    Rpc(#[from] RpcError),

    // ─── Signing ───
    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),

    // ─── KeyStore ───
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    // ─── Serialization ───
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// No credential is stored for the account/network pair.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Error::KeyStore(e) if e.is_key_not_found())
    }

    /// A stored credential exists but is corrupt.
    pub fn is_malformed_record(&self) -> bool {
        matches!(self, Error::KeyStore(e) if e.is_malformed_record())
    }

    /// The node could not be reached or its response could not be read.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Error::Rpc(e) if e.is_transport_failure())
    }

    /// The node returned an explicit error.
    pub fn is_node_error(&self) -> bool {
        matches!(self, Error::Rpc(e) if e.is_node_error())
    }
}
