//! Key storage, signing and transaction submission for NEAR nodes.
//!
//! **near-bridge** sits between an application and a node. It keeps
//! credentials per `(network, account)`, signs state-changing requests with
//! them and forwards everything to the node over JSON-RPC.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use near_bridge::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), near_bridge::Error> {
//!     let near = Near::local().build()?;
//!     near.generate_key("alice.near")?;
//!
//!     let receipt = near
//!         .send_money("alice.near", "bob.near", NearToken::from_near(1))
//!         .await?;
//!     println!("status: {}", near.get_transaction_status(&receipt.hash).await?);
//!     Ok(())
//! }
//! ```
//!
//! # Layers
//!
//! 1. [`KeyStore`] - Where credentials live (files, a local-storage area, memory)
//! 2. [`Signer`] - Which credential signs for an account
//! 3. [`NodeClient`] - Reads and signed submissions over a [`Transport`]
//! 4. [`Near`] - Contract-level operations on top
//!
//! # Core Types
//!
//! - [`AccountId`] - Validated NEAR account identifier
//! - [`NetworkId`] - Validated network name keys are stored under
//! - [`NearToken`] - Token amount with yoctoNEAR precision
//! - [`KeyPair`] - Public and secret key strings

pub mod client;
pub mod codec;
pub mod error;
pub mod keystore;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{Error, KeyStoreError, ParseNetworkIdError, RpcError, SignerError};
pub use types::*;

// Re-export key stores
pub use keystore::{
    DEFAULT_PREFIX, FileKeyStore, InMemoryKeyStore, KeyRecord, KeyStore, LocalStorageKeyStore,
    MemoryStorage, StorageArea,
};

// Re-export client types
pub use client::{
    DEFAULT_NETWORK_ID, HttpTransport, InMemorySigner, KeyStoreConfig, KeyStoreSigner, LOCAL,
    Near, NearBuilder, NetworkConfig, NodeClient, SignedMessage, Signer, Transport,
};
