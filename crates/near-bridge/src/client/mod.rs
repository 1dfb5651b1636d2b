//! Client module for talking to a node.
//!
//! - [`Near`] - The main client, the single entry point for all operations
//! - [`NearBuilder`] - Fluent builder for configuring the client
//! - [`NodeClient`] - Request and signed-submission layer under [`Near`]
//! - [`HttpTransport`] - JSON-RPC 2.0 over HTTP
//!
//! # Signers
//!
//! | Signer | Use Case |
//! |--------|----------|
//! | [`KeyStoreSigner`] | Keys looked up in a [`KeyStore`](crate::KeyStore) on every signature |
//! | [`InMemorySigner`] | A single account's key held in memory |

mod near;
mod node;
mod rpc;
mod signer;

pub use near::{DEFAULT_NETWORK_ID, KeyStoreConfig, Near, NearBuilder};
pub use node::NodeClient;
pub use rpc::{HttpTransport, LOCAL, NetworkConfig, Transport};
pub use signer::{InMemorySigner, KeyStoreSigner, SignedMessage, Signer};
