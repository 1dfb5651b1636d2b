//! The main Near client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::Error;
use crate::keystore::{
    FileKeyStore, InMemoryKeyStore, KeyStore, LocalStorageKeyStore, StorageArea,
};
use crate::types::{
    AccountId, KeyPair, NearToken, NetworkId, SubmitTransactionResponse, TransactionRequest,
};

use super::node::NodeClient;
use super::rpc::{HttpTransport, LOCAL, Transport};
use super::signer::{KeyStoreSigner, Signer};

/// Network ID used by [`Near::custom`] until one is set.
pub const DEFAULT_NETWORK_ID: &str = "default";

/// Where the client keeps credentials.
#[derive(Clone, Default)]
pub enum KeyStoreConfig {
    /// One file per key under a directory.
    FileSystem { key_dir: PathBuf },
    /// A browser-style key/value area, with entry keys under `prefix`.
    LocalStorage {
        storage: Arc<dyn StorageArea>,
        prefix: String,
    },
    /// Process memory only.
    #[default]
    InMemory,
    /// A caller-supplied store.
    Custom(Arc<dyn KeyStore>),
}

impl KeyStoreConfig {
    fn into_key_store(self) -> Arc<dyn KeyStore> {
        match self {
            KeyStoreConfig::FileSystem { key_dir } => Arc::new(FileKeyStore::new(key_dir)),
            KeyStoreConfig::LocalStorage { storage, prefix } => {
                Arc::new(LocalStorageKeyStore::with_prefix(storage, prefix))
            }
            KeyStoreConfig::InMemory => Arc::new(InMemoryKeyStore::new()),
            KeyStoreConfig::Custom(store) => store,
        }
    }
}

impl std::fmt::Debug for KeyStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyStoreConfig::FileSystem { key_dir } => f
                .debug_struct("FileSystem")
                .field("key_dir", key_dir)
                .finish(),
            KeyStoreConfig::LocalStorage { prefix, .. } => f
                .debug_struct("LocalStorage")
                .field("prefix", prefix)
                .finish_non_exhaustive(),
            KeyStoreConfig::InMemory => f.write_str("InMemory"),
            KeyStoreConfig::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Deserialize)]
struct CallViewFunctionResponse {
    result: Vec<u8>,
}

/// The main client for talking to a node.
///
/// Reads (`call_view_function`, `view_account`, `view_state`,
/// `get_transaction_status`) go straight to the node and never touch the key
/// store. Writes resolve the sender's key through the signer first and fail
/// with [`Error::KeyStore`] before anything is sent if no usable key exists.
///
/// # Example
///
/// ```rust,no_run
/// use near_bridge::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), near_bridge::Error> {
///     let near = Near::local()
///         .key_store(KeyStoreConfig::FileSystem { key_dir: "./neardev".into() })
///         .build()?;
///
///     let count: u64 = near
///         .call_view_function("alice.near", "counter.near", "get_count", &())
///         .await?;
///     println!("count: {}", count);
///
///     let receipt = near
///         .schedule_function_call(
///             NearToken::from_near(0),
///             "alice.near",
///             "counter.near",
///             "increment",
///             &serde_json::json!({"by": 1}),
///         )
///         .await?;
///     println!("status: {}", near.get_transaction_status(&receipt.hash).await?);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Near {
    client: NodeClient,
    key_store: Arc<dyn KeyStore>,
    network_id: NetworkId,
}

impl Near {
    /// Create a builder for a node on this machine.
    pub fn local() -> NearBuilder {
        NearBuilder::new(LOCAL.rpc_url, LOCAL.network_id)
    }

    /// Create a builder with a custom RPC URL.
    pub fn custom(rpc_url: impl Into<String>) -> NearBuilder {
        NearBuilder::new(rpc_url, DEFAULT_NETWORK_ID)
    }

    /// Create a configured client from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `NEAR_NODE_URL` (optional): the node's RPC URL. Defaults to the
    ///   local preset.
    /// - `NEAR_NETWORK_ID` (optional): network keys are stored under.
    /// - `NEAR_KEY_DIR` (optional): keep keys in files under this directory.
    ///   Without it, keys live in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if `NEAR_NETWORK_ID` is not a valid network ID.
    pub fn from_env() -> Result<Near, Error> {
        let node_url = std::env::var("NEAR_NODE_URL").ok();
        let network_id = std::env::var("NEAR_NETWORK_ID").ok();
        let key_dir = std::env::var("NEAR_KEY_DIR").ok();

        let mut builder = match node_url {
            Some(url) => Near::custom(url).network_id(LOCAL.network_id),
            None => Near::local(),
        };

        if let Some(network_id) = network_id {
            builder = builder.network_id(network_id);
        }
        if let Some(key_dir) = key_dir {
            builder = builder.key_store(KeyStoreConfig::FileSystem {
                key_dir: key_dir.into(),
            });
        }

        builder.build()
    }

    /// The key store credentials are read from and written to.
    pub fn key_store(&self) -> &Arc<dyn KeyStore> {
        &self.key_store
    }

    /// The network keys are looked up under.
    pub fn network_id(&self) -> &NetworkId {
        &self.network_id
    }

    /// The underlying node client.
    pub fn client(&self) -> &NodeClient {
        &self.client
    }

    // ========================================================================
    // Read operations
    // ========================================================================

    /// Call a view method on a contract.
    ///
    /// `args` is encoded with [`codec::encode_args`] and the returned bytes
    /// are decoded with [`codec::decode_result`]. No key is needed.
    pub async fn call_view_function<A, R>(
        &self,
        sender_account_id: impl AsRef<str>,
        contract_account_id: impl AsRef<str>,
        method_name: &str,
        args: &A,
    ) -> Result<R, Error>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = TransactionRequest::function_call(
            sender_account_id.as_ref().parse()?,
            contract_account_id.as_ref().parse()?,
            method_name,
            codec::encode_args(args)?,
        );

        let response: CallViewFunctionResponse = self
            .client
            .request("call_view_function", request.to_params())
            .await?;
        Ok(codec::decode_result(&response.result)?)
    }

    /// Get an account's state as the node reports it.
    pub async fn view_account(
        &self,
        account_id: impl AsRef<str>,
    ) -> Result<serde_json::Value, Error> {
        let account_id: AccountId = account_id.as_ref().parse()?;
        self.client
            .request("view_account", serde_json::json!({ "account_id": account_id }))
            .await
    }

    /// Get a contract's storage as the node reports it.
    pub async fn view_state(
        &self,
        contract_account_id: impl AsRef<str>,
    ) -> Result<serde_json::Value, Error> {
        let contract_account_id: AccountId = contract_account_id.as_ref().parse()?;
        self.client
            .request(
                "view_state",
                serde_json::json!({ "contract_account_id": contract_account_id }),
            )
            .await
    }

    /// Poll the status of a submitted transaction.
    ///
    /// The node's record is returned as-is.
    pub async fn get_transaction_status(
        &self,
        hash: impl AsRef<str>,
    ) -> Result<serde_json::Value, Error> {
        self.client
            .request(
                "get_transaction_status",
                serde_json::json!({ "hash": hash.as_ref() }),
            )
            .await
    }

    // ========================================================================
    // Write operations
    // ========================================================================

    /// Schedule a call to a contract method, attaching `amount`.
    pub async fn schedule_function_call<A>(
        &self,
        amount: NearToken,
        sender_account_id: impl AsRef<str>,
        contract_account_id: impl AsRef<str>,
        method_name: &str,
        args: &A,
    ) -> Result<SubmitTransactionResponse, Error>
    where
        A: Serialize + ?Sized,
    {
        let request = TransactionRequest::function_call(
            sender_account_id.as_ref().parse()?,
            contract_account_id.as_ref().parse()?,
            method_name,
            codec::encode_args(args)?,
        )
        .with_amount(amount);

        self.submit(
            "schedule_function_call",
            request.to_params(),
            &request.sender_account_id,
        )
        .await
    }

    /// Deploy contract bytecode to an account.
    pub async fn deploy_contract(
        &self,
        sender_account_id: impl AsRef<str>,
        contract_account_id: impl AsRef<str>,
        bytecode: impl Into<Vec<u8>>,
        public_key: impl AsRef<str>,
    ) -> Result<SubmitTransactionResponse, Error> {
        let sender: AccountId = sender_account_id.as_ref().parse()?;
        let contract: AccountId = contract_account_id.as_ref().parse()?;
        let bytecode: Vec<u8> = bytecode.into();
        let params = serde_json::json!({
            "originator": sender,
            "contract_account_id": contract,
            "wasm_byte_array": bytecode,
            "public_key": public_key.as_ref(),
        });
        self.submit("deploy_contract", params, &sender).await
    }

    /// Transfer tokens to another account.
    pub async fn send_money(
        &self,
        sender_account_id: impl AsRef<str>,
        receiver_account_id: impl AsRef<str>,
        amount: NearToken,
    ) -> Result<SubmitTransactionResponse, Error> {
        let sender: AccountId = sender_account_id.as_ref().parse()?;
        let receiver: AccountId = receiver_account_id.as_ref().parse()?;
        let params = serde_json::json!({
            "originator": sender,
            "receiver_account_id": receiver,
            "amount": amount.as_yoctonear().to_string(),
        });
        self.submit("send_money", params, &sender).await
    }

    /// Create a new account funded by the sender.
    pub async fn create_account(
        &self,
        sender_account_id: impl AsRef<str>,
        new_account_id: impl AsRef<str>,
        amount: NearToken,
        public_key: impl AsRef<str>,
    ) -> Result<SubmitTransactionResponse, Error> {
        let sender: AccountId = sender_account_id.as_ref().parse()?;
        let new_account: AccountId = new_account_id.as_ref().parse()?;
        let params = serde_json::json!({
            "originator": sender,
            "new_account_id": new_account,
            "amount": amount.as_yoctonear().to_string(),
            "public_key": public_key.as_ref(),
        });
        self.submit("create_account", params, &sender).await
    }

    /// Stake tokens from the sender's balance.
    pub async fn stake(
        &self,
        sender_account_id: impl AsRef<str>,
        amount: NearToken,
    ) -> Result<SubmitTransactionResponse, Error> {
        let sender: AccountId = sender_account_id.as_ref().parse()?;
        let params = serde_json::json!({
            "originator": sender,
            "amount": amount.as_yoctonear().to_string(),
        });
        self.submit("stake", params, &sender).await
    }

    /// Replace an account's key on the node.
    ///
    /// Signed with the key currently stored for `account_id`. The local key
    /// store is not updated.
    pub async fn swap_key(
        &self,
        account_id: impl AsRef<str>,
        current_key: impl AsRef<str>,
        new_key: impl AsRef<str>,
    ) -> Result<SubmitTransactionResponse, Error> {
        let account: AccountId = account_id.as_ref().parse()?;
        let params = serde_json::json!({
            "account": account,
            "current_key": current_key.as_ref(),
            "new_key": new_key.as_ref(),
        });
        self.submit("swap_key", params, &account).await
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Generate a random key pair and store it for an account on this
    /// client's network, replacing any existing key.
    pub fn generate_key(&self, account_id: impl AsRef<str>) -> Result<KeyPair, Error> {
        let account_id: AccountId = account_id.as_ref().parse()?;
        let key_pair = KeyPair::from_random();
        self.key_store
            .set_key(&account_id, &key_pair, &self.network_id)?;
        Ok(key_pair)
    }

    async fn submit(
        &self,
        method: &str,
        params: serde_json::Value,
        sender_account_id: &AccountId,
    ) -> Result<SubmitTransactionResponse, Error> {
        self.client
            .submit_transaction(method, params, sender_account_id, &self.network_id)
            .await
    }
}

impl std::fmt::Debug for Near {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Near")
            .field("network_id", &self.network_id)
            .finish_non_exhaustive()
    }
}

/// Builder for creating a [`Near`] client.
///
/// # Example
///
/// ```rust
/// use near_bridge::*;
///
/// let near = Near::custom("http://node.internal:3030")
///     .network_id("staging")
///     .timeout(std::time::Duration::from_secs(10))
///     .build()
///     .unwrap();
/// assert_eq!(near.network_id().as_str(), "staging");
/// ```
pub struct NearBuilder {
    rpc_url: String,
    network_id: String,
    key_store: KeyStoreConfig,
    signer: Option<Arc<dyn Signer>>,
    transport: Option<Arc<dyn Transport>>,
    timeout: Option<Duration>,
}

impl NearBuilder {
    fn new(rpc_url: impl Into<String>, network_id: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            network_id: network_id.into(),
            key_store: KeyStoreConfig::default(),
            signer: None,
            transport: None,
            timeout: None,
        }
    }

    /// Set the network keys are stored under.
    pub fn network_id(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = network_id.into();
        self
    }

    /// Choose where keys are kept.
    pub fn key_store(mut self, config: KeyStoreConfig) -> Self {
        self.key_store = config;
        self
    }

    /// Sign with this signer instead of one backed by the key store.
    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Send requests through this transport instead of HTTP.
    ///
    /// The RPC URL and timeout are ignored when a transport is set.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Fail HTTP requests that take longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the network ID is invalid or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<Near, Error> {
        let network_id: NetworkId = self.network_id.parse()?;
        let key_store = self.key_store.into_key_store();

        let signer = match self.signer {
            Some(signer) => signer,
            None => Arc::new(KeyStoreSigner::new(key_store.clone())),
        };

        let transport: Arc<dyn Transport> = match (self.transport, self.timeout) {
            (Some(transport), _) => transport,
            (None, Some(timeout)) => Arc::new(HttpTransport::with_timeout(self.rpc_url, timeout)?),
            (None, None) => Arc::new(HttpTransport::new(self.rpc_url)),
        };

        tracing::debug!(network_id = %network_id, "built near client");
        Ok(Near {
            client: NodeClient::new(transport, signer),
            key_store,
            network_id,
        })
    }
}

impl std::fmt::Debug for NearBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearBuilder")
            .field("rpc_url", &self.rpc_url)
            .field("network_id", &self.network_id)
            .field("key_store", &self.key_store)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
