//! Request and signed-submission client.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{Error, RpcError};
use crate::types::{
    AccountId, NetworkId, SignedTransaction, SubmitTransactionResponse, TransactionBody,
};

use super::rpc::Transport;
use super::signer::Signer;

/// Client for the node's request/response interface.
///
/// Reads go out through [`NodeClient::request`]. Writes go through
/// [`NodeClient::submit_transaction`], which resolves the sender's key with
/// the [`Signer`] and signs the envelope before anything is sent.
///
/// Every call is a single round trip: there is no retry, backoff or caching
/// at this layer. Independent calls may run concurrently; their order is
/// decided by the node.
#[derive(Clone)]
pub struct NodeClient {
    transport: Arc<dyn Transport>,
    signer: Arc<dyn Signer>,
}

impl NodeClient {
    /// Create a client from a transport and a signer.
    pub fn new(transport: Arc<dyn Transport>, signer: Arc<dyn Signer>) -> Self {
        Self { transport, signer }
    }

    /// The transport requests are sent through.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The signer used for submissions.
    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    /// Issue a read-only query and decode its result.
    ///
    /// Transport failures and node errors come back as [`Error::Rpc`]
    /// unchanged.
    pub async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<R, Error> {
        tracing::debug!(method, "node request");
        let result = self.transport.send(method, params).await?;
        serde_json::from_value(result).map_err(|e| Error::Rpc(RpcError::Json(e)))
    }

    /// Build and sign a transaction envelope without sending it.
    ///
    /// The sender's key is resolved through the signer. The envelope hash is
    /// the SHA-256 of `{method, params}` and the signature covers that hash.
    pub fn sign_transaction(
        &self,
        method: &str,
        params: serde_json::Value,
        sender_account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<SignedTransaction, Error> {
        let hash = TransactionBody {
            method,
            params: &params,
        }
        .hash()?;
        let signed = self
            .signer
            .sign_message(&hash, sender_account_id, network_id)?;

        Ok(SignedTransaction {
            body: params,
            public_key: signed.public_key,
            signature: signed.signature,
            hash: bs58::encode(hash).into_string(),
        })
    }

    /// Sign and send a state-changing request.
    ///
    /// Key lookup and signing happen first; if either fails, nothing is sent.
    /// Returns the hash the node reports for the transaction, or the
    /// envelope hash when the node's reply does not carry one.
    pub async fn submit_transaction(
        &self,
        method: &str,
        params: serde_json::Value,
        sender_account_id: &AccountId,
        network_id: &NetworkId,
    ) -> Result<SubmitTransactionResponse, Error> {
        let signed = self.sign_transaction(method, params, sender_account_id, network_id)?;
        let local_hash = signed.hash.clone();
        let envelope = serde_json::to_value(&signed)?;

        tracing::debug!(method, sender = %sender_account_id, hash = %local_hash, "submitting transaction");
        let reply = self.transport.send(method, envelope).await?;

        let hash = match &reply {
            serde_json::Value::String(hash) => Some(hash.clone()),
            serde_json::Value::Object(map) => map
                .get("hash")
                .and_then(serde_json::Value::as_str)
                .map(String::from),
            _ => None,
        }
        .unwrap_or(local_hash);

        Ok(SubmitTransactionResponse { hash })
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient").finish_non_exhaustive()
    }
}
