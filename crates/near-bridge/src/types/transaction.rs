//! Transaction request and signed envelope types.

use near_token::NearToken;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{AccountId, Signature};

/// A state-changing contract call, before signing.
///
/// `args` holds the encoded argument document (see [`crate::codec`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub sender_account_id: AccountId,
    pub contract_account_id: AccountId,
    pub method_name: String,
    pub args: Vec<u8>,
    pub amount: Option<NearToken>,
}

impl TransactionRequest {
    /// Create a function call request with no attached amount.
    pub fn function_call(
        sender_account_id: AccountId,
        contract_account_id: AccountId,
        method_name: impl Into<String>,
        args: Vec<u8>,
    ) -> Self {
        Self {
            sender_account_id,
            contract_account_id,
            method_name: method_name.into(),
            args,
            amount: None,
        }
    }

    /// Attach a transfer amount.
    pub fn with_amount(mut self, amount: NearToken) -> Self {
        self.amount = Some(amount);
        self
    }

    /// The parameter document sent to the node.
    ///
    /// Field names follow the node's request schema: `originator`,
    /// `contract_account_id`, `method_name`, `args` and, when set, `amount`.
    pub fn to_params(&self) -> serde_json::Value {
        let mut params = serde_json::json!({
            "originator": self.sender_account_id,
            "contract_account_id": self.contract_account_id,
            "method_name": self.method_name,
            "args": self.args,
        });
        if let (Some(amount), serde_json::Value::Object(map)) = (&self.amount, &mut params) {
            map.insert(
                "amount".to_string(),
                serde_json::Value::String(amount.as_yoctonear().to_string()),
            );
        }
        params
    }
}

/// The body that gets hashed and signed: the RPC method plus its parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransactionBody<'a> {
    pub method: &'a str,
    pub params: &'a serde_json::Value,
}

impl TransactionBody<'_> {
    /// SHA-256 of the body's JSON encoding.
    ///
    /// `serde_json` maps keep keys sorted, so equal bodies hash equally.
    pub fn hash(&self) -> Result<[u8; 32], serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(Sha256::digest(&bytes).into())
    }
}

/// A signed transaction envelope, as sent to the node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The parameter document being submitted.
    pub body: serde_json::Value,
    /// Public key of the signing credential.
    pub public_key: String,
    /// Signature over the body hash.
    pub signature: Signature,
    /// Base58 body hash.
    pub hash: String,
}

/// What the node hands back for an accepted submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTransactionResponse {
    /// Transaction hash to poll with `get_transaction_status`.
    pub hash: String,
}
