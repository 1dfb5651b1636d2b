//! Core types shared by the key stores, signers and node client.

mod key;
mod network;
mod transaction;

pub use key::{KeyPair, Signature};
pub use near_account_id::AccountId;
pub use near_token::NearToken;
pub use network::NetworkId;
pub use transaction::{
    SignedTransaction, SubmitTransactionResponse, TransactionBody, TransactionRequest,
};
