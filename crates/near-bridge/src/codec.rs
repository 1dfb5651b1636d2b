//! Argument and result encoding.
//!
//! Contract arguments travel to the node as raw bytes, and view results come
//! back as raw bytes. Both sides use UTF-8 JSON so the node can decode them
//! independently of how the caller represents them in memory.
//!
//! ```
//! use near_bridge::codec;
//! use serde_json::json;
//!
//! let bytes = codec::encode_args(&json!({"account_id": "alice.near"})).unwrap();
//! assert_eq!(bytes, br#"{"account_id":"alice.near"}"#);
//!
//! let value: serde_json::Value = codec::decode_result(&bytes).unwrap();
//! assert_eq!(value["account_id"], "alice.near");
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encode an argument document to bytes.
pub fn encode_args<A: Serialize + ?Sized>(args: &A) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(args)
}

/// Decode a result payload.
///
/// An empty payload decodes as JSON `null`, which is what methods without a
/// return value produce.
pub fn decode_result<R: DeserializeOwned>(bytes: &[u8]) -> Result<R, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_slice(b"null");
    }
    serde_json::from_slice(bytes)
}
