//! Network identification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseNetworkIdError;

const MAX_LEN: usize = 64;

/// The name of a ledger deployment that scopes which keys apply.
///
/// Network IDs are restricted to ASCII alphanumerics, `-` and `.`. The
/// underscore separates network and account in key file names, and path
/// separators would let a network ID point outside the key directory, so
/// both are rejected.
///
/// ```
/// use near_bridge::NetworkId;
///
/// let network: NetworkId = "testnet".parse().unwrap();
/// assert_eq!(network.as_str(), "testnet");
/// assert!("test_net".parse::<NetworkId>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkId(String);

impl NetworkId {
    /// Validate and wrap a network name.
    pub fn new(id: impl Into<String>) -> Result<Self, ParseNetworkIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ParseNetworkIdError::Empty);
        }
        if id.len() > MAX_LEN {
            return Err(ParseNetworkIdError::TooLong(id));
        }
        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '.'))
        {
            return Err(ParseNetworkIdError::InvalidChar(id, c));
        }
        if id.chars().all(|c| c == '.') {
            return Err(ParseNetworkIdError::InvalidChar(id, '.'));
        }
        Ok(Self(id))
    }

    /// The network name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for NetworkId {
    type Err = ParseNetworkIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for NetworkId {
    type Error = ParseNetworkIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for NetworkId {
    type Error = ParseNetworkIdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<NetworkId> for String {
    fn from(id: NetworkId) -> Self {
        id.0
    }
}

impl AsRef<str> for NetworkId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
