use serde::{Deserialize, Serialize};
use std::fmt;

/// A fungible token on a specific blockchain.
///
/// `address == None` denotes the chain's native asset. Equality is by the
/// full `(blockchain, address, symbol)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub blockchain: String,
    #[serde(default)]
    pub address: Option<String>,
    pub symbol: String,
}

impl Asset {
    pub fn new(blockchain: impl Into<String>, address: Option<&str>, symbol: impl Into<String>) -> Self {
        Self {
            blockchain: blockchain.into(),
            address: address.map(str::to_string),
            symbol: symbol.into(),
        }
    }

    pub fn native(blockchain: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::new(blockchain, None, symbol)
    }

    pub fn is_native(&self) -> bool {
        self.address.is_none()
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{}.{}--{}", self.blockchain, self.symbol, address),
            None => write!(f, "{}.{}", self.blockchain, self.symbol),
        }
    }
}
