use super::Asset;
use crate::error::{ExecutorError, ExecutorResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Blockchain families with a distinct transaction shape and signer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainFamily {
    #[serde(rename = "EVM")]
    Evm,
    #[serde(rename = "COSMOS")]
    Cosmos,
    #[serde(rename = "SOLANA")]
    Solana,
    #[serde(rename = "TRANSFER")]
    Transfer,
    #[serde(rename = "STARKNET")]
    Starknet,
    #[serde(rename = "TRON")]
    Tron,
}

impl ChainFamily {
    pub const ALL: [ChainFamily; 6] = [
        ChainFamily::Evm,
        ChainFamily::Cosmos,
        ChainFamily::Solana,
        ChainFamily::Transfer,
        ChainFamily::Starknet,
        ChainFamily::Tron,
    ];

    /// Wire tag, also used as a metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "EVM",
            ChainFamily::Cosmos => "COSMOS",
            ChainFamily::Solana => "SOLANA",
            ChainFamily::Transfer => "TRANSFER",
            ChainFamily::Starknet => "STARKNET",
            ChainFamily::Tron => "TRON",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == tag)
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One swap or bridge action of a route, bound to a single chain family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub from_asset: Asset,
    pub to_asset: Asset,
    pub from_amount: String,
    pub to_amount: String,
    pub swapper_id: String,
    pub chain_family: ChainFamily,
}

/// A server-computed, ordered plan of steps.
///
/// Steps are 1-indexed to match the routing service's numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub request_id: String,
    pub steps: Vec<Step>,
    /// Connected wallet address per blockchain name
    #[serde(default)]
    pub wallets: BTreeMap<String, String>,
}

impl Route {
    pub fn new(request_id: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            request_id: request_id.into(),
            steps,
            wallets: BTreeMap::new(),
        }
    }

    pub fn with_wallet(mut self, blockchain: impl Into<String>, address: impl Into<String>) -> Self {
        self.wallets.insert(blockchain.into(), address.into());
        self
    }

    /// Number of steps, saturating at `u32::MAX`. `validate` rejects routes
    /// that do not fit.
    pub fn step_count(&self) -> u32 {
        checked_step_count(self.steps.len()).unwrap_or(u32::MAX)
    }

    /// Look up a step by its 1-based index
    pub fn step(&self, index: u32) -> ExecutorResult<&Step> {
        if index == 0 {
            return Err(ExecutorError::InvalidRoute(
                "step indices start at 1".to_string(),
            ));
        }
        self.steps
            .get(index as usize - 1)
            .ok_or_else(|| {
                ExecutorError::InvalidRoute(format!(
                    "step {} out of range (route has {} steps)",
                    index,
                    self.steps.len()
                ))
            })
    }

    /// Wallet connected on the step's source chain
    pub fn wallet_for(&self, index: u32) -> ExecutorResult<&str> {
        let step = self.step(index)?;
        self.wallets
            .get(&step.from_asset.blockchain)
            .map(String::as_str)
            .ok_or_else(|| ExecutorError::WalletNotConnected {
                blockchain: step.from_asset.blockchain.clone(),
            })
    }

    /// Sender address for a descriptor of step `index` targeting `blockchain`.
    ///
    /// Follow-up transactions may land on another chain than the step's
    /// source; the wallet on that chain signs them. Falls back to the source
    /// chain wallet when `blockchain` is empty or has no connected wallet.
    pub fn sender_for(&self, index: u32, blockchain: &str) -> ExecutorResult<&str> {
        match self.wallets.get(blockchain) {
            Some(address) if !blockchain.is_empty() => Ok(address.as_str()),
            _ => self.wallet_for(index),
        }
    }

    pub fn validate(&self) -> ExecutorResult<()> {
        if self.request_id.trim().is_empty() {
            return Err(ExecutorError::InvalidRoute("missing requestId".to_string()));
        }
        if self.steps.is_empty() {
            return Err(ExecutorError::InvalidRoute(format!(
                "route {} has no steps",
                self.request_id
            )));
        }
        checked_step_count(self.steps.len())?;
        Ok(())
    }
}

fn checked_step_count(len: usize) -> ExecutorResult<u32> {
    u32::try_from(len).map_err(|_| {
        ExecutorError::InvalidRoute(format!(
            "route has {} steps, more than {} supported",
            len,
            u32::MAX
        ))
    })
}

/// User preferences forwarded with every transaction-creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Slippage tolerance in percent, e.g. `"1.0"`
    pub slippage: String,
    #[serde(default)]
    pub infinite_approve: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            slippage: "1.0".to_string(),
            infinite_approve: false,
        }
    }
}

/// Which checks the routing service runs before building a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validations {
    pub balance: bool,
    pub fee: bool,
    pub approve: bool,
}

impl Default for Validations {
    fn default() -> Self {
        Self {
            balance: true,
            fee: true,
            approve: true,
        }
    }
}
