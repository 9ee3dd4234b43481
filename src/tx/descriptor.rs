//! Chain-family tagged transaction descriptors returned by the routing service

use super::{
    CosmosTransaction, EvmTransaction, SolanaTransaction, StarknetTransaction, TransferTransaction,
    TronTransaction,
};
use crate::error::{ExecutorError, ExecutorResult};
use crate::model::ChainFamily;

use serde::{Deserialize, Serialize};

/// An unsigned, chain-family specific transaction.
///
/// The tag decides which signer handles it. Every match over this enum is
/// exhaustive so a new family cannot be silently skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransactionDescriptor {
    #[serde(rename = "EVM")]
    Evm(EvmTransaction),
    #[serde(rename = "COSMOS")]
    Cosmos(CosmosTransaction),
    #[serde(rename = "SOLANA")]
    Solana(SolanaTransaction),
    #[serde(rename = "TRANSFER")]
    Transfer(TransferTransaction),
    #[serde(rename = "STARKNET")]
    Starknet(StarknetTransaction),
    #[serde(rename = "TRON")]
    Tron(TronTransaction),
}

impl TransactionDescriptor {
    /// Parse and validate a raw descriptor from a server response
    pub fn parse(raw: serde_json::Value) -> ExecutorResult<Self> {
        let tag = raw
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                ExecutorError::MalformedTransaction("transaction has no `type` tag".to_string())
            })?;
        if ChainFamily::from_tag(tag).is_none() {
            return Err(ExecutorError::MalformedTransaction(format!(
                "unknown transaction type `{}`",
                tag
            )));
        }

        let descriptor: TransactionDescriptor = serde_json::from_value(raw)
            .map_err(|e| ExecutorError::MalformedTransaction(e.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> ExecutorResult<()> {
        match self {
            TransactionDescriptor::Evm(tx) => tx.validate(),
            TransactionDescriptor::Cosmos(tx) => tx.validate(),
            TransactionDescriptor::Solana(tx) => tx.validate(),
            TransactionDescriptor::Transfer(tx) => tx.validate(),
            TransactionDescriptor::Starknet(tx) => tx.validate(),
            TransactionDescriptor::Tron(tx) => tx.validate(),
        }
    }

    pub fn chain_family(&self) -> ChainFamily {
        match self {
            TransactionDescriptor::Evm(_) => ChainFamily::Evm,
            TransactionDescriptor::Cosmos(_) => ChainFamily::Cosmos,
            TransactionDescriptor::Solana(_) => ChainFamily::Solana,
            TransactionDescriptor::Transfer(_) => ChainFamily::Transfer,
            TransactionDescriptor::Starknet(_) => ChainFamily::Starknet,
            TransactionDescriptor::Tron(_) => ChainFamily::Tron,
        }
    }

    pub fn blockchain(&self) -> &str {
        match self {
            TransactionDescriptor::Evm(tx) => &tx.blockchain,
            TransactionDescriptor::Cosmos(tx) => &tx.blockchain,
            TransactionDescriptor::Solana(tx) => &tx.blockchain,
            TransactionDescriptor::Transfer(tx) => &tx.blockchain,
            TransactionDescriptor::Starknet(tx) => &tx.blockchain,
            TransactionDescriptor::Tron(tx) => &tx.blockchain,
        }
    }

    /// True when the descriptor is (or embeds) an allowance transaction that
    /// must be confirmed before the main transaction is built
    pub fn requires_approval(&self) -> bool {
        match self {
            TransactionDescriptor::Evm(tx) => tx.requires_approval(),
            TransactionDescriptor::Starknet(tx) => tx.is_approval_tx,
            TransactionDescriptor::Tron(tx) => tx.is_approval_tx,
            TransactionDescriptor::Cosmos(_)
            | TransactionDescriptor::Solana(_)
            | TransactionDescriptor::Transfer(_) => false,
        }
    }

    /// The approval-only projection of this descriptor, if it needs one
    pub fn approval(&self) -> Option<TransactionDescriptor> {
        match self {
            TransactionDescriptor::Evm(tx) => tx.approval_view().map(TransactionDescriptor::Evm),
            TransactionDescriptor::Starknet(tx) if tx.is_approval_tx => Some(self.clone()),
            TransactionDescriptor::Tron(tx) if tx.is_approval_tx => Some(self.clone()),
            TransactionDescriptor::Starknet(_)
            | TransactionDescriptor::Tron(_)
            | TransactionDescriptor::Cosmos(_)
            | TransactionDescriptor::Solana(_)
            | TransactionDescriptor::Transfer(_) => None,
        }
    }
}
