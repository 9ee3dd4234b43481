//! Cosmos SDK transaction descriptors
//!
//! Either a set of signable messages with their fee (`data`) or a plain
//! IBC/bank transfer (`rawTransfer`) handled by the wallet itself.

use crate::error::{ExecutorError, ExecutorResult};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmosTransaction {
    #[serde(rename = "blockChain", alias = "blockchain", default)]
    pub blockchain: String,
    #[serde(default)]
    pub from_wallet_address: Option<String>,
    #[serde(default)]
    pub data: Option<CosmosMessage>,
    #[serde(default)]
    pub raw_transfer: Option<CosmosRawTransfer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CosmosSignType {
    Amino,
    Direct,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmosMessage {
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default, alias = "account_number")]
    pub account_number: Option<u64>,
    #[serde(default)]
    pub sequence: Option<String>,
    #[serde(default)]
    pub msgs: Vec<serde_json::Value>,
    #[serde(default)]
    pub proto_msgs: Vec<serde_json::Value>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub fee: Option<CosmosFee>,
    #[serde(default = "default_sign_type")]
    pub sign_type: CosmosSignType,
    #[serde(default)]
    pub rpc_url: Option<String>,
}

fn default_sign_type() -> CosmosSignType {
    CosmosSignType::Amino
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmosFee {
    pub gas: String,
    #[serde(default)]
    pub amount: Vec<CosmosCoin>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmosCoin {
    pub denom: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmosRawTransfer {
    pub amount: String,
    pub asset: String,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub memo: Option<String>,
    pub method: String,
    pub recipient: String,
}

impl CosmosTransaction {
    pub fn validate(&self) -> ExecutorResult<()> {
        match (&self.data, &self.raw_transfer) {
            (Some(message), _) => message.validate(),
            (None, Some(transfer)) => {
                if transfer.recipient.is_empty() || transfer.amount.is_empty() {
                    return Err(ExecutorError::MalformedTransaction(
                        "Cosmos raw transfer needs a recipient and amount".to_string(),
                    ));
                }
                Ok(())
            }
            (None, None) => Err(ExecutorError::MalformedTransaction(
                "Cosmos transaction has neither `data` nor `rawTransfer`".to_string(),
            )),
        }
    }
}

impl CosmosMessage {
    fn validate(&self) -> ExecutorResult<()> {
        if self.chain_id.as_deref().map_or(true, str::is_empty) {
            return Err(ExecutorError::MalformedTransaction(
                "Cosmos message is missing `chainId`".to_string(),
            ));
        }
        if self.msgs.is_empty() && self.proto_msgs.is_empty() {
            return Err(ExecutorError::MalformedTransaction(
                "Cosmos message has no `msgs` to sign".to_string(),
            ));
        }
        if self.fee.is_none() {
            return Err(ExecutorError::MalformedTransaction(
                "Cosmos message is missing `fee`".to_string(),
            ));
        }
        Ok(())
    }
}
