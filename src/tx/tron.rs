//! Tron transaction descriptors (pre-built by the routing service)

use crate::error::{ExecutorError, ExecutorResult};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TronTransaction {
    #[serde(rename = "blockChain", alias = "blockchain", default)]
    pub blockchain: String,
    #[serde(rename = "isApprovalTx", default)]
    pub is_approval_tx: bool,
    #[serde(rename = "txID", default)]
    pub tx_id: Option<String>,
    #[serde(default)]
    pub raw_data: Option<serde_json::Value>,
    #[serde(default)]
    pub raw_data_hex: Option<String>,
    #[serde(default)]
    pub visible: bool,
}

impl TronTransaction {
    pub fn validate(&self) -> ExecutorResult<()> {
        if self.tx_id.as_deref().map_or(true, str::is_empty) {
            return Err(ExecutorError::MalformedTransaction(
                "Tron transaction is missing `txID`".to_string(),
            ));
        }

        let raw_hex = self
            .raw_data_hex
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                ExecutorError::MalformedTransaction(
                    "Tron transaction is missing `raw_data_hex`".to_string(),
                )
            })?;
        hex::decode(raw_hex).map_err(|e| {
            ExecutorError::MalformedTransaction(format!("invalid Tron `raw_data_hex`: {}", e))
        })?;

        Ok(())
    }
}
