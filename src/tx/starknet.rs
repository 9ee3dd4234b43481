//! Starknet multicall descriptors

use crate::error::{ExecutorError, ExecutorResult};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarknetTransaction {
    #[serde(rename = "blockChain", alias = "blockchain", default)]
    pub blockchain: String,
    #[serde(default)]
    pub is_approval_tx: bool,
    #[serde(default)]
    pub calls: Vec<StarknetCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarknetCall {
    pub contract_address: String,
    pub entrypoint: String,
    #[serde(default)]
    pub calldata: Vec<String>,
}

impl StarknetTransaction {
    pub fn validate(&self) -> ExecutorResult<()> {
        if self.calls.is_empty() {
            return Err(ExecutorError::MalformedTransaction(
                "Starknet transaction has no calls".to_string(),
            ));
        }
        for call in &self.calls {
            if call.contract_address.is_empty() || call.entrypoint.is_empty() {
                return Err(ExecutorError::MalformedTransaction(format!(
                    "Starknet call `{}` on `{}` is incomplete",
                    call.entrypoint, call.contract_address
                )));
            }
        }
        Ok(())
    }
}
