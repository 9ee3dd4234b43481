//! Solana transaction descriptors

use crate::error::{ExecutorError, ExecutorResult};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolanaTxKind {
    Legacy,
    Versioned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaTransaction {
    #[serde(rename = "blockChain", alias = "blockchain", default)]
    pub blockchain: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub recent_blockhash: Option<String>,
    /// Pre-serialized message bytes, mutually exclusive with `instructions`
    #[serde(default)]
    pub serialized_message: Option<Vec<u8>>,
    #[serde(default)]
    pub instructions: Vec<SolanaInstruction>,
    #[serde(default)]
    pub signatures: Vec<SolanaSignature>,
    #[serde(default = "default_kind")]
    pub tx_type: SolanaTxKind,
}

fn default_kind() -> SolanaTxKind {
    SolanaTxKind::Legacy
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaInstruction {
    pub program_id: String,
    #[serde(default)]
    pub keys: Vec<SolanaAccountMeta>,
    #[serde(default)]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaAccountMeta {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolanaSignature {
    pub signature: Vec<u8>,
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

impl SolanaTransaction {
    pub fn validate(&self) -> ExecutorResult<()> {
        if self.from.as_deref().map_or(true, str::is_empty) {
            return Err(ExecutorError::MalformedTransaction(
                "Solana transaction is missing `from`".to_string(),
            ));
        }

        let has_message = self
            .serialized_message
            .as_ref()
            .map_or(false, |m| !m.is_empty());
        if !has_message && self.instructions.is_empty() {
            return Err(ExecutorError::MalformedTransaction(
                "Solana transaction has neither `serializedMessage` nor `instructions`"
                    .to_string(),
            ));
        }

        if let Some(ix) = self.instructions.iter().find(|ix| ix.program_id.is_empty()) {
            return Err(ExecutorError::MalformedTransaction(format!(
                "Solana instruction with {} keys has no program id",
                ix.keys.len()
            )));
        }

        Ok(())
    }

    pub fn is_pre_serialized(&self) -> bool {
        self.serialized_message.is_some()
    }
}
