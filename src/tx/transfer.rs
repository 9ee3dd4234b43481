//! Generic transfer descriptors for UTXO-style chains (BTC, LTC, DOGE, ...)

use crate::error::{ExecutorError, ExecutorResult};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferTransaction {
    #[serde(rename = "blockChain", alias = "blockchain", default)]
    pub blockchain: String,
    #[serde(default)]
    pub from_wallet_address: Option<String>,
    #[serde(default)]
    pub recipient_address: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    /// Base64 partially signed bitcoin transaction
    #[serde(default)]
    pub psbt: Option<String>,
}

impl TransferTransaction {
    pub fn validate(&self) -> ExecutorResult<()> {
        if self.has_psbt() {
            return Ok(());
        }

        let recipient = self.recipient_address.as_deref().unwrap_or_default();
        let amount = self.amount.as_deref().unwrap_or_default();
        if recipient.is_empty() || amount.is_empty() {
            return Err(ExecutorError::MalformedTransaction(
                "Transfer needs either a PSBT or a recipient and amount".to_string(),
            ));
        }
        Ok(())
    }

    pub fn has_psbt(&self) -> bool {
        self.psbt.as_deref().map_or(false, |p| !p.is_empty())
    }
}
