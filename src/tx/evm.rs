//! EVM transaction descriptors
//!
//! A descriptor carries two call views. The main view (`txTo`/`txData`/`value`)
//! is the swap itself. The approval view (`approveTo`/`approveData`) grants the
//! swap contract an allowance and must never reuse the main view's `value` or
//! `gasLimit`, which are sized for the swap.

use crate::error::{ExecutorError, ExecutorResult};

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, TransactionRequest, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTransaction {
    #[serde(rename = "blockChain", alias = "blockchain", default)]
    pub blockchain: String,
    #[serde(default)]
    pub from: Option<String>,
    /// The whole descriptor is an approval; the real swap is fetched afterwards
    #[serde(default)]
    pub is_approval_tx: bool,
    #[serde(default)]
    pub approve_to: Option<String>,
    #[serde(default)]
    pub approve_data: Option<String>,
    #[serde(default, alias = "to")]
    pub tx_to: Option<String>,
    #[serde(default, alias = "data")]
    pub tx_data: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub gas_limit: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(default)]
    pub max_fee_per_gas: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
}

impl EvmTransaction {
    pub fn validate(&self) -> ExecutorResult<()> {
        let to = self
            .tx_to
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| malformed("EVM transaction is missing `txTo`"))?;
        parse_address("txTo", to)?;

        if let Some(from) = &self.from {
            parse_address("from", from)?;
        }
        if let Some(data) = &self.tx_data {
            parse_bytes("txData", data)?;
        }

        match (&self.approve_to, &self.approve_data) {
            (Some(to), Some(data)) => {
                parse_address("approveTo", to)?;
                parse_bytes("approveData", data)?;
            }
            (None, Some(_)) => return Err(malformed("EVM `approveData` without `approveTo`")),
            _ => {}
        }

        for (field, value) in [
            ("value", &self.value),
            ("gasLimit", &self.gas_limit),
            ("gasPrice", &self.gas_price),
            ("maxPriorityFeePerGas", &self.max_priority_fee_per_gas),
            ("maxFeePerGas", &self.max_fee_per_gas),
            ("nonce", &self.nonce),
        ] {
            if let Some(v) = value {
                parse_quantity(field, v)?;
            }
        }

        Ok(())
    }

    /// Approval is either the whole descriptor or an embedded allowance call
    pub fn requires_approval(&self) -> bool {
        self.is_approval_tx || (self.approve_to.is_some() && self.approve_data.is_some())
    }

    /// Project the approval-only transaction, if this descriptor needs one
    pub fn approval_view(&self) -> Option<EvmTransaction> {
        if self.is_approval_tx {
            return Some(EvmTransaction {
                approve_to: None,
                approve_data: None,
                ..self.clone()
            });
        }

        match (&self.approve_to, &self.approve_data) {
            (Some(to), Some(data)) => Some(EvmTransaction {
                blockchain: self.blockchain.clone(),
                from: self.from.clone(),
                is_approval_tx: true,
                approve_to: None,
                approve_data: None,
                tx_to: Some(to.clone()),
                tx_data: Some(data.clone()),
                value: None,
                gas_limit: None,
                gas_price: self.gas_price.clone(),
                max_priority_fee_per_gas: self.max_priority_fee_per_gas.clone(),
                max_fee_per_gas: self.max_fee_per_gas.clone(),
                nonce: None,
            }),
            _ => None,
        }
    }

    /// Build an unsigned ethers transaction for the call in `txTo`/`txData`.
    ///
    /// Descriptors carrying `maxFeePerGas` become EIP-1559 requests, all others legacy.
    pub fn to_typed_transaction(&self, chain_id: Option<u64>) -> ExecutorResult<TypedTransaction> {
        let to = parse_address(
            "txTo",
            self.tx_to
                .as_deref()
                .ok_or_else(|| malformed("EVM transaction is missing `txTo`"))?,
        )?;
        let from = self.from.as_deref().map(|f| parse_address("from", f)).transpose()?;
        let data = self
            .tx_data
            .as_deref()
            .map(|d| parse_bytes("txData", d))
            .transpose()?
            .unwrap_or_default();
        let value = self.quantity("value", &self.value)?;
        let gas = self.quantity("gasLimit", &self.gas_limit)?;
        let nonce = self.quantity("nonce", &self.nonce)?;

        let typed_tx = match &self.max_fee_per_gas {
            Some(max_fee) => {
                let mut tx = Eip1559TransactionRequest::new()
                    .to(to)
                    .data(data)
                    .max_fee_per_gas(parse_quantity("maxFeePerGas", max_fee)?);
                if let Some(tip) = self.quantity("maxPriorityFeePerGas", &self.max_priority_fee_per_gas)? {
                    tx = tx.max_priority_fee_per_gas(tip);
                }
                if let Some(from) = from {
                    tx = tx.from(from);
                }
                if let Some(value) = value {
                    tx = tx.value(value);
                }
                if let Some(gas) = gas {
                    tx = tx.gas(gas);
                }
                if let Some(nonce) = nonce {
                    tx = tx.nonce(nonce);
                }
                if let Some(chain_id) = chain_id {
                    tx = tx.chain_id(chain_id);
                }
                TypedTransaction::Eip1559(tx)
            }
            None => {
                let mut tx = TransactionRequest::new().to(to).data(data);
                if let Some(price) = self.quantity("gasPrice", &self.gas_price)? {
                    tx = tx.gas_price(price);
                }
                if let Some(from) = from {
                    tx = tx.from(from);
                }
                if let Some(value) = value {
                    tx = tx.value(value);
                }
                if let Some(gas) = gas {
                    tx = tx.gas(gas);
                }
                if let Some(nonce) = nonce {
                    tx = tx.nonce(nonce);
                }
                if let Some(chain_id) = chain_id {
                    tx = tx.chain_id(chain_id);
                }
                TypedTransaction::Legacy(tx)
            }
        };

        Ok(typed_tx)
    }

    fn quantity(&self, field: &str, value: &Option<String>) -> ExecutorResult<Option<U256>> {
        value.as_deref().map(|v| parse_quantity(field, v)).transpose()
    }
}

fn malformed(message: impl Into<String>) -> ExecutorError {
    ExecutorError::MalformedTransaction(message.into())
}

fn parse_address(field: &str, value: &str) -> ExecutorResult<Address> {
    value
        .parse::<Address>()
        .map_err(|e| malformed(format!("invalid EVM address in `{}`: {}", field, e)))
}

fn parse_bytes(field: &str, value: &str) -> ExecutorResult<Bytes> {
    value
        .parse::<Bytes>()
        .map_err(|e| malformed(format!("invalid hex in `{}`: {}", field, e)))
}

/// Quantities arrive either as `0x`-prefixed hex or as decimal strings
fn parse_quantity(field: &str, value: &str) -> ExecutorResult<U256> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) if hex.is_empty() => Ok(U256::zero()),
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(value).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| malformed(format!("invalid quantity in `{}`: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTER: &str = "0x1111111254eeb25477b68fb85ed929f73a960582";
    const TOKEN: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

    fn swap_tx() -> EvmTransaction {
        EvmTransaction {
            blockchain: "ETH".to_string(),
            from: Some("0x9f8c0e6a2b5d4f1e3a7c9b0d2e4f6a8b1c3d5e7f".to_string()),
            tx_to: Some(ROUTER.to_string()),
            tx_data: Some("0x12aa3caf".to_string()),
            value: Some("0x0de0b6b3a7640000".to_string()),
            gas_limit: Some("250000".to_string()),
            gas_price: Some("30000000000".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_requires_tx_to() {
        assert!(swap_tx().validate().is_ok());

        let missing = EvmTransaction {
            tx_to: None,
            ..swap_tx()
        };
        assert!(matches!(
            missing.validate(),
            Err(ExecutorError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let bad_data = EvmTransaction {
            tx_data: Some("0xzz".to_string()),
            ..swap_tx()
        };
        assert!(bad_data.validate().is_err());

        let dangling_approval = EvmTransaction {
            approve_data: Some("0x095ea7b3".to_string()),
            ..swap_tx()
        };
        assert!(dangling_approval.validate().is_err());

        let bad_gas = EvmTransaction {
            gas_limit: Some("lots".to_string()),
            ..swap_tx()
        };
        assert!(bad_gas.validate().is_err());
    }

    #[test]
    fn test_no_approval_without_flag_or_embedded_call() {
        assert!(!swap_tx().requires_approval());
        assert!(swap_tx().approval_view().is_none());
    }

    #[test]
    fn test_embedded_approval_view_drops_swap_value_and_gas() {
        let tx = EvmTransaction {
            approve_to: Some(TOKEN.to_string()),
            approve_data: Some("0x095ea7b3".to_string()),
            ..swap_tx()
        };
        assert!(tx.requires_approval());

        let approval = tx.approval_view().unwrap();
        assert!(approval.is_approval_tx);
        assert_eq!(approval.tx_to.as_deref(), Some(TOKEN));
        assert_eq!(approval.tx_data.as_deref(), Some("0x095ea7b3"));
        assert_eq!(approval.value, None);
        assert_eq!(approval.gas_limit, None);
        assert_eq!(approval.gas_price, tx.gas_price);
        assert!(approval.approve_to.is_none());
    }

    #[test]
    fn test_flagged_approval_tx_is_its_own_view() {
        let tx = EvmTransaction {
            is_approval_tx: true,
            tx_to: Some(TOKEN.to_string()),
            value: None,
            ..swap_tx()
        };
        let approval = tx.approval_view().unwrap();
        assert_eq!(approval.tx_to.as_deref(), Some(TOKEN));
        assert_eq!(approval.gas_limit, tx.gas_limit);
    }

    #[test]
    fn test_typed_transaction_legacy() {
        let typed = swap_tx().to_typed_transaction(Some(1)).unwrap();
        assert!(matches!(typed, TypedTransaction::Legacy(_)));
        assert_eq!(typed.gas(), Some(&U256::from(250_000u64)));
        assert_eq!(typed.value(), Some(&U256::exp10(18)));
    }

    #[test]
    fn test_typed_transaction_eip1559() {
        let tx = EvmTransaction {
            gas_price: None,
            max_fee_per_gas: Some("0x6fc23ac00".to_string()),
            max_priority_fee_per_gas: Some("1000000000".to_string()),
            ..swap_tx()
        };
        let typed = tx.to_typed_transaction(None).unwrap();
        assert!(matches!(typed, TypedTransaction::Eip1559(_)));
    }

    #[test]
    fn test_deserialize_wire_names() {
        let json = serde_json::json!({
            "blockChain": "BSC",
            "isApprovalTx": true,
            "txTo": TOKEN,
            "txData": "0x095ea7b3",
            "gasLimit": "0xb71b"
        });
        let tx: EvmTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx.blockchain, "BSC");
        assert!(tx.is_approval_tx);
        assert_eq!(tx.gas_limit.as_deref(), Some("0xb71b"));
        assert!(tx.validate().is_ok());
    }
}
