//! Routing service interface
//!
//! The executor only needs four calls from the remote service: build a step's
//! transaction, check an approval, check a transaction's status, and accept a
//! failure report. `HttpSwapApi` implements them over HTTP.

pub mod http;

pub use http::HttpSwapApi;

use crate::error::ExecutorResult;
use crate::model::{ExplorerUrl, FailureEventType, TxStatus, UserSettings, Validations};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapApi: Send + Sync {
    /// Ask the service to build the transaction for one route step
    async fn create_step_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> ExecutorResult<CreateTransactionResponse>;

    /// Check whether an approval transaction granted enough allowance
    async fn is_approved(&self, request_id: &str, tx_id: &str) -> ExecutorResult<ApprovalResponse>;

    /// Check the settlement status of a submitted step transaction
    async fn check_status(&self, request: &CheckStatusRequest) -> ExecutorResult<StatusResponse>;

    /// Tell the service a step failed on the client side
    async fn report_failure(&self, report: &FailureReport) -> ExecutorResult<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub request_id: String,
    pub step: u32,
    pub user_settings: UserSettings,
    pub validations: Validations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    /// Raw chain-family tagged descriptor, validated by the step executor
    #[serde(default)]
    pub transaction: Option<serde_json::Value>,
}

impl CreateTransactionResponse {
    pub fn with_transaction(transaction: serde_json::Value) -> Self {
        Self {
            ok: true,
            error: None,
            error_code: None,
            transaction: Some(transaction),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            error_code: None,
            transaction: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub is_approved: bool,
    #[serde(default)]
    pub current_approved_amount: Option<String>,
    #[serde(default)]
    pub required_approved_amount: Option<String>,
    #[serde(default, deserialize_with = "TxStatus::deserialize_terminal")]
    pub tx_status: Option<TxStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckStatusRequest {
    pub request_id: String,
    pub step: u32,
    pub tx_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(default, deserialize_with = "TxStatus::deserialize_terminal")]
    pub status: Option<TxStatus>,
    #[serde(default)]
    pub extra_message: Option<String>,
    #[serde(default)]
    pub output_amount: Option<String>,
    /// Follow-up transaction the swapper needs before the step is complete
    #[serde(default)]
    pub new_tx: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub explorer_url: Vec<ExplorerUrl>,
}

impl StatusResponse {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn terminal(status: TxStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub request_id: String,
    pub event_type: FailureEventType,
    pub reason: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
