use serde::{Deserialize, Deserializer, Serialize};

/// Terminal outcome of a submitted transaction.
///
/// A transaction that has not settled yet is represented by `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Success,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Success => "SUCCESS",
            TxStatus::Failed => "FAILED",
        }
    }

    /// Deserializes any non-terminal status (`null`, `"RUNNING"`, ...) as `None`
    pub fn deserialize_terminal<'de, D>(deserializer: D) -> Result<Option<TxStatus>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(match raw.as_deref().map(str::to_ascii_uppercase).as_deref() {
            Some("SUCCESS") => Some(TxStatus::Success),
            Some("FAILED") => Some(TxStatus::Failed),
            _ => None,
        })
    }
}

/// Block explorer link for a submitted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerUrl {
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
}

/// Event type attached to a client-side failure report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureEventType {
    SendTxFailed,
    UserRejected,
    ApprovalFailed,
    TxFailed,
    Timeout,
    ClientError,
}

impl FailureEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureEventType::SendTxFailed => "SEND_TX_FAILED",
            FailureEventType::UserRejected => "USER_REJECTED",
            FailureEventType::ApprovalFailed => "APPROVAL_FAILED",
            FailureEventType::TxFailed => "TX_FAILED",
            FailureEventType::Timeout => "TIMEOUT",
            FailureEventType::ClientError => "CLIENT_ERROR",
        }
    }
}
