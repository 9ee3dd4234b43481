//! Error types for the swap executor

use crate::model::FailureEventType;
use thiserror::Error;

/// Main error type for route execution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("Transaction creation failed for step {step}: {message}")]
    TransactionCreation { step: u32, message: String },

    #[error("Approval failed (approved {current:?}, required {required:?}): {message}")]
    ApprovalFailed {
        message: String,
        current: Option<String>,
        required: Option<String>,
    },

    #[error("Step {step} failed on chain: {reason}")]
    StepExecutionFailed { step: u32, reason: String },

    #[error("Signer rejected the transaction: {0}")]
    SignerRejected(String),

    #[error("Signer error: {0}")]
    Signer(String),

    #[error("No wallet connected for blockchain {blockchain}")]
    WalletNotConnected { blockchain: String },

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Cancelled while waiting for {operation}")]
    Cancelled { operation: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExecutorError {
    /// Transient transport errors only. Polling loops swallow these.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutorError::Api(_))
    }

    /// User-initiated aborts are not reported back to the routing service
    pub fn should_report(&self) -> bool {
        !matches!(self, ExecutorError::Cancelled { .. })
    }

    /// Event type used when reporting this error to the routing service
    pub fn failure_event(&self) -> FailureEventType {
        match self {
            ExecutorError::SignerRejected(_) => FailureEventType::UserRejected,
            ExecutorError::Signer(_) | ExecutorError::WalletNotConnected { .. } => {
                FailureEventType::SendTxFailed
            }
            ExecutorError::ApprovalFailed { .. } => FailureEventType::ApprovalFailed,
            ExecutorError::StepExecutionFailed { .. } => FailureEventType::TxFailed,
            ExecutorError::Timeout { .. } => FailureEventType::Timeout,
            _ => FailureEventType::ClientError,
        }
    }

    /// Short stable name, used as a metrics label and in `ErrorInfo`
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutorError::MalformedTransaction(_) => "malformed_transaction",
            ExecutorError::TransactionCreation { .. } => "transaction_creation",
            ExecutorError::ApprovalFailed { .. } => "approval_failed",
            ExecutorError::StepExecutionFailed { .. } => "step_execution_failed",
            ExecutorError::SignerRejected(_) => "signer_rejected",
            ExecutorError::Signer(_) => "signer",
            ExecutorError::WalletNotConnected { .. } => "wallet_not_connected",
            ExecutorError::InvalidRoute(_) => "invalid_route",
            ExecutorError::Timeout { .. } => "timeout",
            ExecutorError::Cancelled { .. } => "cancelled",
            ExecutorError::Api(_) => "api",
            ExecutorError::Config(_) => "config",
        }
    }
}

impl From<reqwest::Error> for ExecutorError {
    fn from(e: reqwest::Error) -> Self {
        ExecutorError::Api(e.to_string())
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// A fatal error attributed to the route step it happened in
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Route {request_id} failed at step {step}: {source}")]
pub struct RouteError {
    pub request_id: String,
    pub step: u32,
    #[source]
    pub source: ExecutorError,
}
