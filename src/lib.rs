//! Cross-chain swap route executor
//!
//! Executes server-computed swap routes step by step: fetches each step's
//! transaction from the routing service, confirms token approvals, signs and
//! broadcasts through caller-provided signers, and polls until every step
//! settles.

pub mod api;
pub mod chain;
pub mod config;
pub mod coordination;
pub mod error;
pub mod events;
pub mod metrics;
pub mod model;
pub mod state;
pub mod tx;

pub use api::{HttpSwapApi, SwapApi};
pub use chain::{ChainSigner, SignerError, SignerSet, SubmittedTx};
pub use config::{ExecutorConfig, Settings};
pub use coordination::{
    cancel_pair, ApprovalOutcome, CancelHandle, CancelSignal, PollPolicy, RouteExecutor,
    RouteOutcome, StepResult,
};
pub use error::{ExecutorError, ExecutorResult, RouteError};
pub use events::ExecutionEvent;
pub use model::{Asset, ChainFamily, Route, Step, TxStatus};
pub use state::{ExecutionState, RouteState};
pub use tx::TransactionDescriptor;
