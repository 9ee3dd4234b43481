//! Route orchestration
//!
//! The coordination layer:
//! 1. Builds each step's transaction through the routing service
//! 2. Confirms token approvals before the main transaction
//! 3. Signs and broadcasts through the caller's signers
//! 4. Polls until each transaction settles
//! 5. Reports client-side failures back to the routing service

pub mod approval;
pub mod cancel;
pub mod engine;
pub mod poller;
pub mod reporter;
pub mod step;

pub use approval::{ApprovalFlow, ApprovalOutcome, DEFAULT_APPROVAL_GRACE_POLLS};
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use engine::{RouteExecutor, RouteOutcome};
pub use poller::{PollPolicy, StatusPoller, StatusResult};
pub use reporter::FailureReporter;
pub use step::{StepExecutor, StepResult};
