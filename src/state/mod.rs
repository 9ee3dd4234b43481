//! Route execution state
//!
//! Tracks which step a route is on and how it ended. State lives in memory for
//! the duration of one executor call; callers that want to resume persist the
//! failing step themselves.

mod execution;

pub use execution::{ErrorInfo, ExecutionState, RouteState};
