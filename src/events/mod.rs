//! Progress events emitted while a route executes
//!
//! Events are fanned out over a broadcast channel. Nobody is required to listen,
//! and a lagging subscriber only loses its own backlog.

use crate::model::{ChainFamily, TxStatus};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Observable milestones of a route execution
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    RouteStarted {
        request_id: String,
        step_count: u32,
        start_step: u32,
    },

    StepStarted {
        request_id: String,
        step: u32,
        chain_family: ChainFamily,
    },

    /// An allowance transaction was broadcast
    ApprovalSubmitted {
        request_id: String,
        step: u32,
        tx_id: String,
    },

    ApprovalConfirmed {
        request_id: String,
        step: u32,
        tx_id: String,
    },

    TransactionSubmitted {
        request_id: String,
        step: u32,
        tx_id: String,
        chain_family: ChainFamily,
    },

    /// A status check returned; `status` is `None` while still pending
    StatusPolled {
        request_id: String,
        step: u32,
        tx_id: String,
        status: Option<TxStatus>,
    },

    StepSucceeded {
        request_id: String,
        step: u32,
        tx_id: String,
        output_amount: Option<String>,
    },

    StepFailed {
        request_id: String,
        step: u32,
        error: String,
    },

    RouteCompleted {
        request_id: String,
    },

    RouteFailed {
        request_id: String,
        step: u32,
        error: String,
    },
}

impl ExecutionEvent {
    /// Get event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            ExecutionEvent::RouteStarted { .. } => "RouteStarted",
            ExecutionEvent::StepStarted { .. } => "StepStarted",
            ExecutionEvent::ApprovalSubmitted { .. } => "ApprovalSubmitted",
            ExecutionEvent::ApprovalConfirmed { .. } => "ApprovalConfirmed",
            ExecutionEvent::TransactionSubmitted { .. } => "TransactionSubmitted",
            ExecutionEvent::StatusPolled { .. } => "StatusPolled",
            ExecutionEvent::StepSucceeded { .. } => "StepSucceeded",
            ExecutionEvent::StepFailed { .. } => "StepFailed",
            ExecutionEvent::RouteCompleted { .. } => "RouteCompleted",
            ExecutionEvent::RouteFailed { .. } => "RouteFailed",
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            ExecutionEvent::RouteStarted { request_id, .. }
            | ExecutionEvent::StepStarted { request_id, .. }
            | ExecutionEvent::ApprovalSubmitted { request_id, .. }
            | ExecutionEvent::ApprovalConfirmed { request_id, .. }
            | ExecutionEvent::TransactionSubmitted { request_id, .. }
            | ExecutionEvent::StatusPolled { request_id, .. }
            | ExecutionEvent::StepSucceeded { request_id, .. }
            | ExecutionEvent::StepFailed { request_id, .. }
            | ExecutionEvent::RouteCompleted { request_id }
            | ExecutionEvent::RouteFailed { request_id, .. } => request_id,
        }
    }

    /// True for events that end a route
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ExecutionEvent::RouteCompleted { .. } | ExecutionEvent::RouteFailed { .. }
        )
    }
}

/// Broadcast fan-out for execution events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ExecutionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: ExecutionEvent) {
        trace!(event = event.name(), request_id = event.request_id(), "Publishing event");
        // No receivers is fine
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
