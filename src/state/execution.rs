//! Per-route execution state

use crate::error::ExecutorError;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Serializable summary of the error that ended a route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
}

impl From<&ExecutorError> for ErrorInfo {
    fn from(e: &ExecutorError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RouteState {
    NotStarted,
    Running { current_step: u32 },
    Completed,
    Failed { step: u32, error: ErrorInfo },
}

impl RouteState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RouteState::Completed | RouteState::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RouteState::NotStarted => "not_started",
            RouteState::Running { .. } => "running",
            RouteState::Completed => "completed",
            RouteState::Failed { .. } => "failed",
        }
    }
}

/// State owned by a single route execution.
///
/// `current_step` only moves forward, one step at a time, and only after the
/// previous step settled with SUCCESS.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionState {
    pub run_id: Uuid,
    pub request_id: String,
    pub step_count: u32,
    state: RouteState,
    pub last_error: Option<ErrorInfo>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ExecutionState {
    pub fn new(request_id: impl Into<String>, step_count: u32) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            request_id: request_id.into(),
            step_count,
            state: RouteState::NotStarted,
            last_error: None,
            started_at: None,
            updated_at: Utc::now(),
        }
    }

    pub fn state(&self) -> &RouteState {
        &self.state
    }

    /// Step being executed, if the route is running
    pub fn current_step(&self) -> Option<u32> {
        match self.state {
            RouteState::Running { current_step } => Some(current_step),
            _ => None,
        }
    }

    /// `NotStarted -> Running(first_step)`
    pub fn start(&mut self, first_step: u32) -> Result<(), ExecutorError> {
        if self.state != RouteState::NotStarted {
            return Err(self.invalid_transition("start"));
        }
        if first_step == 0 || first_step > self.step_count {
            return Err(ExecutorError::InvalidRoute(format!(
                "cannot start at step {} of {}",
                first_step, self.step_count
            )));
        }

        let now = Utc::now();
        self.started_at = Some(now);
        self.set(RouteState::Running {
            current_step: first_step,
        });
        Ok(())
    }

    /// Record the success of the current step. Moves to the next step, or to
    /// `Completed` after the last one.
    pub fn advance(&mut self) -> Result<&RouteState, ExecutorError> {
        let current_step = self
            .current_step()
            .ok_or_else(|| self.invalid_transition("advance"))?;

        let next = if current_step >= self.step_count {
            RouteState::Completed
        } else {
            RouteState::Running {
                current_step: current_step + 1,
            }
        };
        self.set(next);
        Ok(&self.state)
    }

    /// `Running(i) -> Failed(i, err)`
    pub fn fail(&mut self, error: &ExecutorError) -> Result<u32, ExecutorError> {
        let step = self
            .current_step()
            .ok_or_else(|| self.invalid_transition("fail"))?;

        let info = ErrorInfo::from(error);
        self.last_error = Some(info.clone());
        self.set(RouteState::Failed { step, error: info });
        Ok(step)
    }

    fn set(&mut self, state: RouteState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    fn invalid_transition(&self, action: &str) -> ExecutorError {
        ExecutorError::InvalidRoute(format!(
            "cannot {} route {} in state {}",
            action,
            self.request_id,
            self.state.name()
        ))
    }
}
