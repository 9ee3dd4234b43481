//! Route execution engine
//!
//! Drives a route through its steps strictly in order. A step starts only after
//! the previous one settled with SUCCESS; the first error ends the route.

use super::reporter::FailureReporter;
use super::step::{StepExecutor, StepResult};
use super::CancelSignal;
use crate::api::SwapApi;
use crate::chain::SignerSet;
use crate::config::ExecutorConfig;
use crate::error::{ExecutorError, RouteError};
use crate::events::{EventBus, ExecutionEvent};
use crate::model::Route;
use crate::state::{ExecutionState, RouteState};
use crate::tx::TransactionSender;

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{error, info};

/// Result of a route that reached `Completed`
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub state: ExecutionState,
    /// Results of the steps run by this call, in order
    pub steps: Vec<StepResult>,
}

impl RouteOutcome {
    pub fn request_id(&self) -> &str {
        &self.state.request_id
    }

    pub fn is_completed(&self) -> bool {
        *self.state.state() == RouteState::Completed
    }
}

/// Executes routes with the caller's signers.
///
/// Holds no per-route mutable state, so one executor can run several
/// independent routes concurrently.
pub struct RouteExecutor {
    steps: StepExecutor,
    reporter: FailureReporter,
    events: EventBus,
}

impl RouteExecutor {
    pub fn new(api: Arc<dyn SwapApi>, signers: SignerSet, config: ExecutorConfig) -> Self {
        let events = EventBus::new();
        let sender = Arc::new(TransactionSender::new(signers, config.broadcast_timeout));
        let reporter = FailureReporter::new(api.clone(), config.report_timeout);
        let steps = StepExecutor::new(api, sender, config, events.clone());

        Self {
            steps,
            reporter,
            events,
        }
    }

    /// Receive progress events for every route this executor runs
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    pub async fn execute(&self, route: &Route) -> Result<RouteOutcome, RouteError> {
        self.execute_from(route, 1, &CancelSignal::never()).await
    }

    pub async fn execute_with_cancel(
        &self,
        route: &Route,
        cancel: &CancelSignal,
    ) -> Result<RouteOutcome, RouteError> {
        self.execute_from(route, 1, cancel).await
    }

    /// Run `route` starting at `start_step` (1-based).
    ///
    /// Used to resume a route that failed earlier; steps before `start_step`
    /// are not touched.
    pub async fn execute_from(
        &self,
        route: &Route,
        start_step: u32,
        cancel: &CancelSignal,
    ) -> Result<RouteOutcome, RouteError> {
        let started = Instant::now();
        let request_id = route.request_id.as_str();
        let mut state = ExecutionState::new(request_id, route.step_count());

        if let Err(source) = route.validate().and_then(|_| state.start(start_step)) {
            error!(request_id, start_step, error = %source, "Route rejected");
            return Err(RouteError {
                request_id: request_id.to_string(),
                step: start_step,
                source,
            });
        }

        info!(
            request_id,
            run_id = %state.run_id,
            steps = route.step_count(),
            start_step,
            "Route execution started"
        );
        self.events.publish(ExecutionEvent::RouteStarted {
            request_id: request_id.to_string(),
            step_count: route.step_count(),
            start_step,
        });

        let mut results = Vec::new();

        while let Some(step) = state.current_step() {
            let chain_family = match route.step(step) {
                Ok(s) => s.chain_family,
                Err(e) => return Err(self.fail(route, &mut state, step, e, started).await),
            };
            info!(request_id, step, chain_family = %chain_family, "Executing step");
            self.events.publish(ExecutionEvent::StepStarted {
                request_id: request_id.to_string(),
                step,
                chain_family,
            });

            let result = match self.steps.execute_step(route, step, cancel).await {
                Ok(result) => result,
                Err(e) => return Err(self.fail(route, &mut state, step, e, started).await),
            };

            self.events.publish(ExecutionEvent::StepSucceeded {
                request_id: request_id.to_string(),
                step,
                tx_id: result.tx_id.clone(),
                output_amount: result.output_amount.clone(),
            });
            results.push(result);

            if let Err(e) = state.advance() {
                return Err(self.fail(route, &mut state, step, e, started).await);
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        info!(request_id, elapsed_secs = elapsed, "Route completed");
        crate::metrics::record_route_duration(true, elapsed);
        self.events.publish(ExecutionEvent::RouteCompleted {
            request_id: request_id.to_string(),
        });

        Ok(RouteOutcome {
            state,
            steps: results,
        })
    }

    /// Move to `Failed`, report, and build the error returned to the caller.
    /// The report's own outcome never changes the returned error.
    async fn fail(
        &self,
        route: &Route,
        state: &mut ExecutionState,
        step: u32,
        source: ExecutorError,
        started: Instant,
    ) -> RouteError {
        let request_id = route.request_id.as_str();
        if let Err(e) = state.fail(&source) {
            error!(request_id, step, error = %e, "Unexpected state while failing route");
        }

        error!(request_id, step, error = %source, "Route failed");
        self.events.publish(ExecutionEvent::StepFailed {
            request_id: request_id.to_string(),
            step,
            error: source.to_string(),
        });

        if source.should_report() {
            self.reporter
                .report_step_failure(request_id, step, &source)
                .await;
        }

        crate::metrics::record_route_duration(false, started.elapsed().as_secs_f64());
        self.events.publish(ExecutionEvent::RouteFailed {
            request_id: request_id.to_string(),
            step,
            error: source.to_string(),
        });

        RouteError {
            request_id: request_id.to_string(),
            step,
            source,
        }
    }
}
