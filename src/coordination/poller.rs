//! Status polling for submitted transactions

use super::CancelSignal;
use crate::api::{CheckStatusRequest, SwapApi};
use crate::error::{ExecutorError, ExecutorResult};
use crate::events::{EventBus, ExecutionEvent};
use crate::model::{ExplorerUrl, TxStatus};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// How often and for how long a polling loop runs.
///
/// With neither `max_attempts` nor `timeout` set the loop only ends on a
/// terminal answer or cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    /// Unbounded polling on a fixed interval
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            timeout: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Sleep, poll, repeat until `poll` yields a value or fails.
///
/// `poll` returns `Ok(None)` to keep going. Errors it returns end the loop, so
/// callers swallow transient failures themselves.
pub(crate) async fn poll_until<T, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancelSignal,
    operation: &str,
    poll: F,
) -> ExecutorResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ExecutorResult<Option<T>>>,
{
    let run = poll_loop(policy, cancel, operation, poll);

    match policy.timeout {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .map_err(|_| ExecutorError::Timeout {
                operation: operation.to_string(),
            })?,
        None => run.await,
    }
}

async fn poll_loop<T, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancelSignal,
    operation: &str,
    mut poll: F,
) -> ExecutorResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ExecutorResult<Option<T>>>,
{
    let cancelled = || ExecutorError::Cancelled {
        operation: operation.to_string(),
    };
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            _ = sleep(policy.interval) => {}
        }

        attempt += 1;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            outcome = poll(attempt) => outcome,
        };

        if let Some(value) = outcome? {
            return Ok(value);
        }

        if let Some(max) = policy.max_attempts {
            if attempt >= max {
                warn!(operation, attempts = attempt, "Polling gave up");
                return Err(ExecutorError::Timeout {
                    operation: format!("{} after {} attempts", operation, attempt),
                });
            }
        }
    }
}

/// Terminal outcome of one submitted transaction
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResult {
    pub tx_id: String,
    pub status: TxStatus,
    pub output_amount: Option<String>,
    pub extra_message: Option<String>,
    /// Follow-up descriptor that still has to be signed for this step
    pub new_tx: Option<serde_json::Value>,
    pub explorer_urls: Vec<ExplorerUrl>,
    pub attempts: u32,
}

/// Polls `checkStatus` for one transaction until it settles
pub struct StatusPoller {
    api: Arc<dyn SwapApi>,
    policy: PollPolicy,
    events: EventBus,
}

impl StatusPoller {
    pub fn new(api: Arc<dyn SwapApi>, policy: PollPolicy, events: EventBus) -> Self {
        Self {
            api,
            policy,
            events,
        }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Wait until the transaction is SUCCESS or FAILED.
    ///
    /// Pending answers and failed status checks are retried on the policy's
    /// interval. Returns exactly once, on the first terminal status.
    pub async fn await_terminal_status(
        &self,
        request_id: &str,
        step: u32,
        tx_id: &str,
        cancel: &CancelSignal,
    ) -> ExecutorResult<StatusResult> {
        let request = CheckStatusRequest {
            request_id: request_id.to_string(),
            step,
            tx_id: tx_id.to_string(),
        };
        let api = &self.api;
        let events = &self.events;
        let request = &request;

        debug!(request_id, step, tx_id, "Waiting for terminal status");

        let result = poll_until(&self.policy, cancel, "transaction status", move |attempt| async move {
            let response = match api.check_status(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        request_id = %request.request_id,
                        step = request.step,
                        attempt,
                        error = %e,
                        "Status check failed, retrying"
                    );
                    crate::metrics::record_status_poll("error");
                    return Ok(None);
                }
            };

            events.publish(ExecutionEvent::StatusPolled {
                request_id: request.request_id.clone(),
                step: request.step,
                tx_id: request.tx_id.clone(),
                status: response.status,
            });

            let Some(status) = response.status else {
                crate::metrics::record_status_poll("pending");
                return Ok(None);
            };
            crate::metrics::record_status_poll(status.as_str());

            Ok(Some(StatusResult {
                tx_id: request.tx_id.clone(),
                status,
                output_amount: response.output_amount,
                extra_message: response.extra_message,
                new_tx: response.new_tx.filter(|tx| !tx.is_null()),
                explorer_urls: response.explorer_url,
                attempts: attempt,
            }))
        })
        .await?;

        info!(
            request_id,
            step,
            tx_id,
            status = result.status.as_str(),
            attempts = result.attempts,
            "Transaction settled"
        );
        Ok(result)
    }
}
