//! Best-effort failure reporting to the routing service

use crate::api::{FailureReport, SwapApi};
use crate::error::ExecutorError;
use crate::model::FailureEventType;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Tells the routing service that a route failed on the client side.
///
/// Reporting never fails from the caller's point of view: delivery errors and
/// timeouts are logged and dropped.
pub struct FailureReporter {
    api: Arc<dyn SwapApi>,
    timeout: Option<Duration>,
}

impl FailureReporter {
    pub fn new(api: Arc<dyn SwapApi>, timeout: Option<Duration>) -> Self {
        Self { api, timeout }
    }

    pub async fn report_failure(
        &self,
        request_id: &str,
        event_type: FailureEventType,
        message: &str,
        data: BTreeMap<String, String>,
    ) {
        let report = FailureReport {
            request_id: request_id.to_string(),
            event_type,
            reason: message.to_string(),
            data,
        };

        let send = self.api.report_failure(&report);
        let delivered = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, send).await {
                Ok(result) => result,
                Err(_) => Err(ExecutorError::Timeout {
                    operation: "failure report".to_string(),
                }),
            },
            None => send.await,
        };

        match delivered {
            Ok(()) => {
                debug!(request_id, event_type = event_type.as_str(), "Failure reported");
                crate::metrics::record_failure_report(true);
            }
            Err(e) => {
                warn!(
                    request_id,
                    event_type = event_type.as_str(),
                    error = %e,
                    "Failed to report failure, dropping"
                );
                crate::metrics::record_failure_report(false);
            }
        }
    }

    /// Report an error that ended a route at `step`
    pub async fn report_step_failure(&self, request_id: &str, step: u32, error: &ExecutorError) {
        let mut data = BTreeMap::new();
        data.insert("step".to_string(), step.to_string());
        data.insert("errorKind".to_string(), error.kind().to_string());

        self.report_failure(request_id, error.failure_event(), &error.to_string(), data)
            .await;
    }
}
