//! Token allowance approval before a step's main transaction

use super::poller::{poll_until, PollPolicy};
use super::CancelSignal;
use crate::api::SwapApi;
use crate::error::{ExecutorError, ExecutorResult};
use crate::events::{EventBus, ExecutionEvent};
use crate::model::{Route, TxStatus};
use crate::tx::{TransactionDescriptor, TransactionSender};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Polls tolerated after the approval is mined while the allowance is still
/// short, to cover indexing lag on the routing service
pub const DEFAULT_APPROVAL_GRACE_POLLS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The descriptor carries no allowance requirement
    NotNeeded,
    /// The approval transaction was broadcast and confirmed
    Approved { tx_id: String },
}

pub struct ApprovalFlow {
    api: Arc<dyn SwapApi>,
    sender: Arc<TransactionSender>,
    policy: PollPolicy,
    grace_polls: u32,
    events: EventBus,
}

impl ApprovalFlow {
    pub fn new(
        api: Arc<dyn SwapApi>,
        sender: Arc<TransactionSender>,
        policy: PollPolicy,
        events: EventBus,
    ) -> Self {
        Self {
            api,
            sender,
            policy,
            grace_polls: DEFAULT_APPROVAL_GRACE_POLLS,
            events,
        }
    }

    pub fn with_grace_polls(mut self, grace_polls: u32) -> Self {
        self.grace_polls = grace_polls;
        self
    }

    /// Sign the approval projection of `descriptor` and wait until the routing
    /// service sees the allowance.
    ///
    /// Returns `NotNeeded` without touching the network when the descriptor
    /// has no approval requirement. The wait ends on `isApproved = true`, on a
    /// FAILED approval transaction, or once a mined approval has stayed
    /// insufficient for more than the grace polls. Failed checks are retried.
    pub async fn ensure_approved(
        &self,
        route: &Route,
        step: u32,
        descriptor: &TransactionDescriptor,
        cancel: &CancelSignal,
    ) -> ExecutorResult<ApprovalOutcome> {
        let Some(approval) = descriptor.approval() else {
            return Ok(ApprovalOutcome::NotNeeded);
        };

        let request_id = route.request_id.as_str();
        let from_address = route.sender_for(step, approval.blockchain())?;

        debug!(
            request_id,
            step,
            chain_family = %approval.chain_family(),
            "Approval required"
        );

        let submitted = match self.sender.send(&approval, from_address).await {
            Ok(submitted) => submitted,
            Err(e) => {
                crate::metrics::record_approval("send_failed");
                return Err(e);
            }
        };
        let tx_id = submitted.hash;

        self.events.publish(ExecutionEvent::ApprovalSubmitted {
            request_id: request_id.to_string(),
            step,
            tx_id: tx_id.clone(),
        });

        self.await_confirmation(request_id, &tx_id, cancel).await?;

        info!(request_id, step, tx_id = %tx_id, "Approval confirmed");
        self.events.publish(ExecutionEvent::ApprovalConfirmed {
            request_id: request_id.to_string(),
            step,
            tx_id: tx_id.clone(),
        });

        Ok(ApprovalOutcome::Approved { tx_id })
    }

    /// Poll `isApproved` for an already broadcast approval transaction
    pub async fn await_confirmation(
        &self,
        request_id: &str,
        tx_id: &str,
        cancel: &CancelSignal,
    ) -> ExecutorResult<()> {
        let api = &self.api;
        let grace_polls = self.grace_polls;
        let short_after_mined = AtomicU32::new(0);
        let short_after_mined = &short_after_mined;
        let confirmed = poll_until(&self.policy, cancel, "approval", move |attempt| async move {
            let response = match api.is_approved(request_id, tx_id).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(request_id, tx_id, attempt, error = %e, "Approval check failed, retrying");
                    return Ok(None);
                }
            };

            if response.is_approved {
                return Ok(Some(()));
            }

            match response.tx_status {
                Some(TxStatus::Failed) => Err(ExecutorError::ApprovalFailed {
                    message: format!("approval transaction {} failed", tx_id),
                    current: response.current_approved_amount,
                    required: response.required_approved_amount,
                }),
                Some(TxStatus::Success) => {
                    let seen = short_after_mined.fetch_add(1, Ordering::Relaxed) + 1;
                    if seen > grace_polls {
                        return Err(ExecutorError::ApprovalFailed {
                            message: format!(
                                "approval transaction {} confirmed but allowance is insufficient",
                                tx_id
                            ),
                            current: response.current_approved_amount,
                            required: response.required_approved_amount,
                        });
                    }
                    debug!(
                        request_id,
                        tx_id,
                        seen,
                        current = ?response.current_approved_amount,
                        required = ?response.required_approved_amount,
                        "Approval mined but allowance not visible yet"
                    );
                    Ok(None)
                }
                None => Ok(None),
            }
        })
        .await;

        if let Err(e) = confirmed {
            let outcome = match e {
                ExecutorError::ApprovalFailed { .. } => "failed",
                ExecutorError::Cancelled { .. } => "cancelled",
                _ => "timeout",
            };
            crate::metrics::record_approval(outcome);
            return Err(e);
        }

        crate::metrics::record_approval("approved");
        Ok(())
    }
}
