//! Executes a single route step end to end

use super::approval::{ApprovalFlow, ApprovalOutcome};
use super::poller::StatusPoller;
use super::CancelSignal;
use crate::api::{CreateTransactionRequest, SwapApi};
use crate::config::ExecutorConfig;
use crate::error::{ExecutorError, ExecutorResult};
use crate::events::{EventBus, ExecutionEvent};
use crate::model::{ExplorerUrl, Route, TxStatus};
use crate::tx::{TransactionDescriptor, TransactionSender};

use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a settled step produced
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub step: u32,
    /// Transaction whose SUCCESS completed the step
    pub tx_id: String,
    pub status: TxStatus,
    /// Every main transaction broadcast for the step, in order
    pub tx_ids: Vec<String>,
    pub approval_tx_ids: Vec<String>,
    pub output_amount: Option<String>,
    pub explorer_urls: Vec<ExplorerUrl>,
}

pub struct StepExecutor {
    api: Arc<dyn SwapApi>,
    sender: Arc<TransactionSender>,
    approval: ApprovalFlow,
    poller: StatusPoller,
    config: ExecutorConfig,
    events: EventBus,
}

impl StepExecutor {
    pub fn new(
        api: Arc<dyn SwapApi>,
        sender: Arc<TransactionSender>,
        config: ExecutorConfig,
        events: EventBus,
    ) -> Self {
        let approval = ApprovalFlow::new(
            api.clone(),
            sender.clone(),
            config.approval_policy.clone(),
            events.clone(),
        )
        .with_grace_polls(config.approval_grace_polls);
        let poller = StatusPoller::new(api.clone(), config.status_policy.clone(), events.clone());

        Self {
            api,
            sender,
            approval,
            poller,
            config,
            events,
        }
    }

    /// Build, approve, sign and settle step `step` (1-based) of `route`.
    ///
    /// A FAILED status ends the step with `StepExecutionFailed`. A SUCCESS
    /// that carries a follow-up transaction signs it and keeps polling.
    pub async fn execute_step(
        &self,
        route: &Route,
        step: u32,
        cancel: &CancelSignal,
    ) -> ExecutorResult<StepResult> {
        let family = route.step(step)?.chain_family;
        crate::metrics::record_step_started(family);

        match self.run(route, step, cancel).await {
            Ok(result) => {
                crate::metrics::record_step_succeeded(family);
                Ok(result)
            }
            Err(e) => {
                crate::metrics::record_step_failed(family, &e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        route: &Route,
        step: u32,
        cancel: &CancelSignal,
    ) -> ExecutorResult<StepResult> {
        let request_id = route.request_id.as_str();
        // The source chain wallet is required even if every descriptor names another chain
        route.wallet_for(step)?;
        let mut approval_tx_ids = Vec::new();

        let fetched = self.fetch_descriptor(route, step).await?;
        let mut descriptor = self
            .resolve_approvals(route, step, fetched, cancel, &mut approval_tx_ids)
            .await?;

        let mut tx_ids = Vec::new();
        let mut explorer_urls = Vec::new();

        loop {
            let from_address = route.sender_for(step, descriptor.blockchain())?;
            let submitted = self.sender.send(&descriptor, from_address).await?;
            let tx_id = submitted.hash;
            tx_ids.push(tx_id.clone());

            self.events.publish(ExecutionEvent::TransactionSubmitted {
                request_id: request_id.to_string(),
                step,
                tx_id: tx_id.clone(),
                chain_family: descriptor.chain_family(),
            });

            let result = self
                .poller
                .await_terminal_status(request_id, step, &tx_id, cancel)
                .await?;
            explorer_urls.extend(result.explorer_urls);

            match result.status {
                TxStatus::Failed => {
                    let reason = result
                        .extra_message
                        .unwrap_or_else(|| format!("transaction {} failed", tx_id));
                    warn!(request_id, step, tx_id = %tx_id, reason = %reason, "Step failed on chain");
                    return Err(ExecutorError::StepExecutionFailed { step, reason });
                }
                TxStatus::Success => {
                    let Some(raw) = result.new_tx else {
                        info!(request_id, step, tx_id = %tx_id, "Step succeeded");
                        return Ok(StepResult {
                            step,
                            tx_id,
                            status: TxStatus::Success,
                            tx_ids,
                            approval_tx_ids,
                            output_amount: result.output_amount,
                            explorer_urls,
                        });
                    };

                    info!(request_id, step, tx_id = %tx_id, "Step needs a follow-up transaction");
                    let next = TransactionDescriptor::parse(raw)?;
                    descriptor = self
                        .resolve_approvals(route, step, next, cancel, &mut approval_tx_ids)
                        .await?;
                }
            }
        }
    }

    /// Approve until the step's descriptor no longer asks for an allowance,
    /// re-fetching the main transaction after each confirmed approval
    async fn resolve_approvals(
        &self,
        route: &Route,
        step: u32,
        mut descriptor: TransactionDescriptor,
        cancel: &CancelSignal,
        approval_tx_ids: &mut Vec<String>,
    ) -> ExecutorResult<TransactionDescriptor> {
        let mut rounds = 0;

        while descriptor.requires_approval() {
            if rounds >= self.config.max_approval_rounds {
                return Err(ExecutorError::ApprovalFailed {
                    message: format!(
                        "step {} still requires approval after {} rounds",
                        step, rounds
                    ),
                    current: None,
                    required: None,
                });
            }
            rounds += 1;

            match self
                .approval
                .ensure_approved(route, step, &descriptor, cancel)
                .await?
            {
                ApprovalOutcome::Approved { tx_id } => approval_tx_ids.push(tx_id),
                ApprovalOutcome::NotNeeded => {}
            }

            descriptor = self.fetch_descriptor(route, step).await?;
        }

        Ok(descriptor)
    }

    async fn fetch_descriptor(
        &self,
        route: &Route,
        step: u32,
    ) -> ExecutorResult<TransactionDescriptor> {
        let request = CreateTransactionRequest {
            request_id: route.request_id.clone(),
            step,
            user_settings: self.config.user_settings.clone(),
            validations: self.config.validations.clone(),
        };

        let response = self.api.create_step_transaction(&request).await?;

        if !response.ok {
            return Err(ExecutorError::TransactionCreation {
                step,
                message: response
                    .error
                    .unwrap_or_else(|| "routing service refused to build the transaction".into()),
            });
        }

        let raw = match response.transaction {
            Some(raw) if !raw.is_null() => raw,
            _ => {
                return Err(ExecutorError::TransactionCreation {
                    step,
                    message: "no transaction returned".to_string(),
                })
            }
        };

        let descriptor = TransactionDescriptor::parse(raw)?;

        let expected = route.step(step)?.chain_family;
        if descriptor.chain_family() != expected {
            warn!(
                request_id = %route.request_id,
                step,
                expected = %expected,
                actual = %descriptor.chain_family(),
                "Descriptor family differs from route step"
            );
        }

        debug!(
            request_id = %route.request_id,
            step,
            chain_family = %descriptor.chain_family(),
            requires_approval = descriptor.requires_approval(),
            "Fetched step transaction"
        );
        Ok(descriptor)
    }
}
