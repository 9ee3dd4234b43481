//! Scripted collaborators that record every call in one shared, ordered log

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use xswap_executor::api::{
    ApprovalResponse, CheckStatusRequest, CreateTransactionRequest, CreateTransactionResponse,
    FailureReport, StatusResponse, SwapApi,
};
use xswap_executor::chain::{ChainSigner, SignerError, SignerSet, SubmittedTx};
use xswap_executor::model::{Asset, ChainFamily, Route, Step, TxStatus};
use xswap_executor::tx::EvmTransaction;
use xswap_executor::{ExecutorConfig, ExecutorError, ExecutorResult, PollPolicy, RouteExecutor};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { step: u32 },
    IsApproved { tx_id: String },
    CheckStatus { step: u32, tx_id: String },
    Report { report: FailureReport },
    Sign { to: Option<String>, approval: bool },
}

#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<Call>>,
}

impl CallLog {
    pub fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created_steps(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create { step } => Some(step),
                _ => None,
            })
            .collect()
    }

    pub fn signs(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Sign { .. }))
            .collect()
    }

    pub fn reports(&self) -> Vec<FailureReport> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Report { report } => Some(report),
                _ => None,
            })
            .collect()
    }

    pub fn status_checks(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::CheckStatus { .. }))
            .count()
    }
}

/// Routing service double answering from per-endpoint queues
pub struct ScriptedApi {
    log: Arc<CallLog>,
    creates: Mutex<VecDeque<ExecutorResult<CreateTransactionResponse>>>,
    approvals: Mutex<VecDeque<ExecutorResult<ApprovalResponse>>>,
    statuses: Mutex<VecDeque<ExecutorResult<StatusResponse>>>,
    report_result: ExecutorResult<()>,
}

impl ScriptedApi {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            creates: Mutex::new(VecDeque::new()),
            approvals: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            report_result: Ok(()),
        }
    }

    pub fn create(self, transaction: Value) -> Self {
        self.creates
            .lock()
            .unwrap()
            .push_back(Ok(CreateTransactionResponse::with_transaction(transaction)));
        self
    }

    pub fn create_response(self, response: CreateTransactionResponse) -> Self {
        self.creates.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn approval(self, response: ExecutorResult<ApprovalResponse>) -> Self {
        self.approvals.lock().unwrap().push_back(response);
        self
    }

    pub fn status(self, response: ExecutorResult<StatusResponse>) -> Self {
        self.statuses.lock().unwrap().push_back(response);
        self
    }

    pub fn failing_reports(mut self) -> Self {
        self.report_result = Err(ExecutorError::Api("HTTP 503 Service Unavailable".into()));
        self
    }
}

#[async_trait]
impl SwapApi for ScriptedApi {
    async fn create_step_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> ExecutorResult<CreateTransactionResponse> {
        self.log.push(Call::Create { step: request.step });
        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected createStepTransaction for step {}", request.step))
    }

    async fn is_approved(&self, _request_id: &str, tx_id: &str) -> ExecutorResult<ApprovalResponse> {
        self.log.push(Call::IsApproved {
            tx_id: tx_id.to_string(),
        });
        self.approvals
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected isApproved for {}", tx_id))
    }

    async fn check_status(&self, request: &CheckStatusRequest) -> ExecutorResult<StatusResponse> {
        self.log.push(Call::CheckStatus {
            step: request.step,
            tx_id: request.tx_id.clone(),
        });
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected checkStatus for {}", request.tx_id))
    }

    async fn report_failure(&self, report: &FailureReport) -> ExecutorResult<()> {
        self.log.push(Call::Report {
            report: report.clone(),
        });
        self.report_result.clone()
    }
}

/// EVM signer returning `0xsig1`, `0xsig2`, ... or a scripted rejection
pub struct RecordingEvmSigner {
    log: Arc<CallLog>,
    count: Mutex<u32>,
    reject: bool,
}

impl RecordingEvmSigner {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            count: Mutex::new(0),
            reject: false,
        }
    }

    pub fn rejecting(log: Arc<CallLog>) -> Self {
        Self {
            reject: true,
            ..Self::new(log)
        }
    }
}

#[async_trait]
impl ChainSigner<EvmTransaction> for RecordingEvmSigner {
    async fn sign_and_send(
        &self,
        tx: &EvmTransaction,
        _from_address: &str,
    ) -> Result<SubmittedTx, SignerError> {
        self.log.push(Call::Sign {
            to: tx.tx_to.clone(),
            approval: tx.is_approval_tx,
        });
        if self.reject {
            return Err(SignerError::Rejected("User denied transaction signature".into()));
        }
        let mut count = self.count.lock().unwrap();
        *count += 1;
        Ok(SubmittedTx::new(format!("0xsig{}", count)))
    }
}

pub const ROUTER: &str = "0x1111111254eeb25477b68fb85ed929f73a960582";
pub const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

pub fn evm_main_tx() -> Value {
    json!({
        "type": "EVM",
        "blockChain": "ETH",
        "isApprovalTx": false,
        "txTo": ROUTER,
        "txData": "0x12aa3caf",
        "value": "0x0",
        "gasLimit": "0x493e0"
    })
}

pub fn evm_approval_tx() -> Value {
    json!({
        "type": "EVM",
        "blockChain": "ETH",
        "isApprovalTx": true,
        "txTo": USDC,
        "txData": "0x095ea7b3",
        "gasLimit": "0xea60"
    })
}

pub fn evm_step() -> Step {
    Step {
        from_asset: Asset::new("ETH", Some(USDC), "USDC"),
        to_asset: Asset::native("ETH", "ETH"),
        from_amount: "2500".into(),
        to_amount: "0.99".into(),
        swapper_id: "1inch".into(),
        chain_family: ChainFamily::Evm,
    }
}

pub fn evm_route(request_id: &str, steps: usize) -> Route {
    Route::new(request_id, (0..steps).map(|_| evm_step()).collect())
        .with_wallet("ETH", "0x5a52e96bacdabb82fd05763e25335261b270efcb")
}

pub fn success() -> ExecutorResult<StatusResponse> {
    Ok(StatusResponse::terminal(TxStatus::Success))
}

pub fn failed() -> ExecutorResult<StatusResponse> {
    Ok(StatusResponse::terminal(TxStatus::Failed))
}

pub fn pending() -> ExecutorResult<StatusResponse> {
    Ok(StatusResponse::pending())
}

pub fn test_config() -> ExecutorConfig {
    ExecutorConfig {
        status_policy: PollPolicy::every(Duration::from_secs(5)),
        approval_policy: PollPolicy::every(Duration::from_secs(3)),
        ..ExecutorConfig::default()
    }
}

pub fn executor(api: ScriptedApi, signer: RecordingEvmSigner) -> RouteExecutor {
    RouteExecutor::new(
        Arc::new(api),
        SignerSet::new().with_evm(Arc::new(signer)),
        test_config(),
    )
}
