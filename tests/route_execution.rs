mod common;

use common::*;
use std::sync::Arc;
use tokio_test::assert_ok;

use xswap_executor::api::{ApprovalResponse, CreateTransactionResponse, StatusResponse};
use xswap_executor::model::{FailureEventType, TxStatus};
use xswap_executor::{ExecutionEvent, ExecutorError, RouteState};

#[tokio::test(start_paused = true)]
async fn one_step_route_without_approval_completes() {
    let log = Arc::new(CallLog::default());
    let api = ScriptedApi::new(log.clone())
        .create(evm_main_tx())
        .status(pending())
        .status(Err(ExecutorError::Api("connection reset by peer".into())))
        .status(Ok(StatusResponse {
            output_amount: Some("0.991".into()),
            ..StatusResponse::terminal(TxStatus::Success)
        }));
    let executor = executor(api, RecordingEvmSigner::new(log.clone()));

    let outcome = assert_ok!(executor.execute(&evm_route("req-single", 1)).await);

    assert_eq!(outcome.state.state(), &RouteState::Completed);
    assert_eq!(outcome.steps[0].tx_id, "0xsig1");
    assert_eq!(outcome.steps[0].output_amount.as_deref(), Some("0.991"));
    assert_eq!(
        log.calls(),
        vec![
            Call::Create { step: 1 },
            Call::Sign {
                to: Some(ROUTER.into()),
                approval: false
            },
            Call::CheckStatus {
                step: 1,
                tx_id: "0xsig1".into()
            },
            Call::CheckStatus {
                step: 1,
                tx_id: "0xsig1".into()
            },
            Call::CheckStatus {
                step: 1,
                tx_id: "0xsig1".into()
            },
        ]
    );
    assert!(log.reports().is_empty());
}

#[tokio::test(start_paused = true)]
async fn approval_is_confirmed_and_transaction_refetched_before_main_broadcast() {
    let log = Arc::new(CallLog::default());
    let api = ScriptedApi::new(log.clone())
        .create(evm_approval_tx())
        .approval(Ok(ApprovalResponse::default()))
        .approval(Err(ExecutorError::Api("timeout".into())))
        .approval(Ok(ApprovalResponse {
            is_approved: true,
            ..Default::default()
        }))
        .create(evm_main_tx())
        .status(success());
    let executor = executor(api, RecordingEvmSigner::new(log.clone()));

    let outcome = assert_ok!(executor.execute(&evm_route("req-approve", 1)).await);
    assert_eq!(outcome.steps[0].approval_tx_ids, vec!["0xsig1".to_string()]);
    assert_eq!(outcome.steps[0].tx_id, "0xsig2");

    let calls = log.calls();
    assert_eq!(
        calls,
        vec![
            Call::Create { step: 1 },
            Call::Sign {
                to: Some(USDC.into()),
                approval: true
            },
            Call::IsApproved {
                tx_id: "0xsig1".into()
            },
            Call::IsApproved {
                tx_id: "0xsig1".into()
            },
            Call::IsApproved {
                tx_id: "0xsig1".into()
            },
            Call::Create { step: 1 },
            Call::Sign {
                to: Some(ROUTER.into()),
                approval: false
            },
            Call::CheckStatus {
                step: 1,
                tx_id: "0xsig2".into()
            },
        ]
    );

    let refetch = calls
        .iter()
        .rposition(|c| matches!(c, Call::Create { step: 1 }))
        .unwrap();
    let main_sign = calls
        .iter()
        .position(|c| matches!(c, Call::Sign { approval: false, .. }))
        .unwrap();
    assert!(refetch < main_sign);
}

#[tokio::test(start_paused = true)]
async fn steps_are_created_in_order_exactly_once() {
    let log = Arc::new(CallLog::default());
    let api = ScriptedApi::new(log.clone())
        .create(evm_main_tx())
        .status(success())
        .create(evm_main_tx())
        .status(pending())
        .status(success())
        .create(evm_main_tx())
        .status(success());
    let executor = executor(api, RecordingEvmSigner::new(log.clone()));

    let outcome = assert_ok!(executor.execute(&evm_route("req-three", 3)).await);

    assert_eq!(log.created_steps(), vec![1, 2, 3]);
    assert_eq!(
        outcome.steps.iter().map(|s| s.step).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_second_step_ends_route_and_is_reported_once() {
    let log = Arc::new(CallLog::default());
    let api = ScriptedApi::new(log.clone())
        .create(evm_main_tx())
        .status(success())
        .create(evm_main_tx())
        .status(pending())
        .status(failed());
    let executor = executor(api, RecordingEvmSigner::new(log.clone()));
    let mut events = executor.subscribe();

    let err = executor
        .execute(&evm_route("req-two", 2))
        .await
        .unwrap_err();

    assert_eq!(err.request_id, "req-two");
    assert_eq!(err.step, 2);
    assert!(matches!(
        err.source,
        ExecutorError::StepExecutionFailed { step: 2, .. }
    ));
    assert_eq!(log.created_steps(), vec![1, 2]);

    let reports = log.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].request_id, "req-two");
    assert_eq!(reports[0].event_type, FailureEventType::TxFailed);
    assert_eq!(reports[0].data.get("step").map(String::as_str), Some("2"));

    let mut last = None;
    while let Ok(event) = events.try_recv() {
        last = Some(event);
    }
    assert!(matches!(
        last,
        Some(ExecutionEvent::RouteFailed { step: 2, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn failing_report_does_not_change_propagated_error() {
    let run = |reports_fail: bool| async move {
        let log = Arc::new(CallLog::default());
        let mut api = ScriptedApi::new(log.clone())
            .create(evm_main_tx())
            .status(success())
            .create(evm_main_tx())
            .status(failed());
        if reports_fail {
            api = api.failing_reports();
        }
        let executor = executor(api, RecordingEvmSigner::new(log.clone()));
        let err = executor
            .execute(&evm_route("req-report", 2))
            .await
            .unwrap_err();
        (err, log.reports().len())
    };

    let (delivered, delivered_reports) = run(false).await;
    let (dropped, dropped_reports) = run(true).await;

    assert_eq!(delivered, dropped);
    assert_eq!(delivered_reports, 1);
    assert_eq!(dropped_reports, 1);
}

#[tokio::test(start_paused = true)]
async fn follow_up_transaction_is_signed_before_step_succeeds() {
    let log = Arc::new(CallLog::default());
    let api = ScriptedApi::new(log.clone())
        .create(evm_main_tx())
        .status(Ok(StatusResponse {
            new_tx: Some(evm_main_tx()),
            ..StatusResponse::terminal(TxStatus::Success)
        }))
        .status(pending())
        .status(success());
    let executor = executor(api, RecordingEvmSigner::new(log.clone()));

    let outcome = assert_ok!(executor.execute(&evm_route("req-newtx", 1)).await);

    assert_eq!(log.signs().len(), 2);
    assert_eq!(log.created_steps(), vec![1]);
    assert_eq!(
        outcome.steps[0].tx_ids,
        vec!["0xsig1".to_string(), "0xsig2".to_string()]
    );
    assert_eq!(outcome.steps[0].tx_id, "0xsig2");
}

#[tokio::test(start_paused = true)]
async fn signer_rejection_is_reported_as_user_rejected() {
    let log = Arc::new(CallLog::default());
    let api = ScriptedApi::new(log.clone()).create(evm_main_tx());
    let executor = executor(api, RecordingEvmSigner::rejecting(log.clone()));

    let err = executor
        .execute(&evm_route("req-reject", 1))
        .await
        .unwrap_err();

    assert!(matches!(err.source, ExecutorError::SignerRejected(_)));
    assert_eq!(log.status_checks(), 0);
    let reports = log.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].event_type, FailureEventType::UserRejected);
}

#[tokio::test(start_paused = true)]
async fn refused_transaction_creation_is_fatal() {
    let log = Arc::new(CallLog::default());
    let api = ScriptedApi::new(log.clone())
        .create_response(CreateTransactionResponse::failed("Insufficient balance"));
    let executor = executor(api, RecordingEvmSigner::new(log.clone()));

    let err = executor
        .execute(&evm_route("req-refused", 1))
        .await
        .unwrap_err();

    assert_eq!(
        err.source,
        ExecutorError::TransactionCreation {
            step: 1,
            message: "Insufficient balance".into()
        }
    );
    assert!(log.signs().is_empty());
    assert_eq!(log.reports()[0].event_type, FailureEventType::ClientError);
}

#[tokio::test(start_paused = true)]
async fn resume_starts_at_requested_step() {
    let log = Arc::new(CallLog::default());
    let api = ScriptedApi::new(log.clone())
        .create(evm_main_tx())
        .status(success());
    let executor = executor(api, RecordingEvmSigner::new(log.clone()));

    let outcome = assert_ok!(
        executor
            .execute_from(
                &evm_route("req-resume", 2),
                2,
                &xswap_executor::CancelSignal::never()
            )
            .await
    );

    assert_eq!(log.created_steps(), vec![2]);
    assert_eq!(outcome.steps.len(), 1);
    assert!(outcome.is_completed());
}

#[tokio::test(start_paused = true)]
async fn malformed_descriptor_fails_without_signing() {
    let log = Arc::new(CallLog::default());
    let api = ScriptedApi::new(log.clone()).create(serde_json::json!({
        "type": "EVM",
        "blockChain": "ETH",
        "txData": "0x12aa3caf"
    }));
    let executor = executor(api, RecordingEvmSigner::new(log.clone()));

    let err = executor
        .execute(&evm_route("req-malformed", 1))
        .await
        .unwrap_err();

    assert!(matches!(err.source, ExecutorError::MalformedTransaction(_)));
    assert!(log.signs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn insufficient_allowance_after_mined_approval_fails_the_route() {
    let log = Arc::new(CallLog::default());
    let short = || {
        Ok(ApprovalResponse {
            is_approved: false,
            current_approved_amount: Some("10".into()),
            required_approved_amount: Some("2500".into()),
            tx_status: Some(TxStatus::Success),
        })
    };
    // Default grace is three extra polls; a fifth isApproved call would panic
    let api = ScriptedApi::new(log.clone())
        .create(evm_approval_tx())
        .approval(short())
        .approval(short())
        .approval(short())
        .approval(short());
    let executor = executor(api, RecordingEvmSigner::new(log.clone()));

    let err = executor
        .execute(&evm_route("req-short", 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err.source,
        ExecutorError::ApprovalFailed {
            current: Some(ref current),
            required: Some(ref required),
            ..
        } if current == "10" && required == "2500"
    ));
    assert_eq!(log.signs().len(), 1);
    assert_eq!(log.status_checks(), 0);
    let reports = log.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].event_type, FailureEventType::ApprovalFailed);
}
