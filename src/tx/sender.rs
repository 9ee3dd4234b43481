//! Routes descriptors to the signer of their chain family and broadcasts them

use super::TransactionDescriptor;
use crate::chain::{ChainSigner, SignerSet, SubmittedTx};
use crate::error::{ExecutorError, ExecutorResult};
use crate::model::ChainFamily;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Signs and broadcasts descriptors through the caller's signer set
pub struct TransactionSender {
    signers: SignerSet,
    /// Upper bound on a single sign-and-broadcast call
    broadcast_timeout: Option<Duration>,
}

impl TransactionSender {
    pub fn new(signers: SignerSet, broadcast_timeout: Option<Duration>) -> Self {
        Self {
            signers,
            broadcast_timeout,
        }
    }

    /// Sign and broadcast a descriptor, returning the submitted transaction.
    ///
    /// Never retried here: a rejected or failed broadcast is fatal for the step.
    pub async fn send(
        &self,
        descriptor: &TransactionDescriptor,
        from_address: &str,
    ) -> ExecutorResult<SubmittedTx> {
        let family = descriptor.chain_family();
        debug!(
            chain_family = %family,
            blockchain = descriptor.blockchain(),
            from = from_address,
            "Signing transaction"
        );

        let send = self.dispatch(descriptor, from_address);
        let result = match self.broadcast_timeout {
            Some(limit) => timeout(limit, send).await.map_err(|_| ExecutorError::Timeout {
                operation: format!("{} broadcast", family),
            })?,
            None => send.await,
        };

        let submitted = match result {
            Ok(submitted) => submitted,
            Err(e) => {
                warn!(chain_family = %family, error = %e, "Broadcast failed");
                return Err(e);
            }
        };

        if submitted.hash.trim().is_empty() {
            return Err(ExecutorError::Signer(format!(
                "{} signer returned an empty transaction hash",
                family
            )));
        }

        info!(
            chain_family = %family,
            tx_hash = %submitted.hash,
            "Transaction sent"
        );
        crate::metrics::record_tx_submitted(family);

        Ok(submitted)
    }

    async fn dispatch(
        &self,
        descriptor: &TransactionDescriptor,
        from_address: &str,
    ) -> ExecutorResult<SubmittedTx> {
        let result = match descriptor {
            TransactionDescriptor::Evm(tx) => {
                require(&self.signers.evm, ChainFamily::Evm)?
                    .sign_and_send(tx, from_address)
                    .await
            }
            TransactionDescriptor::Cosmos(tx) => {
                require(&self.signers.cosmos, ChainFamily::Cosmos)?
                    .sign_and_send(tx, from_address)
                    .await
            }
            TransactionDescriptor::Solana(tx) => {
                require(&self.signers.solana, ChainFamily::Solana)?
                    .sign_and_send(tx, from_address)
                    .await
            }
            TransactionDescriptor::Transfer(tx) => {
                require(&self.signers.transfer, ChainFamily::Transfer)?
                    .sign_and_send(tx, from_address)
                    .await
            }
            TransactionDescriptor::Starknet(tx) => {
                require(&self.signers.starknet, ChainFamily::Starknet)?
                    .sign_and_send(tx, from_address)
                    .await
            }
            TransactionDescriptor::Tron(tx) => {
                require(&self.signers.tron, ChainFamily::Tron)?
                    .sign_and_send(tx, from_address)
                    .await
            }
        };

        result.map_err(ExecutorError::from)
    }

    pub fn signers(&self) -> &SignerSet {
        &self.signers
    }
}

fn require<T>(
    signer: &Option<Arc<dyn ChainSigner<T>>>,
    family: ChainFamily,
) -> ExecutorResult<&Arc<dyn ChainSigner<T>>>
where
    T: Send + Sync + 'static,
{
    signer
        .as_ref()
        .ok_or_else(|| ExecutorError::Config(format!("no signer configured for {}", family)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::SignerError;
    use crate::tx::{EvmTransaction, TransferTransaction};

    use async_trait::async_trait;
    use std::sync::Mutex;

    struct EvmStub {
        calls: Mutex<Vec<(Option<String>, String)>>,
        result: Result<SubmittedTx, SignerError>,
        delay: Option<Duration>,
    }

    impl EvmStub {
        fn returning(result: Result<SubmittedTx, SignerError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                result,
                delay: None,
            }
        }
    }

    #[async_trait]
    impl ChainSigner<EvmTransaction> for EvmStub {
        async fn sign_and_send(
            &self,
            tx: &EvmTransaction,
            from_address: &str,
        ) -> Result<SubmittedTx, SignerError> {
            self.calls
                .lock()
                .unwrap()
                .push((tx.tx_to.clone(), from_address.to_string()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.result.clone()
        }
    }

    fn evm_descriptor() -> TransactionDescriptor {
        TransactionDescriptor::Evm(EvmTransaction {
            blockchain: "ETH".to_string(),
            tx_to: Some("0x1111111254eeb25477b68fb85ed929f73a960582".to_string()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_dispatches_to_family_signer() {
        let stub = Arc::new(EvmStub::returning(Ok(SubmittedTx::new("0xfeed"))));
        let sender = TransactionSender::new(SignerSet::new().with_evm(stub.clone()), None);

        let submitted = sender.send(&evm_descriptor(), "0xabc").await.unwrap();
        assert_eq!(submitted.hash, "0xfeed");

        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "0xabc");
    }

    #[tokio::test]
    async fn test_missing_signer_has_no_fallback() {
        let stub = Arc::new(EvmStub::returning(Ok(SubmittedTx::new("0xfeed"))));
        let sender = TransactionSender::new(SignerSet::new().with_evm(stub.clone()), None);

        let transfer = TransactionDescriptor::Transfer(TransferTransaction {
            blockchain: "BTC".to_string(),
            from_wallet_address: None,
            recipient_address: Some("bc1q".to_string()),
            amount: Some("1000".to_string()),
            decimals: Some(8),
            asset: None,
            memo: None,
            method: None,
            psbt: None,
        });

        let err = sender.send(&transfer, "bc1qsender").await.unwrap_err();
        assert!(matches!(err, ExecutorError::Config(_)));
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_surfaces_as_signer_rejected() {
        let stub = Arc::new(EvmStub::returning(Err(SignerError::Rejected(
            "User denied transaction signature".to_string(),
        ))));
        let sender = TransactionSender::new(SignerSet::new().with_evm(stub), None);

        let err = sender.send(&evm_descriptor(), "0xabc").await.unwrap_err();
        assert!(matches!(err, ExecutorError::SignerRejected(_)));
    }

    #[tokio::test]
    async fn test_empty_hash_is_an_error() {
        let stub = Arc::new(EvmStub::returning(Ok(SubmittedTx::new(""))));
        let sender = TransactionSender::new(SignerSet::new().with_evm(stub), None);

        let err = sender.send(&evm_descriptor(), "0xabc").await.unwrap_err();
        assert!(matches!(err, ExecutorError::Signer(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_timeout() {
        let stub = Arc::new(EvmStub {
            delay: Some(Duration::from_secs(600)),
            ..EvmStub::returning(Ok(SubmittedTx::new("0xlate")))
        });
        let sender = TransactionSender::new(
            SignerSet::new().with_evm(stub),
            Some(Duration::from_secs(30)),
        );

        let err = sender.send(&evm_descriptor(), "0xabc").await.unwrap_err();
        assert!(matches!(err, ExecutorError::Timeout { .. }));
    }
}
