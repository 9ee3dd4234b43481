//! Per chain family signer trait and the capability set handed to executors

use crate::error::ExecutorError;
use crate::model::ChainFamily;
use crate::tx::{
    CosmosTransaction, EvmTransaction, SolanaTransaction, StarknetTransaction, TransferTransaction,
    TronTransaction,
};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Handle for a transaction the signer has broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTx {
    pub hash: String,
}

impl SubmittedTx {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignerError {
    /// The user or wallet provider declined to sign
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("provider error: {0}")]
    Provider(String),
}

impl From<SignerError> for ExecutorError {
    fn from(e: SignerError) -> Self {
        match e {
            SignerError::Rejected(msg) => ExecutorError::SignerRejected(msg),
            SignerError::Provider(msg) => ExecutorError::Signer(msg),
        }
    }
}

/// Signs a descriptor of type `T` on behalf of `from_address` and broadcasts it
#[async_trait]
pub trait ChainSigner<T>: Send + Sync
where
    T: Send + Sync,
{
    async fn sign_and_send(&self, tx: &T, from_address: &str) -> Result<SubmittedTx, SignerError>;
}

/// Signer capabilities for every chain family the caller has wallets for.
///
/// Passed explicitly into the executors; nothing is looked up globally.
#[derive(Clone, Default)]
pub struct SignerSet {
    pub(crate) evm: Option<Arc<dyn ChainSigner<EvmTransaction>>>,
    pub(crate) cosmos: Option<Arc<dyn ChainSigner<CosmosTransaction>>>,
    pub(crate) solana: Option<Arc<dyn ChainSigner<SolanaTransaction>>>,
    pub(crate) transfer: Option<Arc<dyn ChainSigner<TransferTransaction>>>,
    pub(crate) starknet: Option<Arc<dyn ChainSigner<StarknetTransaction>>>,
    pub(crate) tron: Option<Arc<dyn ChainSigner<TronTransaction>>>,
}

impl SignerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evm(mut self, signer: Arc<dyn ChainSigner<EvmTransaction>>) -> Self {
        self.evm = Some(signer);
        self
    }

    pub fn with_cosmos(mut self, signer: Arc<dyn ChainSigner<CosmosTransaction>>) -> Self {
        self.cosmos = Some(signer);
        self
    }

    pub fn with_solana(mut self, signer: Arc<dyn ChainSigner<SolanaTransaction>>) -> Self {
        self.solana = Some(signer);
        self
    }

    pub fn with_transfer(mut self, signer: Arc<dyn ChainSigner<TransferTransaction>>) -> Self {
        self.transfer = Some(signer);
        self
    }

    pub fn with_starknet(mut self, signer: Arc<dyn ChainSigner<StarknetTransaction>>) -> Self {
        self.starknet = Some(signer);
        self
    }

    pub fn with_tron(mut self, signer: Arc<dyn ChainSigner<TronTransaction>>) -> Self {
        self.tron = Some(signer);
        self
    }

    pub fn supports(&self, family: ChainFamily) -> bool {
        match family {
            ChainFamily::Evm => self.evm.is_some(),
            ChainFamily::Cosmos => self.cosmos.is_some(),
            ChainFamily::Solana => self.solana.is_some(),
            ChainFamily::Transfer => self.transfer.is_some(),
            ChainFamily::Starknet => self.starknet.is_some(),
            ChainFamily::Tron => self.tron.is_some(),
        }
    }

    pub fn families(&self) -> Vec<ChainFamily> {
        ChainFamily::ALL
            .into_iter()
            .filter(|f| self.supports(*f))
            .collect()
    }
}

impl fmt::Debug for SignerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerSet")
            .field("families", &self.families())
            .finish()
    }
}
