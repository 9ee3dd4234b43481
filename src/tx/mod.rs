//! Transaction descriptor model and signer dispatch
//!
//! One module per chain family describes that family's unsigned transaction
//! shape and its validation rules. `TransactionSender` routes a descriptor to
//! the matching signer.

mod cosmos;
mod descriptor;
mod evm;
mod sender;
mod solana;
mod starknet;
mod transfer;
mod tron;

pub use cosmos::{CosmosCoin, CosmosFee, CosmosMessage, CosmosRawTransfer, CosmosSignType, CosmosTransaction};
pub use descriptor::TransactionDescriptor;
pub use evm::EvmTransaction;
pub use sender::TransactionSender;
pub use solana::{SolanaAccountMeta, SolanaInstruction, SolanaSignature, SolanaTransaction, SolanaTxKind};
pub use starknet::{StarknetCall, StarknetTransaction};
pub use transfer::TransferTransaction;
pub use tron::TronTransaction;
