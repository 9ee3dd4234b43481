//! Chain signer capabilities
//!
//! Each chain family is served by its own signer. Signers sign and broadcast a
//! descriptor and report back the submitted transaction hash; chain
//! confirmation is tracked separately by the status poller.

pub mod signer;

pub use signer::{ChainSigner, SignerError, SignerSet, SubmittedTx};
