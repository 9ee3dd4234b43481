//! Route, asset and status types shared by every execution stage

mod asset;
mod route;
mod status;

pub use asset::Asset;
pub use route::{ChainFamily, Route, Step, UserSettings, Validations};
pub use status::{ExplorerUrl, FailureEventType, TxStatus};
