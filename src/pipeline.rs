//! BRC-20 action pipeline.
//!
//! Every action is a strictly sequential run of stages:
//! `Idle -> FetchingSignInfo -> FetchingUtxo -> BuildingOperation -> ConstructingTx ->
//! Broadcasting -> Succeeded | Failed`. An inscription transfer has no `BuildingOperation`
//! stage. The first failing stage aborts the action.

mod action;
mod fallback;
mod progress;
mod session;
mod stages;

pub use self::action::{ActionFailure, ActionKind, ActionRecord, ActionState, OperationResult};
pub use self::progress::{LogSink, ProgressEvent, ProgressSink};
pub use self::session::{Brc20Session, DeployArgs, MintArgs, NftTransferArgs, TransferArgs};
