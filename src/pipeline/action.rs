use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::progress::{ProgressEvent, ProgressSink};
use crate::api::{SigningInfo, TxHashItem, UnspentOutput};
use crate::brc20::Brc20Operation;
use crate::utils::constants::BRC20_TOKEN_ADDRESS_PREFIX;
use crate::wallet::SignedInscriptionSet;
use crate::WaasError;

/// BRC-20 action run by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Deploy,
    Mint,
    Transfer,
    /// Sends an inscription output to another address
    TransferNft,
}

impl ActionKind {
    /// `txType` of the broadcast items.
    pub fn tx_type(&self) -> &'static str {
        match self {
            Self::Deploy => "BRC20_DEPLOY",
            Self::Mint => "BRC20_MINT",
            Self::Transfer => "BRC20_TRANSFER",
            Self::TransferNft => "TRANSFER",
        }
    }

    /// `tokenAddress` of the broadcast items; the token does not exist before its deploy.
    pub fn token_address(&self, tick: &str) -> String {
        match self {
            Self::Deploy => String::new(),
            _ => format!("{BRC20_TOKEN_ADDRESS_PREFIX}{tick}"),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Deploy => "deploy",
            Self::Mint => "mint",
            Self::Transfer => "transfer",
            Self::TransferNft => "inscription transfer",
        };
        f.write_str(kind)
    }
}

/// Pipeline stage of an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionState {
    #[default]
    Idle,
    FetchingSignInfo,
    FetchingUtxo,
    BuildingOperation,
    ConstructingTx,
    Broadcasting,
    Succeeded,
    Failed,
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::Idle => "idle",
            Self::FetchingSignInfo => "fetching signing info",
            Self::FetchingUtxo => "fetching utxos",
            Self::BuildingOperation => "building operation",
            Self::ConstructingTx => "constructing transactions",
            Self::Broadcasting => "broadcasting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(state)
    }
}

/// Outcome of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationResult {
    /// Hash of every transaction of a batch, in submission order
    TxHashes(Vec<TxHashItem>),
    /// Order tracking a single transaction broadcast
    OrderId(String),
}

/// Everything an action produced so far.
///
/// `result` stays empty when the batch broadcast is disabled: the transactions were signed
/// but not broadcast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub state: ActionState,
    pub signing_info: Option<SigningInfo>,
    pub utxos: Vec<UnspentOutput>,
    pub nft_utxos: Vec<UnspentOutput>,
    pub operation: Option<Brc20Operation>,
    pub signed_set: Option<SignedInscriptionSet>,
    pub signed_tx: Option<String>,
    pub result: Option<OperationResult>,
    /// Stages whose output is canned data substituted after a service failure
    pub degraded: Vec<ActionState>,
    pub error: Option<String>,
}

impl ActionRecord {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            state: ActionState::Idle,
            signing_info: None,
            utxos: Vec::new(),
            nft_utxos: Vec::new(),
            operation: None,
            signed_set: None,
            signed_tx: None,
            result: None,
            degraded: Vec::new(),
            error: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub(super) fn enter(&mut self, state: ActionState, sink: &dyn ProgressSink) {
        info!("{}: {}", self.kind, state);
        self.state = state;
        sink.emit(ProgressEvent::StateChanged {
            kind: self.kind,
            state,
        });
    }

    pub(super) fn fail(mut self, error: WaasError, sink: &dyn ProgressSink) -> ActionFailure {
        let stage = self.state;
        error!("{} failed while {}: {}", self.kind, stage, error);

        self.error = Some(error.to_string());
        sink.emit(ProgressEvent::Failed {
            stage,
            error: error.to_string(),
        });
        self.enter(ActionState::Failed, sink);

        ActionFailure {
            stage,
            source: error,
            record: Box::new(self),
        }
    }
}

/// Error of an action, with the stage it failed in and the partial record.
#[derive(Error, Debug)]
#[error("{} failed while {stage}: {source}", .record.kind)]
pub struct ActionFailure {
    pub stage: ActionState,
    #[source]
    pub source: WaasError,
    pub record: Box<ActionRecord>,
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Collect(Mutex<Vec<ProgressEvent>>);

    impl ProgressSink for Collect {
        fn emit(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_should_map_kind_to_broadcast_fields() {
        assert_eq!(ActionKind::Deploy.tx_type(), "BRC20_DEPLOY");
        assert_eq!(ActionKind::Mint.tx_type(), "BRC20_MINT");
        assert_eq!(ActionKind::Transfer.tx_type(), "BRC20_TRANSFER");
        assert_eq!(ActionKind::TransferNft.tx_type(), "TRANSFER");

        assert_eq!(ActionKind::Deploy.token_address("okex"), "");
        assert_eq!(ActionKind::Mint.token_address("okex"), "btc-brc20-okex");
        assert_eq!(ActionKind::TransferNft.token_address("okex"), "btc-brc20-okex");
    }

    #[test]
    fn test_should_keep_failed_stage() {
        let sink = Collect::default();
        let mut record = ActionRecord::new(ActionKind::Mint);
        record.enter(ActionState::FetchingUtxo, &sink);

        let failure = record.fail(WaasError::RemoteService("boom".to_string()), &sink);

        assert_eq!(failure.stage, ActionState::FetchingUtxo);
        assert_eq!(failure.record.state, ActionState::Failed);
        assert_eq!(failure.record.error.as_deref(), Some("remote service error: boom"));
        assert_eq!(
            failure.to_string(),
            "mint failed while fetching utxos: remote service error: boom"
        );

        let events = sink.0.into_inner().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            events[1],
            ProgressEvent::Failed {
                stage: ActionState::FetchingUtxo,
                ..
            }
        ));
    }
}
