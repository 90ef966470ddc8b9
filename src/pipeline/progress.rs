use tokio::sync::mpsc;

use super::action::{ActionKind, ActionState, OperationResult};
use crate::api::{SigningInfo, UnspentOutput};
use crate::brc20::Brc20Operation;
use crate::wallet::SignedInscriptionSet;

/// Progress of an action, emitted as soon as a stage starts or produces its output.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    StateChanged {
        kind: ActionKind,
        state: ActionState,
    },
    SigningInfo(SigningInfo),
    /// Funding outputs; `degraded` when canned outputs replaced a failed fetch
    Utxos {
        utxos: Vec<UnspentOutput>,
        degraded: bool,
    },
    NftUtxos(Vec<UnspentOutput>),
    Operation(Brc20Operation),
    SignedInscription(SignedInscriptionSet),
    /// Hex-encoded signed transfer transaction
    SignedTransfer(String),
    /// `result` is `None` when nothing was broadcast
    Broadcast {
        result: Option<OperationResult>,
        degraded: bool,
    },
    Failed {
        stage: ActionState,
        error: String,
    },
}

/// Receives the progress of the actions of a session.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards every event.
impl ProgressSink for () {
    fn emit(&self, _event: ProgressEvent) {}
}

impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        if self.send(event).is_err() {
            debug!("progress receiver dropped");
        }
    }
}

/// Drops events while the channel is full.
impl ProgressSink for mpsc::Sender<ProgressEvent> {
    fn emit(&self, event: ProgressEvent) {
        if let Err(err) = self.try_send(event) {
            warn!("progress event dropped: {err}");
        }
    }
}

/// Writes every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::StateChanged { kind, state } => info!("[{kind}] {state}"),
            ProgressEvent::Utxos {
                utxos,
                degraded: true,
            } => warn!("using {} canned utxos", utxos.len()),
            ProgressEvent::Broadcast {
                degraded: true,
                result,
            } => warn!("using canned broadcast result {result:?}"),
            ProgressEvent::Failed { stage, error } => error!("failed while {stage}: {error}"),
            event => debug!("{event:?}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_should_forward_events_to_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let event = ProgressEvent::StateChanged {
            kind: ActionKind::Deploy,
            state: ActionState::FetchingSignInfo,
        };

        tx.emit(event.clone());
        assert_eq!(rx.recv().await, Some(event));
    }

    #[tokio::test]
    async fn test_should_not_block_on_full_channel() {
        let (tx, mut rx) = mpsc::channel(1);
        let event = ProgressEvent::NftUtxos(vec![]);

        tx.emit(event.clone());
        tx.emit(ProgressEvent::SignedTransfer("00".to_string()));

        assert_eq!(rx.recv().await, Some(event));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_should_ignore_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.emit(ProgressEvent::NftUtxos(vec![]));
        LogSink.emit(ProgressEvent::NftUtxos(vec![]));
        ().emit(ProgressEvent::NftUtxos(vec![]));
    }
}
