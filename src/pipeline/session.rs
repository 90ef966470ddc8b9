use std::sync::atomic::{AtomicBool, Ordering};

use super::action::{ActionFailure, ActionKind, ActionRecord, ActionState, OperationResult};
use super::fallback::{mock_tx_hashes, mock_utxos};
use super::progress::{ProgressEvent, ProgressSink};
use crate::api::{TransactionDetail, UtxoKind, WaasApi};
use crate::brc20::Brc20Operation;
use crate::config::SessionConfig;
use crate::utils::constants::BTC_CHAIN_ID;
use crate::wallet::{ChainWallet, WalletRegistry};
use crate::{SigningError, WaasError, WaasResult};

/// Transactions paid by an inscription: one commit and one reveal.
const INSCRIPTION_TX_COUNT: u64 = 2;
/// Transactions paid by an inscription transfer, quoted as for an inscription.
const TRANSFER_TX_COUNT: u64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployArgs {
    pub from: String,
    pub tick: String,
    pub max: u64,
    pub lim: u64,
}

impl DeployArgs {
    pub fn new(from: impl ToString, tick: impl ToString, max: u64, lim: u64) -> Self {
        Self {
            from: from.to_string(),
            tick: tick.to_string(),
            max,
            lim,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintArgs {
    pub from: String,
    pub tick: String,
    pub amt: u64,
}

impl MintArgs {
    pub fn new(from: impl ToString, tick: impl ToString, amt: u64) -> Self {
        Self {
            from: from.to_string(),
            tick: tick.to_string(),
            amt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferArgs {
    pub from: String,
    pub tick: String,
    pub amt: u64,
}

impl TransferArgs {
    pub fn new(from: impl ToString, tick: impl ToString, amt: u64) -> Self {
        Self {
            from: from.to_string(),
            tick: tick.to_string(),
            amt,
        }
    }
}

/// Sends the first inscription output of `tick` held by `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftTransferArgs {
    pub from: String,
    pub to: String,
    pub tick: String,
}

impl NftTransferArgs {
    pub fn new(from: impl ToString, to: impl ToString, tick: impl ToString) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            tick: tick.to_string(),
        }
    }
}

/// Runs BRC-20 actions against the wallet service, signing with the registered wallets.
///
/// A session runs one action at a time: an action started while another one is in flight
/// fails with [`WaasError::ActionInProgress`].
pub struct Brc20Session<A>
where
    A: WaasApi,
{
    pub(super) api: A,
    pub(super) wallets: WalletRegistry,
    pub(super) config: SessionConfig,
    busy: AtomicBool,
}

/// Releases the session when the action completes, fails or is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A> Brc20Session<A>
where
    A: WaasApi,
{
    pub fn new(api: A, wallets: WalletRegistry, config: SessionConfig) -> Self {
        Self {
            api,
            wallets,
            config,
            busy: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Inscribes a deploy operation of `args.tick`.
    pub async fn deploy(
        &self,
        args: DeployArgs,
        sink: &dyn ProgressSink,
    ) -> Result<ActionRecord, ActionFailure> {
        let operation = Brc20Operation::deploy(&args.tick, args.max, args.lim);
        self.run_inscription(ActionKind::Deploy, &args.from, operation, sink)
            .await
    }

    /// Inscribes a mint operation of `args.amt` tokens.
    pub async fn mint(
        &self,
        args: MintArgs,
        sink: &dyn ProgressSink,
    ) -> Result<ActionRecord, ActionFailure> {
        let operation = Brc20Operation::mint(&args.tick, args.amt);
        self.run_inscription(ActionKind::Mint, &args.from, operation, sink)
            .await
    }

    /// Inscribes a transfer operation, whose inscription output is then sent with
    /// [`Self::transfer_nft`].
    pub async fn transfer(
        &self,
        args: TransferArgs,
        sink: &dyn ProgressSink,
    ) -> Result<ActionRecord, ActionFailure> {
        let operation = Brc20Operation::transfer(&args.tick, args.amt);
        self.run_inscription(ActionKind::Transfer, &args.from, operation, sink)
            .await
    }

    /// Sends an inscription output of `args.tick` to `args.to`.
    pub async fn transfer_nft(
        &self,
        args: NftTransferArgs,
        sink: &dyn ProgressSink,
    ) -> Result<ActionRecord, ActionFailure> {
        let mut record = ActionRecord::new(ActionKind::TransferNft);
        let _guard = match self.acquire() {
            Ok(guard) => guard,
            Err(err) => return Err(record.fail(err, sink)),
        };

        match self.nft_transfer_stages(&args, &mut record, sink).await {
            Ok(()) => {
                record.enter(ActionState::Succeeded, sink);
                Ok(record)
            }
            Err(err) => Err(record.fail(err, sink)),
        }
    }

    /// Looks up the broadcast order returned by [`Self::transfer_nft`].
    pub async fn transaction_detail(&self, order_id: &str) -> WaasResult<TransactionDetail> {
        self.fetch_transaction_detail(order_id).await
    }

    pub(super) fn wallet(&self) -> WaasResult<&dyn ChainWallet> {
        Ok(self.wallets.get(BTC_CHAIN_ID)?)
    }

    fn acquire(&self) -> WaasResult<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WaasError::ActionInProgress)?;

        Ok(BusyGuard(&self.busy))
    }

    async fn run_inscription(
        &self,
        kind: ActionKind,
        from: &str,
        operation: Brc20Operation,
        sink: &dyn ProgressSink,
    ) -> Result<ActionRecord, ActionFailure> {
        let mut record = ActionRecord::new(kind);
        let _guard = match self.acquire() {
            Ok(guard) => guard,
            Err(err) => return Err(record.fail(err, sink)),
        };

        match self
            .inscription_stages(from, operation, &mut record, sink)
            .await
        {
            Ok(()) => {
                record.enter(ActionState::Succeeded, sink);
                Ok(record)
            }
            Err(err) => Err(record.fail(err, sink)),
        }
    }

    async fn inscription_stages(
        &self,
        from: &str,
        operation: Brc20Operation,
        record: &mut ActionRecord,
        sink: &dyn ProgressSink,
    ) -> WaasResult<()> {
        validate_inscription(from, &operation)?;
        let kind = record.kind;

        record.enter(ActionState::FetchingSignInfo, sink);
        let info = self.fetch_signing_info(from, from).await?;
        record.signing_info = Some(info);
        sink.emit(ProgressEvent::SigningInfo(info));

        let cost = self.config.fee_rate_mode.cost(&info);
        let fee_rate = self.config.fee_rate_mode.fee_rate(&info);

        record.enter(ActionState::FetchingUtxo, sink);
        let (utxos, degraded) = match self
            .fetch_utxos(
                from,
                info.inscription_output,
                info.min_output,
                cost,
                INSCRIPTION_TX_COUNT,
                UtxoKind::Inscribe,
            )
            .await
        {
            Ok(utxos) => (utxos, false),
            Err(err @ WaasError::RemoteService(_)) if self.config.fallback.mock_utxos => {
                warn!("get-utxo failed ({err}), using canned utxos");
                (mock_utxos(), true)
            }
            Err(err) => return Err(err),
        };
        if degraded {
            record.degraded.push(ActionState::FetchingUtxo);
        }
        record.utxos = utxos.clone();
        sink.emit(ProgressEvent::Utxos {
            utxos: utxos.clone(),
            degraded,
        });

        record.enter(ActionState::BuildingOperation, sink);
        let body = operation.encode()?;
        debug!("inscription body: {body}");
        record.operation = Some(operation.clone());
        sink.emit(ProgressEvent::Operation(operation.clone()));

        record.enter(ActionState::ConstructingTx, sink);
        let set =
            self.construct_inscription_tx(from, &utxos, fee_rate, info.inscription_output, &body)?;
        record.signed_set = Some(set.clone());
        sink.emit(ProgressEvent::SignedInscription(set.clone()));

        record.enter(ActionState::Broadcasting, sink);
        let commit_addr = set
            .commit_addrs
            .first()
            .ok_or(SigningError::NoInscriptions)?;
        let broadcast = self
            .broadcast_batch(from, commit_addr, &set, kind, &operation.tick, fee_rate)
            .await;
        let (result, degraded) = match broadcast {
            Ok(Some(hashes)) => (Some(hashes), false),
            Ok(None) if self.config.fallback.mock_broadcast => {
                warn!("batch not broadcast, using canned hashes");
                (Some(mock_tx_hashes()), true)
            }
            Ok(None) => (None, false),
            Err(err @ WaasError::RemoteService(_)) if self.config.fallback.mock_broadcast => {
                warn!("batch broadcast failed ({err}), using canned hashes");
                (Some(mock_tx_hashes()), true)
            }
            Err(err) => return Err(err),
        };
        if degraded {
            record.degraded.push(ActionState::Broadcasting);
        }
        record.result = result.map(OperationResult::TxHashes);
        sink.emit(ProgressEvent::Broadcast {
            result: record.result.clone(),
            degraded,
        });

        Ok(())
    }

    async fn nft_transfer_stages(
        &self,
        args: &NftTransferArgs,
        record: &mut ActionRecord,
        sink: &dyn ProgressSink,
    ) -> WaasResult<()> {
        if args.tick.is_empty() {
            return Err(WaasError::Validation("tick is required".to_string()));
        }

        record.enter(ActionState::FetchingSignInfo, sink);
        let info = self.fetch_signing_info(&args.from, &args.to).await?;
        record.signing_info = Some(info);
        sink.emit(ProgressEvent::SigningInfo(info));

        let cost = self.config.fee_rate_mode.cost(&info);
        let fee_rate = self.config.fee_rate_mode.fee_rate(&info);

        record.enter(ActionState::FetchingUtxo, sink);
        let nft_utxos = self.fetch_nft_utxos(&args.from, &args.tick).await?;
        record.nft_utxos = nft_utxos.clone();
        sink.emit(ProgressEvent::NftUtxos(nft_utxos.clone()));
        if nft_utxos.is_empty() {
            return Err(WaasError::Validation(format!(
                "{} holds no {} inscription to transfer",
                args.from, args.tick
            )));
        }

        let utxos = self
            .fetch_utxos(
                &args.from,
                info.inscription_output,
                info.min_output,
                cost,
                TRANSFER_TX_COUNT,
                UtxoKind::Plain,
            )
            .await?;
        record.utxos = utxos.clone();
        sink.emit(ProgressEvent::Utxos {
            utxos: utxos.clone(),
            degraded: false,
        });

        record.enter(ActionState::ConstructingTx, sink);
        let tx = self.construct_transfer_tx(
            &args.from,
            &args.to,
            &nft_utxos,
            &utxos,
            fee_rate,
            info.inscription_output,
        )?;
        record.signed_tx = Some(tx.clone());
        sink.emit(ProgressEvent::SignedTransfer(tx.clone()));

        record.enter(ActionState::Broadcasting, sink);
        let order_id = self
            .broadcast_single(
                &args.from,
                &args.to,
                &tx,
                ActionKind::TransferNft,
                &args.tick,
                fee_rate,
                &nft_utxos,
            )
            .await?;
        record.result = Some(OperationResult::OrderId(order_id));
        sink.emit(ProgressEvent::Broadcast {
            result: record.result.clone(),
            degraded: false,
        });

        Ok(())
    }
}

fn validate_inscription(from: &str, operation: &Brc20Operation) -> WaasResult<()> {
    if from.trim().is_empty() {
        return Err(WaasError::Validation("inscribing address is required".to_string()));
    }
    if operation.tick.is_empty() {
        return Err(WaasError::Validation("tick is required".to_string()));
    }
    if operation.amt == Some(0) || operation.max == Some(0) || operation.lim == Some(0) {
        return Err(WaasError::Validation(format!(
            "{} amounts must be positive",
            operation.op
        )));
    }

    Ok(())
}
