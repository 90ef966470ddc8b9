//! Pipeline stages, each one a single service call or a single local signing step.

use super::action::ActionKind;
use super::session::Brc20Session;
use crate::api::{
    endpoints, first_record, BatchBroadcastRequest, BroadcastRequestItem, EmptyJson, ExtJson,
    NftUtxoRequest, SignInfoRequest, SigningInfo, TransactionDetail, TransactionDetailQuery,
    TxAmount, TxHashItem, UnspentOutput, UtxoKind, UtxoQuery, UtxoRequest, WaasApi,
};
use crate::utils::constants::{BROADCAST_TYPE_BATCH, BTC_CHAIN_ID, COMMIT_ITEM_ID, TEXT_CONTENT_TYPE};
use crate::wallet::{
    InscribeRequest, InscriptionData, PrevOutput, SignRequest, SignedInscriptionSet, SignedTx,
    TransferOutput, TransferRequest,
};
use crate::{SigningError, WaasError, WaasResult};

const NFT_UTXO_PAGE: u32 = 1;
const NFT_UTXO_PAGE_SIZE: u32 = 10;

impl<A> Brc20Session<A>
where
    A: WaasApi,
{
    /// Fee and sizing quote for transactions from `from` to `to`.
    pub async fn fetch_signing_info(&self, from: &str, to: &str) -> WaasResult<SigningInfo> {
        if from.trim().is_empty() || to.trim().is_empty() {
            return Err(WaasError::Validation(
                "sender and receiver addresses are required".to_string(),
            ));
        }
        let wallet = self.wallet()?;
        if let Some(invalid) = [from, to].into_iter().find(|addr| !wallet.valid_address(addr)) {
            return Err(WaasError::Validation(format!(
                "{invalid} is not a valid address on this network"
            )));
        }

        let request = SignInfoRequest {
            addr_from: from.to_string(),
            addr_to: to.to_string(),
            tx_amount: 0,
            chain_id: BTC_CHAIN_ID,
            ext_json: EmptyJson::default(),
        };
        let info = first_record(
            self.api.get_sign_info(&request).await?,
            endpoints::GET_SIGN_INFO,
        )?;
        debug!("signing info for {from} -> {to}: {info:?}");

        Ok(info)
    }

    /// Outputs of `from` covering `max(inscription_output * tx_count, min_output)` plus a
    /// service charge of `unit_cost * tx_count`.
    pub async fn fetch_utxos(
        &self,
        from: &str,
        inscription_output: u64,
        min_output: u64,
        unit_cost: u64,
        tx_count: u64,
        kind: UtxoKind,
    ) -> WaasResult<Vec<UnspentOutput>> {
        let request = UtxoQuery {
            chain_id: BTC_CHAIN_ID,
            utxo_requests: vec![UtxoRequest {
                address: from.to_string(),
                coin_amount: inscription_output.saturating_mul(tx_count).max(min_output),
                service_charge: unit_cost.saturating_mul(tx_count),
                utxo_type: kind,
            }],
        };
        let utxos =
            first_record(self.api.get_utxo(&request).await?, endpoints::GET_UTXO)?.utxo_list;
        debug!("{} utxos for {from}", utxos.len());

        Ok(utxos)
    }

    /// Inscription outputs of `tick` held by `from`.
    pub async fn fetch_nft_utxos(&self, from: &str, tick: &str) -> WaasResult<Vec<UnspentOutput>> {
        let request = UtxoQuery {
            chain_id: BTC_CHAIN_ID,
            utxo_requests: vec![NftUtxoRequest {
                address: from.to_string(),
                tick: tick.to_string(),
                page: NFT_UTXO_PAGE,
                page_size: NFT_UTXO_PAGE_SIZE,
            }],
        };
        let utxos = first_record(
            self.api.get_utxo_nft(&request).await?,
            endpoints::GET_UTXO_NFT,
        )?
        .utxo_list;
        debug!("{} {tick} inscription utxos for {from}", utxos.len());

        Ok(utxos)
    }

    /// Signs the commit transaction spending every one of `utxos` and the reveal transaction
    /// inscribing `body`, revealed to `from`.
    pub fn construct_inscription_tx(
        &self,
        from: &str,
        utxos: &[UnspentOutput],
        fee_rate: u64,
        inscription_output: u64,
        body: &str,
    ) -> WaasResult<SignedInscriptionSet> {
        let request = InscribeRequest {
            address: from.to_string(),
            commit_tx_prev_outputs: prev_outputs(utxos),
            commit_fee_rate: fee_rate,
            reveal_fee_rate: fee_rate,
            reveal_out_value: inscription_output,
            inscriptions: vec![InscriptionData {
                content_type: TEXT_CONTENT_TYPE.to_string(),
                body: body.to_string(),
                reveal_addr: from.to_string(),
            }],
            change_address: from.to_string(),
        };

        match self.wallet()?.sign_transaction(SignRequest::Inscribe(request))? {
            SignedTx::Inscription(set) => Ok(set),
            SignedTx::Raw(_) => Err(SigningError::UnsupportedRequest.into()),
        }
    }

    /// Signs a transaction paying `output_value` to `to`, spending `nft_utxos` first.
    pub fn construct_transfer_tx(
        &self,
        from: &str,
        to: &str,
        nft_utxos: &[UnspentOutput],
        funding_utxos: &[UnspentOutput],
        fee_rate: u64,
        output_value: u64,
    ) -> WaasResult<String> {
        let request = TransferRequest {
            address: from.to_string(),
            leading_inputs: prev_outputs(nft_utxos),
            inputs: prev_outputs(funding_utxos),
            output: TransferOutput {
                address: to.to_string(),
                amount: output_value,
            },
            fee_per_b: fee_rate,
        };

        match self.wallet()?.sign_transaction(SignRequest::Transfer(request))? {
            SignedTx::Raw(tx) => Ok(tx),
            SignedTx::Inscription(_) => Err(SigningError::UnsupportedRequest.into()),
        }
    }

    /// Broadcasts the commit transaction and its reveal transactions in one batch.
    ///
    /// Returns `None`, without calling the service, when the batch broadcast is disabled.
    pub async fn broadcast_batch(
        &self,
        from: &str,
        to: &str,
        set: &SignedInscriptionSet,
        kind: ActionKind,
        tick: &str,
        fee_rate: u64,
    ) -> WaasResult<Option<Vec<TxHashItem>>> {
        let wallet = self.wallet()?;
        let commit_hash = wallet.calc_tx_hash(&set.commit_tx)?;
        let commit_item = BroadcastRequestItem {
            signed_tx: set.commit_tx.clone(),
            wallet_id: self.config.wallet_id.clone(),
            addr_from: from.to_string(),
            addr_to: to.to_string(),
            tx_hash: commit_hash.clone(),
            tx_amount: TxAmount::Sats(0),
            chain_id: BTC_CHAIN_ID,
            tx_type: kind.tx_type().to_string(),
            service_charge: set.commit_tx_fee,
            token_address: kind.token_address(tick),
            ext_json: ExtJson {
                broadcast_type: Some(BROADCAST_TYPE_BATCH),
                depend_tx: Some(Vec::new()),
                fee_rate,
                item_id: Some(COMMIT_ITEM_ID.to_string()),
            },
        };

        let mut tx_list = vec![commit_item.clone()];
        for (index, reveal_tx) in set.reveal_txs.iter().enumerate() {
            let fee = set.reveal_tx_fees.get(index).copied().ok_or_else(|| {
                SigningError::MalformedTransaction(format!("no fee for reveal transaction {index}"))
            })?;
            // reveals spend the commit output, they cannot confirm before it
            tx_list.push(BroadcastRequestItem {
                signed_tx: reveal_tx.clone(),
                addr_from: to.to_string(),
                addr_to: from.to_string(),
                tx_hash: wallet.calc_tx_hash(reveal_tx)?,
                service_charge: fee,
                ext_json: ExtJson {
                    depend_tx: Some(vec![commit_hash.clone()]),
                    item_id: Some(format!("revealTx{index}")),
                    ..commit_item.ext_json.clone()
                },
                ..commit_item.clone()
            });
        }

        let request = BatchBroadcastRequest { tx_list };
        if !self.config.batch_broadcast_enabled {
            info!(
                "batch broadcast disabled, {} transactions not broadcast",
                request.tx_list.len()
            );
            return Ok(None);
        }

        let result = first_record(
            self.api.send_transaction_batch(&request).await?,
            endpoints::SEND_TRANSACTION_BATCH,
        )?;
        let hashes = result.tx_hash_list.ok_or_else(|| {
            WaasError::RemoteService(format!(
                "{}: response has no txHashList",
                endpoints::SEND_TRANSACTION_BATCH
            ))
        })?;
        info!("broadcast {} transactions", hashes.len());

        Ok(Some(hashes))
    }

    /// Broadcasts a signed inscription transfer, returning the order tracking it.
    #[allow(clippy::too_many_arguments)]
    pub async fn broadcast_single(
        &self,
        from: &str,
        to: &str,
        tx: &str,
        kind: ActionKind,
        tick: &str,
        fee_rate: u64,
        nft_utxos: &[UnspentOutput],
    ) -> WaasResult<String> {
        let token_amount = nft_utxos
            .first()
            .and_then(|utxo| utxo.token_amount.clone())
            .ok_or_else(|| {
                WaasError::Validation("no token amount on the inscription output".to_string())
            })?;

        let item = BroadcastRequestItem {
            signed_tx: tx.to_string(),
            wallet_id: self.config.wallet_id.clone(),
            addr_from: from.to_string(),
            addr_to: to.to_string(),
            tx_hash: self.wallet()?.calc_tx_hash(tx)?,
            tx_amount: TxAmount::Token(token_amount),
            chain_id: BTC_CHAIN_ID,
            tx_type: kind.tx_type().to_string(),
            service_charge: 0,
            token_address: kind.token_address(tick),
            ext_json: ExtJson {
                broadcast_type: None,
                depend_tx: None,
                fee_rate,
                item_id: None,
            },
        };

        let result = first_record(
            self.api.send_transaction(&item).await?,
            endpoints::SEND_TRANSACTION,
        )?;
        let order_id = result.order_id.ok_or_else(|| {
            WaasError::RemoteService(format!(
                "{}: response has no orderId",
                endpoints::SEND_TRANSACTION
            ))
        })?;
        info!("transfer broadcast, order {order_id}");

        Ok(order_id)
    }

    pub async fn fetch_transaction_detail(&self, order_id: &str) -> WaasResult<TransactionDetail> {
        if order_id.trim().is_empty() {
            return Err(WaasError::Validation("order id is required".to_string()));
        }

        let query = TransactionDetailQuery {
            wallet_id: self.config.wallet_id.clone(),
            order_id: order_id.to_string(),
            chain_id: BTC_CHAIN_ID,
        };

        first_record(
            self.api.get_transaction_detail(&query).await?,
            endpoints::GET_TRANSACTION_DETAIL,
        )
    }
}

fn prev_outputs(utxos: &[UnspentOutput]) -> Vec<PrevOutput> {
    utxos
        .iter()
        .map(|utxo| PrevOutput {
            tx_id: utxo.tx_hash.clone(),
            v_out: utxo.vout,
            amount: utxo.coin_amount,
        })
        .collect()
}
