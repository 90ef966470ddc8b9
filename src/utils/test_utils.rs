use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, Network, PrivateKey};
use serde::Serialize;

use crate::api::{
    endpoints, BatchBroadcastRequest, BatchBroadcastResult, BroadcastRequestItem, NftUtxoRequest,
    SendTransactionResult, SignInfoRequest, SigningInfo, TransactionDetail,
    TransactionDetailQuery, TxHashItem, UnspentOutput, UtxoList, UtxoQuery, UtxoRequest, WaasApi,
};
use crate::config::SessionConfig;
use crate::pipeline::Brc20Session;
use crate::wallet::{BtcWallet, WalletRegistry};
use crate::{WaasError, WaasResult};

// <https://mempool.space/testnet/address/tb1qzc8dhpkg5e4t6xyn4zmexxljc4nkje59dg3ark>
pub const TEST_WIF: &str = "cVkWbHmoCx6jS8AyPNQqvFr8V9r2qzDHJLaxGDQgDJfxT73w6fuU";
pub const TEST_TXID: &str = "791b415dc6946d864d368a0e5ec5c09ee2ad39cf298bc6e3f9aec293732cfda7";
pub const RECIPIENT: &str = "tb1qax89amll2uas5k92tmuc8rdccmqddqw94vrr86";
pub const ORDER_ID: &str = "486750864669831168";

pub fn p2wpkh_address() -> String {
    let public_key = PrivateKey::from_wif(TEST_WIF)
        .unwrap()
        .public_key(&Secp256k1::new());
    Address::p2wpkh(&public_key, Network::Testnet)
        .unwrap()
        .to_string()
}

pub fn p2tr_address() -> String {
    let secp = Secp256k1::new();
    let public_key = PrivateKey::from_wif(TEST_WIF).unwrap().public_key(&secp);
    let (x_only, _) = public_key.inner.x_only_public_key();
    Address::p2tr(&secp, x_only, None, Network::Testnet).to_string()
}

pub fn test_wallets() -> WalletRegistry {
    let mut wallets = WalletRegistry::default();
    wallets.register(
        BtcWallet::new(Network::Testnet)
            .with_private_key(TEST_WIF)
            .unwrap(),
    );
    wallets
}

pub fn signing_info() -> SigningInfo {
    SigningInfo {
        inscription_output: 546,
        min_output: 546,
        normal_cost: 1_000,
        max_cost: 2_000,
        normal_fee_rate: 10,
        max_fee_rate: 20,
    }
}

pub fn funding_utxo(coin_amount: u64) -> UnspentOutput {
    UnspentOutput {
        tx_hash: TEST_TXID.to_string(),
        vout: 1,
        coin_amount,
        status: 1,
        token_amount: None,
    }
}

pub fn nft_utxo() -> UnspentOutput {
    UnspentOutput {
        tx_hash: TEST_TXID.to_string(),
        vout: 0,
        coin_amount: 546,
        status: 1,
        token_amount: Some("1".to_string()),
    }
}

pub fn utxo_list(utxos: Vec<UnspentOutput>) -> Vec<UtxoList> {
    vec![UtxoList {
        address: None,
        utxo_list: utxos,
    }]
}

/// Request received by [`MockWaasApi`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: &'static str,
    pub body: serde_json::Value,
}

/// In-memory wallet service answering with canned data and recording every request.
///
/// An `Err` answer is returned as a remote service error carrying the string.
pub struct MockWaasApi {
    pub sign_info: Result<Vec<SigningInfo>, String>,
    pub utxos: Result<Vec<UtxoList>, String>,
    pub nft_utxos: Result<Vec<UtxoList>, String>,
    pub batch: Result<Vec<BatchBroadcastResult>, String>,
    pub send: Result<Vec<SendTransactionResult>, String>,
    pub detail: Result<Vec<TransactionDetail>, String>,
    /// Delay before answering any request
    pub delay: Option<Duration>,
    pub(crate) calls: Mutex<Vec<RecordedCall>>,
}

impl Default for MockWaasApi {
    fn default() -> Self {
        Self {
            sign_info: Ok(vec![signing_info()]),
            utxos: Ok(utxo_list(vec![funding_utxo(63_464)])),
            nft_utxos: Ok(utxo_list(vec![nft_utxo()])),
            batch: Ok(vec![BatchBroadcastResult {
                tx_hash_list: Some(vec![TxHashItem {
                    item_id: "commitTx".to_string(),
                    tx_hash: "00".repeat(32),
                }]),
            }]),
            send: Ok(vec![SendTransactionResult {
                order_id: Some(ORDER_ID.to_string()),
            }]),
            detail: Ok(vec![TransactionDetail {
                order_id: Some(ORDER_ID.to_string()),
                tx_hash: None,
                tx_type: Some("TRANSFER".to_string()),
                other: Default::default(),
            }]),
            delay: None,
            calls: Mutex::default(),
        }
    }
}

impl MockWaasApi {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn endpoints(&self) -> Vec<&'static str> {
        self.calls().into_iter().map(|call| call.endpoint).collect()
    }

    /// Body of the last request sent to `endpoint`.
    pub fn last_body(&self, endpoint: &str) -> Option<serde_json::Value> {
        self.calls()
            .into_iter()
            .rev()
            .find(|call| call.endpoint == endpoint)
            .map(|call| call.body)
    }

    async fn answer<B, T>(
        &self,
        endpoint: &'static str,
        body: &B,
        answer: &Result<T, String>,
    ) -> WaasResult<T>
    where
        B: Serialize + Sync,
        T: Clone + Send,
    {
        self.calls.lock().unwrap().push(RecordedCall {
            endpoint,
            body: serde_json::to_value(body).unwrap(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        answer
            .clone()
            .map_err(|msg| WaasError::RemoteService(format!("{endpoint}: {msg}")))
    }
}

#[async_trait]
impl WaasApi for MockWaasApi {
    async fn get_sign_info(&self, request: &SignInfoRequest) -> WaasResult<Vec<SigningInfo>> {
        self.answer(endpoints::GET_SIGN_INFO, request, &self.sign_info)
            .await
    }

    async fn get_utxo(&self, request: &UtxoQuery<UtxoRequest>) -> WaasResult<Vec<UtxoList>> {
        self.answer(endpoints::GET_UTXO, request, &self.utxos).await
    }

    async fn get_utxo_nft(
        &self,
        request: &UtxoQuery<NftUtxoRequest>,
    ) -> WaasResult<Vec<UtxoList>> {
        self.answer(endpoints::GET_UTXO_NFT, request, &self.nft_utxos)
            .await
    }

    async fn send_transaction_batch(
        &self,
        request: &BatchBroadcastRequest,
    ) -> WaasResult<Vec<BatchBroadcastResult>> {
        self.answer(endpoints::SEND_TRANSACTION_BATCH, request, &self.batch)
            .await
    }

    async fn send_transaction(
        &self,
        item: &BroadcastRequestItem,
    ) -> WaasResult<Vec<SendTransactionResult>> {
        self.answer(endpoints::SEND_TRANSACTION, item, &self.send)
            .await
    }

    async fn get_transaction_detail(
        &self,
        query: &TransactionDetailQuery,
    ) -> WaasResult<Vec<TransactionDetail>> {
        self.answer(
            endpoints::GET_TRANSACTION_DETAIL,
            &query.to_query_string(),
            &self.detail,
        )
        .await
    }
}

/// Session over `api` signing with [`TEST_WIF`], batch broadcast enabled.
pub fn test_session(api: MockWaasApi) -> Brc20Session<MockWaasApi> {
    let config = SessionConfig {
        wallet_id: "test-wallet".to_string(),
        batch_broadcast_enabled: true,
        ..Default::default()
    };

    Brc20Session::new(api, test_wallets(), config)
}
