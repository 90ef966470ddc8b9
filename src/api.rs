//! Wallet-as-a-service REST API.
//!
//! [`WaasApi`] is the seam between the pipeline and the service: [`WaasClient`] talks HTTPS,
//! tests substitute an in-memory implementation.

mod auth;
mod client;
mod types;

use async_trait::async_trait;

pub use self::client::WaasClient;
pub use self::types::{
    first_record, ApiResponse, BatchBroadcastRequest, BatchBroadcastResult, BroadcastRequestItem,
    EmptyJson, ExtJson, NftUtxoRequest, SendTransactionResult, SignInfoRequest, SigningInfo,
    TransactionDetail, TransactionDetailQuery, TxAmount, TxHashItem, UnspentOutput, UtxoKind,
    UtxoList, UtxoQuery, UtxoRequest,
};
use crate::WaasResult;

pub mod endpoints {
    pub const GET_SIGN_INFO: &str = "/api/v5/waas/transaction/get-sign-info";
    pub const GET_UTXO: &str = "/api/v5/waas/transaction/get-utxo";
    pub const GET_UTXO_NFT: &str = "/api/v5/waas/transaction/get-utxo-nft";
    pub const SEND_TRANSACTION: &str = "/api/v5/waas/transaction/send-transaction";
    pub const SEND_TRANSACTION_BATCH: &str = "/api/v5/waas/transaction/send-transaction-batch";
    pub const GET_TRANSACTION_DETAIL: &str = "/api/v5/waas/transaction/get-transaction-detail";
}

/// Endpoints of the wallet service used by the pipeline.
///
/// Every method returns the `data` array of a successful (`code == 0`) response; any other
/// answer, a transport failure or a timeout is a [`crate::WaasError::RemoteService`].
#[async_trait]
pub trait WaasApi: Send + Sync {
    async fn get_sign_info(&self, request: &SignInfoRequest) -> WaasResult<Vec<SigningInfo>>;

    async fn get_utxo(&self, request: &UtxoQuery<UtxoRequest>) -> WaasResult<Vec<UtxoList>>;

    async fn get_utxo_nft(&self, request: &UtxoQuery<NftUtxoRequest>)
        -> WaasResult<Vec<UtxoList>>;

    async fn send_transaction_batch(
        &self,
        request: &BatchBroadcastRequest,
    ) -> WaasResult<Vec<BatchBroadcastResult>>;

    async fn send_transaction(
        &self,
        item: &BroadcastRequestItem,
    ) -> WaasResult<Vec<SendTransactionResult>>;

    async fn get_transaction_detail(
        &self,
        query: &TransactionDetailQuery,
    ) -> WaasResult<Vec<TransactionDetail>>;
}
