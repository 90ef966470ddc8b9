use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::{WaasError, WaasResult};

/// Response envelope shared by every endpoint.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiResponse<T> {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Returns `data` when `code` is zero.
    pub fn into_data(self, endpoint: &str) -> WaasResult<T> {
        if self.code != 0 {
            let msg = if self.msg.is_empty() {
                format!("{endpoint} failed with code {}", self.code)
            } else {
                format!("{endpoint} failed with code {}: {}", self.code, self.msg)
            };
            return Err(WaasError::RemoteService(msg));
        }

        self.data
            .ok_or_else(|| WaasError::RemoteService(format!("{endpoint}: response has no data")))
    }
}

/// Returns the first record of a `data` array, the only one the pipeline reads.
pub fn first_record<T>(data: Vec<T>, endpoint: &str) -> WaasResult<T> {
    data.into_iter()
        .next()
        .ok_or_else(|| WaasError::RemoteService(format!("{endpoint}: empty data")))
}

/// Fee and sizing quote for a sender/receiver pair.
///
/// The service sends numbers either as JSON numbers or as decimal strings.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningInfo {
    /// Value of every reveal output, in satoshis
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub inscription_output: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub min_output: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub normal_cost: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub max_cost: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub normal_fee_rate: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub max_fee_rate: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmptyJson {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInfoRequest {
    pub addr_from: String,
    pub addr_to: String,
    pub tx_amount: u64,
    pub chain_id: u32,
    pub ext_json: EmptyJson,
}

/// `utxoType` of a UTXO request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtxoKind {
    /// Outputs funding an inscription
    Inscribe,
    /// Outputs funding a plain transfer
    Plain,
}

impl UtxoKind {
    pub fn utxo_type(&self) -> u8 {
        match self {
            Self::Inscribe => 11,
            Self::Plain => 1,
        }
    }
}

impl Serialize for UtxoKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.utxo_type())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoRequest {
    pub address: String,
    /// Value the returned outputs must cover, in satoshis
    pub coin_amount: u64,
    pub service_charge: u64,
    pub utxo_type: UtxoKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NftUtxoRequest {
    pub address: String,
    pub tick: String,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoQuery<T> {
    pub chain_id: u32,
    pub utxo_requests: Vec<T>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    pub tx_hash: String,
    pub vout: u32,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub coin_amount: u64,
    #[serde(default)]
    pub status: u32,
    /// Token amount carried by an inscription output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_amount: Option<String>,
}

/// UTXO set of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoList {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub utxo_list: Vec<UnspentOutput>,
}

/// `txAmount` of a broadcast item: zero sats for inscriptions, the token amount for an
/// inscription transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TxAmount {
    Sats(u64),
    Token(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broadcast_type: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depend_tx: Option<Vec<String>>,
    pub fee_rate: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

/// Signed transaction submitted for broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequestItem {
    pub signed_tx: String,
    pub wallet_id: String,
    pub addr_from: String,
    pub addr_to: String,
    pub tx_hash: String,
    pub tx_amount: TxAmount,
    pub chain_id: u32,
    pub tx_type: String,
    pub service_charge: u64,
    pub token_address: String,
    pub ext_json: ExtJson,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBroadcastRequest {
    pub tx_list: Vec<BroadcastRequestItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHashItem {
    pub item_id: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchBroadcastResult {
    pub tx_hash_list: Option<Vec<TxHashItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResult {
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetailQuery {
    pub wallet_id: String,
    pub order_id: String,
    pub chain_id: u32,
}

impl TransactionDetailQuery {
    /// Query string, parameters in the order signed by the service.
    pub fn to_query_string(&self) -> String {
        format!(
            "walletId={}&orderId={}&chainId={}",
            self.wallet_id, self.order_id, self.chain_id
        )
    }
}

/// Broadcast order, as tracked by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub tx_type: Option<String>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_accept_numbers_and_strings_in_signing_info() {
        let info: SigningInfo = serde_json::from_value(json!({
            "inscriptionOutput": "546",
            "minOutput": 546,
            "normalCost": "1000",
            "maxCost": 2000,
            "normalFeeRate": "12",
            "maxFeeRate": 20,
        }))
        .unwrap();

        assert_eq!(
            info,
            SigningInfo {
                inscription_output: 546,
                min_output: 546,
                normal_cost: 1000,
                max_cost: 2000,
                normal_fee_rate: 12,
                max_fee_rate: 20,
            }
        );
    }

    #[test]
    fn test_should_reject_failed_envelope() {
        let response: ApiResponse<Vec<SigningInfo>> =
            serde_json::from_value(json!({ "code": 50011, "msg": "Too Many Requests", "data": [] }))
                .unwrap();

        let err = response.into_data("get-sign-info").unwrap_err();
        assert!(err.to_string().contains("Too Many Requests"));
    }

    #[test]
    fn test_should_accept_string_code() {
        let response: ApiResponse<Vec<TxHashItem>> =
            serde_json::from_value(json!({ "code": "0", "msg": "", "data": [] })).unwrap();

        assert_eq!(response.into_data("test").unwrap(), vec![]);
    }

    #[test]
    fn test_should_reject_missing_data() {
        let response: ApiResponse<Vec<TxHashItem>> =
            serde_json::from_value(json!({ "code": 0, "msg": "" })).unwrap();

        assert!(matches!(
            response.into_data("test"),
            Err(WaasError::RemoteService(_))
        ));
        assert!(first_record::<TxHashItem>(vec![], "test").is_err());
    }

    #[test]
    fn test_should_serialize_utxo_query() {
        let query = UtxoQuery {
            chain_id: 0,
            utxo_requests: vec![UtxoRequest {
                address: "bc1q".to_string(),
                coin_amount: 1092,
                service_charge: 2000,
                utxo_type: UtxoKind::Inscribe,
            }],
        };

        assert_eq!(
            serde_json::to_string(&query).unwrap(),
            r#"{"chainId":0,"utxoRequests":[{"address":"bc1q","coinAmount":1092,"serviceCharge":2000,"utxoType":11}]}"#
        );
    }

    #[test]
    fn test_should_serialize_broadcast_items() {
        let item = BroadcastRequestItem {
            signed_tx: "00".to_string(),
            wallet_id: "w".to_string(),
            addr_from: "a".to_string(),
            addr_to: "b".to_string(),
            tx_hash: "h".to_string(),
            tx_amount: TxAmount::Sats(0),
            chain_id: 0,
            tx_type: "BRC20_MINT".to_string(),
            service_charge: 10,
            token_address: "btc-brc20-okex".to_string(),
            ext_json: ExtJson {
                broadcast_type: Some(1),
                depend_tx: Some(vec![]),
                fee_rate: 12,
                item_id: Some("commitTx".to_string()),
            },
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "signedTx": "00",
                "walletId": "w",
                "addrFrom": "a",
                "addrTo": "b",
                "txHash": "h",
                "txAmount": 0,
                "chainId": 0,
                "txType": "BRC20_MINT",
                "serviceCharge": 10,
                "tokenAddress": "btc-brc20-okex",
                "extJson": { "broadcastType": 1, "dependTx": [], "feeRate": 12, "itemId": "commitTx" }
            })
        );

        let single = ExtJson {
            broadcast_type: None,
            depend_tx: None,
            fee_rate: 12,
            item_id: None,
        };
        assert_eq!(
            serde_json::to_string(&single).unwrap(),
            r#"{"feeRate":12}"#
        );
        assert_eq!(
            serde_json::to_string(&TxAmount::Token("1".to_string())).unwrap(),
            r#""1""#
        );
    }

    #[test]
    fn test_should_parse_nft_utxos() {
        let lists: Vec<UtxoList> = serde_json::from_value(json!([{
            "address": "bc1p",
            "utxoList": [{
                "txHash": "aa",
                "vout": 0,
                "coinAmount": "546",
                "status": 1,
                "tokenAmount": "1"
            }]
        }]))
        .unwrap();

        assert_eq!(lists[0].utxo_list[0].coin_amount, 546);
        assert_eq!(lists[0].utxo_list[0].token_amount.as_deref(), Some("1"));
    }

    #[test]
    fn test_should_build_detail_query_string() {
        let query = TransactionDetailQuery {
            wallet_id: "w".to_string(),
            order_id: "486750864669831168".to_string(),
            chain_id: 0,
        };
        assert_eq!(
            query.to_query_string(),
            "walletId=w&orderId=486750864669831168&chainId=0"
        );
    }
}
