use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{
    ApiResponse, BatchBroadcastRequest, BatchBroadcastResult, BroadcastRequestItem,
    NftUtxoRequest, SendTransactionResult, SignInfoRequest, SigningInfo, TransactionDetail,
    TransactionDetailQuery, UtxoList, UtxoQuery, UtxoRequest,
};
use super::{auth, endpoints, WaasApi};
use crate::config::Credentials;
use crate::{WaasConfig, WaasError, WaasResult};

/// HTTPS client of the wallet service.
pub struct WaasClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl std::fmt::Debug for WaasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaasClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl WaasClient {
    pub fn new(config: &WaasConfig) -> WaasResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            credentials: config.credentials(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> WaasResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body)
            .map_err(|err| WaasError::Validation(format!("cannot encode {path} body: {err}")))?;
        debug!("POST {path}: {body}");

        self.send(Method::POST, path, body).await
    }

    async fn get<T>(&self, path_and_query: &str) -> WaasResult<T>
    where
        T: DeserializeOwned,
    {
        debug!("GET {path_and_query}");

        self.send(Method::GET, path_and_query, String::new()).await
    }

    async fn send<T>(&self, method: Method, path: &str, body: String) -> WaasResult<T>
    where
        T: DeserializeOwned,
    {
        let timestamp = auth::timestamp(Utc::now());
        let headers = auth::headers(&self.credentials, &timestamp, &method, path, &body)?;

        let mut request = self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("{path} answered {status}: {text}");

        let envelope: ApiResponse<T> = serde_json::from_str(&text).map_err(|err| {
            WaasError::RemoteService(format!("{path}: malformed response ({status}): {err}"))
        })?;

        envelope.into_data(path)
    }
}

#[async_trait]
impl WaasApi for WaasClient {
    async fn get_sign_info(&self, request: &SignInfoRequest) -> WaasResult<Vec<SigningInfo>> {
        self.post(endpoints::GET_SIGN_INFO, request).await
    }

    async fn get_utxo(&self, request: &UtxoQuery<UtxoRequest>) -> WaasResult<Vec<UtxoList>> {
        self.post(endpoints::GET_UTXO, request).await
    }

    async fn get_utxo_nft(
        &self,
        request: &UtxoQuery<NftUtxoRequest>,
    ) -> WaasResult<Vec<UtxoList>> {
        self.post(endpoints::GET_UTXO_NFT, request).await
    }

    async fn send_transaction_batch(
        &self,
        request: &BatchBroadcastRequest,
    ) -> WaasResult<Vec<BatchBroadcastResult>> {
        self.post(endpoints::SEND_TRANSACTION_BATCH, request).await
    }

    async fn send_transaction(
        &self,
        item: &BroadcastRequestItem,
    ) -> WaasResult<Vec<SendTransactionResult>> {
        self.post(endpoints::SEND_TRANSACTION, item).await
    }

    async fn get_transaction_detail(
        &self,
        query: &TransactionDetailQuery,
    ) -> WaasResult<Vec<TransactionDetail>> {
        self.get(&format!(
            "{}?{}",
            endpoints::GET_TRANSACTION_DETAIL,
            query.to_query_string()
        ))
        .await
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;
    use crate::config::DEVELOPMENT_HOST;

    fn sign_info_request() -> SignInfoRequest {
        SignInfoRequest {
            addr_from: "a".to_string(),
            addr_to: "a".to_string(),
            tx_amount: 0,
            chain_id: 0,
            ext_json: Default::default(),
        }
    }

    #[test]
    fn test_should_build_client_from_config() {
        let config = WaasConfig::from_toml(
            r#"
            api_key = "key"
            secret_key = "secret"
            environment = "development"
            "#,
        )
        .unwrap();

        let client = WaasClient::new(&config).unwrap();
        assert_eq!(client.base_url(), DEVELOPMENT_HOST);
        assert!(!format!("{client:?}").contains("secret"));
    }

    #[tokio::test]
    async fn test_should_fail_on_unreachable_service() {
        let config = WaasConfig::from_toml(
            r#"
            base_url = "http://127.0.0.1:9"
            timeout_secs = 2
            "#,
        )
        .unwrap();
        let client = WaasClient::new(&config).unwrap();

        let err = client.get_sign_info(&sign_info_request()).await.unwrap_err();

        assert!(matches!(err, WaasError::RemoteService(_)));
    }

    #[tokio::test]
    async fn test_should_time_out_on_silent_service() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // accept and hold the connection without ever answering
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let config = WaasConfig::from_toml(&format!(
            r#"
            base_url = "http://{addr}"
            timeout_secs = 1
            "#
        ))
        .unwrap();
        let client = WaasClient::new(&config).unwrap();

        let err = client.get_sign_info(&sign_info_request()).await.unwrap_err();
        server.abort();

        assert!(matches!(err, WaasError::RemoteService(_)));
        assert!(err.to_string().contains("timed out"), "{err}");
    }
}
