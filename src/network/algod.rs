//! algod v2 REST client

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::{
    ApplicationInfo, NetworkClient, NodeStatus, PendingTransactionInfo, SubmitResponse,
    TransactionParamsResponse,
};
use crate::common::{NetworkConfig, SwapError, SwapResult};
use crate::constants::ALGOD_TOKEN_HEADER;
use crate::transaction::SuggestedParams;

/// Which error a failed call maps to
#[derive(Debug, Clone, Copy)]
enum CallKind {
    Query,
    Submit,
    Application,
}

impl CallKind {
    fn error(self, message: String) -> SwapError {
        match self {
            CallKind::Query => SwapError::Network(message),
            CallKind::Submit => SwapError::Submission(message),
            CallKind::Application => SwapError::ContractQuery(message),
        }
    }
}

pub struct AlgodClient {
    base_url: String,
    token: String,
    http_client: Client,
}

impl AlgodClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> SwapResult<Self> {
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(16)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .connect_timeout(Duration::from_secs(5))
            // status-after-block holds the connection for up to a minute
            .timeout(Duration::from_secs(75))
            .build()
            .map_err(|e| SwapError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http_client,
        })
    }

    pub fn from_config(config: &NetworkConfig) -> SwapResult<Self> {
        Self::new(config.algod_url.clone(), config.algod_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            request
        } else {
            request.header(ALGOD_TOKEN_HEADER, &self.token)
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response, kind: CallKind) -> SwapResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| kind.error(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(kind.error(error_message(status, &body)));
        }
        serde_json::from_str(&body)
            .map_err(|e| kind.error(format!("unexpected response shape: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, kind: CallKind) -> SwapResult<T> {
        let response = self
            .authorize(self.http_client.get(self.url(path)))
            .send()
            .await
            .map_err(|e| kind.error(format!("GET {path} failed: {e}")))?;
        Self::read_json(response, kind).await
    }
}

/// algod reports failures as `{"message": "..."}`
fn error_message(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    format!("{status}: {message}")
}

#[async_trait::async_trait]
impl NetworkClient for AlgodClient {
    async fn transaction_params(&self) -> SwapResult<SuggestedParams> {
        let response: TransactionParamsResponse =
            self.get("/v2/transactions/params", CallKind::Query).await?;
        response.into_suggested_params()
    }

    async fn send_raw_transaction(&self, signed: &[u8]) -> SwapResult<String> {
        let response = self
            .authorize(self.http_client.post(self.url("/v2/transactions")))
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(signed.to_vec())
            .send()
            .await
            .map_err(|e| SwapError::Submission(format!("POST /v2/transactions failed: {e}")))?;
        let submitted: SubmitResponse = Self::read_json(response, CallKind::Submit).await?;
        info!(tx_id = %submitted.tx_id, bytes = signed.len(), "transaction submitted");
        Ok(submitted.tx_id)
    }

    async fn pending_transaction_info(&self, tx_id: &str) -> SwapResult<PendingTransactionInfo> {
        self.get(&format!("/v2/transactions/pending/{tx_id}?format=json"), CallKind::Query).await
    }

    async fn status(&self) -> SwapResult<NodeStatus> {
        self.get("/v2/status", CallKind::Query).await
    }

    async fn status_after_block(&self, round: u64) -> SwapResult<NodeStatus> {
        debug!(round, "waiting for block");
        self.get(&format!("/v2/status/wait-for-block-after/{round}"), CallKind::Query).await
    }

    async fn application_by_id(&self, app_id: u64) -> SwapResult<ApplicationInfo> {
        self.get(&format!("/v2/applications/{app_id}"), CallKind::Application).await
    }
}
