//! HTTP client for the routing service

use super::{
    ApprovalResponse, CheckStatusRequest, CreateTransactionRequest, CreateTransactionResponse,
    FailureReport, StatusResponse, SwapApi,
};
use crate::config::ApiConfig;
use crate::error::{ExecutorError, ExecutorResult};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpSwapApi {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpSwapApi {
    pub fn new(config: &ApiConfig) -> ExecutorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ExecutorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> ExecutorResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Routing API {} error: {} - {}", endpoint, status, body);
            return Err(ExecutorError::Api(format!("{}: HTTP {}: {}", endpoint, status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| ExecutorError::Api(format!("{}: failed to parse response: {}", endpoint, e)))
    }
}

#[async_trait]
impl SwapApi for HttpSwapApi {
    async fn create_step_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> ExecutorResult<CreateTransactionResponse> {
        debug!(request_id = %request.request_id, step = request.step, "POST /tx/create");

        let response = self
            .client
            .post(self.url("/tx/create"))
            .query(&[("apiKey", &self.api_key)])
            .json(request)
            .send()
            .await?;

        self.read_json("create transaction", response).await
    }

    async fn is_approved(&self, request_id: &str, tx_id: &str) -> ExecutorResult<ApprovalResponse> {
        debug!(request_id, tx_id, "GET /tx/check-approval");

        let response = self
            .client
            .get(self.url(&format!("/tx/{}/check-approval", request_id)))
            .query(&[("apiKey", self.api_key.as_str()), ("txId", tx_id)])
            .send()
            .await?;

        self.read_json("check approval", response).await
    }

    async fn check_status(&self, request: &CheckStatusRequest) -> ExecutorResult<StatusResponse> {
        debug!(
            request_id = %request.request_id,
            step = request.step,
            tx_id = %request.tx_id,
            "POST /tx/check-status"
        );

        let response = self
            .client
            .post(self.url("/tx/check-status"))
            .query(&[("apiKey", &self.api_key)])
            .json(request)
            .send()
            .await?;

        self.read_json("check status", response).await
    }

    async fn report_failure(&self, report: &FailureReport) -> ExecutorResult<()> {
        debug!(
            request_id = %report.request_id,
            event_type = report.event_type.as_str(),
            "POST /tx/report-tx"
        );

        let response = self
            .client
            .post(self.url("/tx/report-tx"))
            .query(&[("apiKey", &self.api_key)])
            .json(report)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExecutorError::Api(format!(
                "report failure: HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}
