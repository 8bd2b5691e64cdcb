use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use spur_types::{RunStatusResponse, StartRunRequest, StartRunResponse};
use tracing::{debug, trace};

use crate::{client::ExecutionService, error::SdkError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:6080/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for a Spur workflow backend
pub struct SpurClient {
    base_url: String,
    api_token: Option<String>,
    http_client: reqwest::Client,
}

impl SpurClient {
    /// Create a client for the default local backend
    pub fn new() -> Result<Self, SdkError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, SdkError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SdkError::Network { source: e })?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            http_client,
        })
    }

    /// Set a custom base URL for the API
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.api_token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> Result<HeaderMap, SdkError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &self.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| SdkError::authentication("Invalid API token format"))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Start a workflow run
    pub async fn create_run(&self, request: &StartRunRequest) -> Result<StartRunResponse, SdkError> {
        if request.workflow_id.is_empty() {
            return Err(SdkError::invalid_request("workflow_id must be specified"));
        }

        let url = format!(
            "{}/wf/{}/start_run/",
            self.base_url, request.workflow_id
        );
        debug!("POST {} (run_type={})", url, request.run_mode.as_str());

        if tracing::enabled!(tracing::Level::TRACE) {
            if let Ok(json_str) = serde_json::to_string_pretty(request) {
                trace!("Start run request body:\n{}", json_str);
            }
        }

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers()?)
            .query(&[("run_type", request.run_mode.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| SdkError::Network { source: e })?;

        Self::decode(response).await
    }

    /// Fetch the status snapshot of a run
    pub async fn fetch_run_status(&self, run_id: &str) -> Result<RunStatusResponse, SdkError> {
        if run_id.is_empty() {
            return Err(SdkError::invalid_request("run_id must be specified"));
        }

        let url = format!("{}/run/{}/status/", self.base_url, run_id);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| SdkError::Network { source: e })?;

        Self::decode(response).await
    }

    /// Whether the backend answers its health endpoint
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health/", self.base_url);
        debug!("Checking backend status at: {}", url);

        match self.http_client.get(&url).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    debug!("Backend is responsive");
                    true
                } else {
                    debug!("Backend returned error status: {}", response.status());
                    false
                }
            }
            Err(e) => {
                debug!("Failed to connect to backend: {}", e);
                false
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SdkError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SdkError::Network { source: e })?;

        if !status.is_success() {
            let message = if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body
            };
            return Err(SdkError::from_status(status.as_u16(), message));
        }

        trace!("Response body: {}", body);
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ExecutionService for SpurClient {
    async fn start_run(&self, request: StartRunRequest) -> Result<StartRunResponse, SdkError> {
        self.create_run(&request).await
    }

    async fn get_run_status(&self, run_id: &str) -> Result<RunStatusResponse, SdkError> {
        self.fetch_run_status(run_id).await
    }

    fn service_name(&self) -> &str {
        "spur"
    }
}
