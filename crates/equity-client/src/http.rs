//! JSON-over-HTTP transport to the simulation service.

use crate::estimator::{EquityEstimator, RemoteError};
use async_trait::async_trait;
use equity_core::AppInfo;
use equity_core::game::request::{EquityRequest, EquityResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{Level, event};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_SIMULATION_PATH: &str = "/api/simulation";
const DEFAULT_HEALTH_PATH: &str = "/api/health";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub simulation_path: String,
    pub health_path: String,
    pub timeout_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            simulation_path: DEFAULT_SIMULATION_PATH.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl EndpointConfig {
    pub fn simulation_url(&self) -> String {
        join_url(&self.base_url, &self.simulation_path)
    }

    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_path)
    }
}

pub struct HttpEstimator {
    client: reqwest::Client,
    simulation_url: String,
    health_url: String,
}

impl HttpEstimator {
    pub fn new(config: &EndpointConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(AppInfo::user_agent())
            .build()
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            simulation_url: config.simulation_url(),
            health_url: config.health_url(),
        })
    }

    pub fn simulation_url(&self) -> &str {
        &self.simulation_url
    }

    /// Succeeds when the service answers its health endpoint with a 2xx status.
    pub async fn health(&self) -> Result<(), RemoteError> {
        let response = self
            .client
            .get(&self.health_url)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        event!(
            target: "equity_client::http",
            Level::DEBUG,
            url = %self.health_url,
            "health check passed"
        );
        Ok(())
    }
}

#[async_trait]
impl EquityEstimator for HttpEstimator {
    async fn estimate_equity(&self, request: EquityRequest) -> Result<EquityResult, RemoteError> {
        request
            .validate()
            .map_err(|err| RemoteError::InvalidRequest(err.to_string()))?;

        let response = self
            .client
            .post(&self.simulation_url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            event!(
                target: "equity_client::http",
                Level::WARN,
                url = %self.simulation_url,
                status = status.as_u16(),
                "simulation request rejected"
            );
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice::<EquityResult>(&body)
            .map_err(|err| RemoteError::Malformed(err.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout
    } else if err.is_decode() {
        RemoteError::Malformed(err.to_string())
    } else {
        RemoteError::Transport(err.to_string())
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
