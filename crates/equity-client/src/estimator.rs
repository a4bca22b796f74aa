use async_trait::async_trait;
use equity_core::game::request::{EquityRequest, EquityResult};
use thiserror::Error;

/// Remote equity engine.
#[async_trait]
pub trait EquityEstimator: Send + Sync {
    async fn estimate_equity(&self, request: EquityRequest) -> Result<EquityResult, RemoteError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("service responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("request rejected before dispatch: {0}")]
    InvalidRequest(String),
}
