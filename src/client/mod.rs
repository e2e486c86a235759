//! Remote API access: transport, request coalescing and the gateway

use async_trait::async_trait;

use crate::error::ApiError;

pub mod coalesce;
pub mod endpoints;
pub mod envelope;
pub mod gateway;
pub mod http;
#[cfg(test)]
pub mod mock;

pub use gateway::{ApiGateway, BaseUrls};
pub use http::HttpTransport;
#[cfg(test)]
pub use mock::MockTransport;

/// A fully composed request for one backend
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    /// Read: everything travels in the query string
    Get {
        url: String,
        query: Vec<(String, String)>,
    },
    /// Write: `{"type": ..., "data": ...}` as a text body
    Post { url: String, body: String },
}

impl ApiRequest {
    #[cfg(test)]
    pub fn url(&self) -> &str {
        match self {
            ApiRequest::Get { url, .. } | ApiRequest::Post { url, .. } => url,
        }
    }
}

/// Status and body of an HTTP exchange, before envelope parsing
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One HTTP exchange with a backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response.
    ///
    /// Connection-level failures are `ApiError::Network`; a non-2xx status is
    /// not an error at this level.
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError>;
}
