//! reqwest-backed transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;

use super::{ApiRequest, RawResponse, Transport};
use crate::error::ApiError;

/// Content type the backend expects for write bodies
const POST_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

/// HTTP transport for the spreadsheet backends
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    /// Create a transport whose client-level timeout backs up the gateway's
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("siwaras/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let builder = match request {
            ApiRequest::Get { url, query } => self.http.get(url).query(&query),
            ApiRequest::Post { url, body } => self
                .http
                .post(url)
                .header(CONTENT_TYPE, POST_CONTENT_TYPE)
                .body(body),
        };

        let response = builder.send().await.map_err(ApiError::from)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(ApiError::from)?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport = HttpTransport::new(Duration::from_secs(30));
        assert!(transport.is_ok());
    }

    #[tokio::test]
    async fn test_get_sends_query_and_returns_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/exec")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("type".into(), "readAdmin".into()),
                mockito::Matcher::UrlEncoded("nama".into(), "Budi Santoso".into()),
            ]))
            .with_status(201)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .send(ApiRequest::Get {
                url: format!("{}/exec", server.url()),
                query: vec![
                    ("type".to_string(), "readAdmin".to_string()),
                    ("nama".to_string(), "Budi Santoso".to_string()),
                ],
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 201);
        assert_eq!(response.body, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_post_sends_text_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/exec")
            .match_header("content-type", POST_CONTENT_TYPE)
            .match_body(r#"{"type":"login","data":{}}"#)
            .with_status(200)
            .with_body(r#"{"ok":true,"result":null}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .send(ApiRequest::Post {
                url: format!("{}/exec", server.url()),
                body: r#"{"type":"login","data":{}}"#.to_string(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let err = transport
            .send(ApiRequest::Get {
                url: "http://127.0.0.1:9/exec".to_string(),
                query: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Network(_)));
    }
}
