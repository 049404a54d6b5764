//! HTTP Client
//!
//! Thin async transport over `reqwest`: JSON round trips for the catalog
//! and history endpoints, and a streaming POST for chat replies. Transport
//! failures surface exactly once, before any reply byte is handed to the
//! stream consumer. No retries at this layer.

use crate::error::{ChatError, Result};
use bytes::Bytes;
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::pin::Pin;
use std::time::Duration;

/// HTTP client for the chat server
pub struct HttpClient {
    /// Inner reqwest client
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the given timeouts
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ChatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET a JSON resource
    pub async fn get_json<R>(&self, url: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        tracing::debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        Self::read_json(response).await
    }

    /// POST a JSON body and parse a JSON reply
    pub async fn post_json<T, R>(&self, url: &str, body: &T) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        tracing::debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .headers(json_headers())
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// POST a JSON body and return the raw reply byte stream.
    ///
    /// The response status is checked here, so a failed request yields a
    /// single error and the returned stream is never constructed.
    pub async fn post_stream(
        &self,
        url: &str,
        body: &impl Serialize,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>> {
        use async_stream::stream;
        use futures::StreamExt;

        tracing::debug!(url, "POST (streaming)");
        let response = self
            .client
            .post(url)
            .headers(json_headers())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // Convert to our stream type
        let mut byte_stream = response.bytes_stream();
        let s = stream! {
            while let Some(chunk) = byte_stream.next().await {
                yield chunk.map_err(ChatError::from);
            }
        };

        Ok(Box::pin(s))
    }

    async fn read_json<R>(response: reqwest::Response) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ChatError::Response(format!(
                "Failed to parse response: {}. Body: {}",
                e,
                &body[..body.len().min(500)]
            ))
        })
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new(Duration::from_secs(10), Duration::from_secs(300));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_get_json_surfaces_status_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/models")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = HttpClient::new(Duration::from_secs(5), Duration::from_secs(5)).unwrap();
        let result: Result<serde_json::Value> =
            client.get_json(&format!("{}/api/models", server.url())).await;

        mock.assert_async().await;
        match result {
            Err(ChatError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_stream_fails_fast_on_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(404)
            .with_body("no such model")
            .create_async()
            .await;

        let client = HttpClient::new(Duration::from_secs(5), Duration::from_secs(5)).unwrap();
        let result = client
            .post_stream(&format!("{}/api/chat", server.url()), &serde_json::json!({}))
            .await;

        assert!(matches!(result, Err(ChatError::Status { status: 404, .. })));
    }
}
