//! yapper - Streaming chat client for local LLM servers
//!
//! Talks to a chat server that streams replies as newline-delimited JSON
//! records. [`ChatClient`] covers the wire surface: the model catalog,
//! session-scoped history, and the streaming chat endpoint itself;
//! [`session::Controller`] carries the chat state for interactive front
//! ends.
//!
//! ```no_run
//! use yapper::{ChatClient, ChatRequest, Transcript};
//! use futures::StreamExt;
//!
//! # async fn run() -> yapper::Result<()> {
//! let client = ChatClient::new()?;
//!
//! let mut transcript = Transcript::new();
//! transcript.push_user("Why is the sky blue?");
//!
//! let mut fragments = client.send(&ChatRequest::new("llama3.2", &transcript)).await?;
//! while let Some(fragment) = fragments.next().await {
//!     print!("{}", fragment?);
//! }
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod render;
pub mod session;

pub use api::{
    ChatMessage, ChatRequest, GenerateOptions, ModelDescriptor, ReplyChunk, Role, Transcript,
};
pub use config::Settings;
pub use error::{ChatError, Result};

use api::stream::{chunk_stream, fragment_stream, ReplyAccumulator};
use client::HttpClient;
use config::ConfigLoader;

/// The chat server client
pub struct ChatClient {
    settings: Settings,
    http: HttpClient,
}

impl ChatClient {
    /// Create a client from the default configuration sources
    pub fn new() -> Result<Self> {
        Self::with_settings(ConfigLoader::new()?.into_settings())
    }

    /// Create a client from a specific config file
    pub fn from_config_path(path: &str) -> Result<Self> {
        Self::with_settings(ConfigLoader::from_path(path)?.into_settings())
    }

    /// Create a client from explicit settings
    pub fn with_settings(settings: Settings) -> Result<Self> {
        let http = HttpClient::new(settings.connect_timeout(), settings.request_timeout())?;
        Ok(Self { settings, http })
    }

    /// The settings this client was built with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetch the model catalog
    pub async fn models(&self) -> Result<Vec<ModelDescriptor>> {
        let url = format!("{}/api/models", self.settings.base());
        self.http.get_json(&url).await
    }

    /// Fetch one model descriptor by key
    pub async fn model(&self, key: &str) -> Result<ModelDescriptor> {
        self.models()
            .await?
            .into_iter()
            .find(|m| m.key == key)
            .ok_or_else(|| ChatError::ModelNotFound(key.to_string()))
    }

    /// Fetch the server-side transcript for a session
    pub async fn history(&self, session: &str) -> Result<Transcript> {
        let url = self.history_url(session);
        self.http.get_json(&url).await
    }

    /// Replace the server-side transcript for a session
    pub async fn push_history(&self, session: &str, transcript: &Transcript) -> Result<()> {
        let url = self.history_url(session);
        // The endpoint replies with an empty JSON object
        let _: serde_json::Value = self.http.post_json(&url, transcript).await?;
        Ok(())
    }

    /// Send a chat request and stream the reply as text fragments.
    ///
    /// The sequence is lazy, finite, and non-restartable: fragments arrive
    /// in reply order and the stream ends when the server closes the reply.
    /// A failed request (connect error, non-success status) surfaces here
    /// as a single error and no fragment is ever produced.
    pub async fn send(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<String>> + Send>>> {
        Ok(fragment_stream(self.send_raw(request).await?))
    }

    /// Send a chat request and collect the whole reply into one message
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatMessage> {
        let mut chunks = chunk_stream(self.send_raw(request).await?);
        let mut accumulator = ReplyAccumulator::new();

        while let Some(chunk) = chunks.next().await {
            accumulator.process_chunk(&chunk?);
        }

        let (prompt_tokens, reply_tokens) = accumulator.token_counts();
        tracing::debug!(?prompt_tokens, ?reply_tokens, "reply complete");
        Ok(accumulator.into_message())
    }

    async fn send_raw(
        &self,
        request: &ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>> {
        let url = format!("{}/api/chat", self.settings.base());
        tracing::info!(model = %request.model, messages = request.messages.len(), "sending chat request");
        self.http.post_stream(&url, request).await
    }

    fn history_url(&self, session: &str) -> String {
        format!("{}/api/sessions/{}/history", self.settings.base(), session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::Server) -> ChatClient {
        ChatClient::with_settings(Settings {
            base_url: server.url(),
            ..Default::default()
        })
        .unwrap()
    }

    const CATALOG: &str = r#"[{
        "key": "llama3.2",
        "name": "Llama 3.2",
        "description": "",
        "contextWindow": 8192,
        "maxTokensDefault": 512,
        "maxTokensMax": 4096,
        "temperatureMin": 0.0,
        "temperatureMax": 2.0,
        "temperatureDefault": 0.8,
        "topPMin": 0.1,
        "topPMax": 1.0,
        "topPDefault": 0.9,
        "topKMin": 1,
        "topKMax": 100,
        "topKDefault": 40
    }]"#;

    #[tokio::test]
    async fn test_models_fetches_catalog() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/models")
            .with_header("content-type", "application/json")
            .with_body(CATALOG)
            .create_async()
            .await;

        let client = client_for(&server);
        let models = client.models().await.unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].key, "llama3.2");

        let model = client.model("llama3.2").await.unwrap();
        assert_eq!(model.max_tokens_max, 4096);

        let missing = client.model("gpt-izza").await.unwrap_err();
        assert!(matches!(missing, ChatError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn test_history_round_trip() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/sessions/rust-help/history")
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages":[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]}"#)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/api/sessions/rust-help/history")
            .match_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&server);
        let transcript = client.history("rust-help").await.unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[1].role, Role::Assistant);

        client.push_history("rust-help", &transcript).await.unwrap();
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_streams_fragments_in_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_header("content-type", "application/x-ndjson")
            .with_body(concat!(
                "{\"model\":\"llama3.2\",\"response\":\"Hello\",\"done\":false}\n",
                "{\"response\":\" world\",\"done\":false}\n",
                "{\"response\":\"\",\"done\":true,\"prompt_eval_count\":7,\"eval_count\":2}\n",
            ))
            .create_async()
            .await;

        let client = client_for(&server);
        let request = ChatRequest::new("llama3.2", &Transcript::new());

        let fragments: Vec<String> = client
            .send(&request)
            .await
            .unwrap()
            .map(|f| f.unwrap())
            .collect()
            .await;

        assert_eq!(fragments, vec!["Hello", " world"]);
    }

    #[tokio::test]
    async fn test_send_surfaces_one_error_before_any_fragment() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(503)
            .with_body("model is loading")
            .create_async()
            .await;

        let client = client_for(&server);
        let request = ChatRequest::new("llama3.2", &Transcript::new());

        let err = client.send(&request).await.unwrap_err();
        assert!(matches!(err, ChatError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_complete_accumulates_reply() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_body(concat!(
                "{\"response\":\"To\",\"done\":false}\n",
                "not a record\n",
                "{\"response\":\"gether\",\"done\":true}\n",
            ))
            .create_async()
            .await;

        let client = client_for(&server);
        let message = client
            .complete(&ChatRequest::new("llama3.2", &Transcript::new()))
            .await
            .unwrap();

        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "Together");
    }
}
