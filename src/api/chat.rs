//! Chat Types
//!
//! Messages, transcripts, and the streaming chat request body.

use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message in a chat conversation. Immutable once appended to a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "user" or "assistant"
    pub role: Role,

    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered, append-only sequence of messages for one session.
///
/// This is also the wire form of the session history endpoints:
/// `{ "messages": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Append an assistant message
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// All messages, in order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Last message, if any
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Generation parameters sent with a chat request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateOptions {
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus-sampling threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Top-k sampling cutoff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

/// Chat request body: conversation history plus generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model key from the server catalog
    pub model: String,

    /// Conversation history, oldest first
    pub messages: Vec<ChatMessage>,

    /// Always true for this client; the server streams NDJSON records
    pub stream: bool,

    /// Generation parameters, flattened into the body
    #[serde(flatten)]
    pub options: GenerateOptions,
}

impl ChatRequest {
    /// Create a request from a model key and the conversation so far
    pub fn new(model: impl Into<String>, transcript: &Transcript) -> Self {
        Self {
            model: model.into(),
            messages: transcript.messages().to_vec(),
            stream: true,
            options: GenerateOptions::default(),
        }
    }

    /// Set generation parameters
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_append_order() {
        let mut transcript = Transcript::new();
        transcript.push_user("hi");
        transcript.push_assistant("hello");
        transcript.push_user("how are you?");

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.messages()[0].role, Role::User);
        assert_eq!(transcript.messages()[1].role, Role::Assistant);
        assert_eq!(transcript.last().unwrap().content, "how are you?");
    }

    #[test]
    fn test_transcript_wire_format() {
        let mut transcript = Transcript::new();
        transcript.push_user("hi");

        let json = serde_json::to_value(&transcript).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");

        let back: Transcript = serde_json::from_value(json).unwrap();
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn test_chat_request_serialization() {
        let mut transcript = Transcript::new();
        transcript.push_user("hello");

        let request = ChatRequest::new("llama3.2", &transcript).with_options(
            GenerateOptions::new()
                .with_temperature(0.7)
                .with_max_tokens(256)
                .with_top_p(0.9)
                .with_top_k(40),
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], true);
        // Options are flattened into the body, not nested
        assert_eq!(json["max_tokens"], 256);
        assert_eq!(json["top_k"], 40);
        assert!(json.get("options").is_none());
    }

    #[test]
    fn test_unset_options_are_omitted() {
        let request = ChatRequest::new("llama3.2", &Transcript::new());
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
    }
}
