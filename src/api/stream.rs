//! Reply Streaming
//!
//! Consumes the NDJSON reply stream produced by the chat endpoint. The
//! server emits one JSON record per line; a record may carry a `response`
//! field holding an incremental text delta, and the final record is marked
//! `done` with generation stats:
//!
//! ```text
//! {"model":"llama3.2","response":"Hello","done":false}
//! {"model":"llama3.2","response":" world","done":false}
//! {"model":"llama3.2","response":"","done":true,"prompt_eval_count":20,"eval_count":10}
//! ```
//!
//! Network chunks arrive at arbitrary byte boundaries, so lines (and
//! multi-byte characters) may be split across chunks. [`LineAssembler`]
//! buffers raw bytes and only hands out complete lines, which keeps both
//! cases intact. Lines that do not parse as a record are skipped; the
//! stream of fragments ends when the byte stream ends.

use crate::api::chat::ChatMessage;
use crate::error::{ChatError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// One decoded record from the reply stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyChunk {
    /// Incremental text delta, absent on pure status records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Set on the final record of a reply
    #[serde(default)]
    pub done: bool,

    /// Model that produced this record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Prompt token count (final record only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,

    /// Generated token count (final record only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl ReplyChunk {
    /// The text delta, if this record carries a non-empty one
    pub fn into_text(self) -> Option<String> {
        self.response.filter(|text| !text.is_empty())
    }
}

/// Buffers raw bytes across network chunks and yields complete lines.
///
/// Owned by one streaming call for its lifetime and discarded with it.
/// Splitting happens at the byte level, so a multi-byte character cut at a
/// chunk boundary is reassembled before UTF-8 conversion; invalid UTF-8 in
/// a *complete* line is a fatal decode error.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buf: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one network chunk
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pop the next complete line, with the trailing LF (and CR) removed
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(decode_line(line))
    }

    /// Drain a trailing unterminated line at end of stream
    pub fn finish(&mut self) -> Option<Result<String>> {
        if self.buf.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buf);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(decode_line(line))
    }
}

fn decode_line(line: Vec<u8>) -> Result<String> {
    String::from_utf8(line).map_err(|e| ChatError::Decode(format!("invalid UTF-8 in reply: {}", e)))
}

/// Parse one candidate line into a [`ReplyChunk`].
///
/// Empty lines and lines that are not a well-formed record return `None`;
/// they never abort the stream.
pub fn parse_line(line: &str) -> Option<ReplyChunk> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str(line) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            tracing::debug!(error = %e, line, "skipping malformed reply line");
            None
        }
    }
}

/// Parse a raw byte stream into a stream of [`ReplyChunk`]s.
///
/// Lazy, finite, and non-restartable: one network chunk is in flight at a
/// time, and the stream ends when the underlying byte stream ends. A byte
/// stream failure or a UTF-8 decode failure terminates the sequence with a
/// single error.
pub fn chunk_stream(
    byte_stream: impl Stream<Item = Result<Bytes>> + Send + 'static,
) -> Pin<Box<dyn Stream<Item = Result<ReplyChunk>> + Send>> {
    let s = async_stream::stream! {
        let mut assembler = LineAssembler::new();
        let mut bytes = std::pin::pin!(byte_stream);

        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            assembler.push(&chunk);
            while let Some(line) = assembler.next_line() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                if let Some(record) = parse_line(&line) {
                    yield Ok(record);
                }
            }
        }

        // The final record may arrive without a trailing newline
        if let Some(line) = assembler.finish() {
            match line {
                Ok(l) => {
                    if let Some(record) = parse_line(&l) {
                        yield Ok(record);
                    }
                }
                Err(e) => yield Err(e),
            }
        }
    };

    Box::pin(s)
}

/// Parse a raw byte stream into the ordered sequence of reply text
/// fragments.
///
/// Concatenating the fragments, in order, reproduces the full assistant
/// reply. End of stream is the completion signal; there is no terminal
/// marker.
pub fn fragment_stream(
    byte_stream: impl Stream<Item = Result<Bytes>> + Send + 'static,
) -> Pin<Box<dyn Stream<Item = Result<String>> + Send>> {
    Box::pin(chunk_stream(byte_stream).filter_map(|item| async move {
        match item {
            Ok(record) => record.into_text().map(Ok),
            Err(e) => Some(Err(e)),
        }
    }))
}

/// Accumulator for reply chunks
#[derive(Debug, Default)]
pub struct ReplyAccumulator {
    /// Accumulated reply text
    content: String,

    /// Model name from the stream
    model: Option<String>,

    /// Prompt token count from the final record
    prompt_eval_count: Option<u64>,

    /// Generated token count from the final record
    eval_count: Option<u64>,

    /// Whether the final record was seen
    done: bool,
}

impl ReplyAccumulator {
    /// Create a new accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the accumulated reply
    pub fn process_chunk(&mut self, chunk: &ReplyChunk) {
        if let Some(model) = &chunk.model {
            if self.model.is_none() {
                self.model = Some(model.clone());
            }
        }

        if let Some(text) = &chunk.response {
            self.content.push_str(text);
        }

        if chunk.done {
            self.done = true;
            if chunk.prompt_eval_count.is_some() {
                self.prompt_eval_count = chunk.prompt_eval_count;
            }
            if chunk.eval_count.is_some() {
                self.eval_count = chunk.eval_count;
            }
        }
    }

    /// Reply text accumulated so far
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the final record was seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Token counts from the final record, when reported
    pub fn token_counts(&self) -> (Option<u64>, Option<u64>) {
        (self.prompt_eval_count, self.eval_count)
    }

    /// Convert into the final assistant message
    pub fn into_message(self) -> ChatMessage {
        ChatMessage::assistant(self.content)
    }
}
