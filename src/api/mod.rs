//! API Module
//!
//! Chat types, the model catalog, and reply streaming.

pub mod chat;
pub mod models;
pub mod stream;

pub use chat::{ChatMessage, ChatRequest, GenerateOptions, Role, Transcript};
pub use models::ModelDescriptor;
pub use stream::{
    chunk_stream, fragment_stream, parse_line, LineAssembler, ReplyAccumulator, ReplyChunk,
};
