//! Client Module
//!
//! HTTP transport for the chat server.

pub mod http;

pub use http::HttpClient;
