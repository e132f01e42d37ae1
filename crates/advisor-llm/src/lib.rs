//! Chat-completion client layer for the stock advisor
//!
//! This crate provides the types and provider abstraction for talking to a
//! hosted chat-completion endpoint. It includes:
//!
//! - Message types for the conversation wire format
//! - Completion request/response types
//! - Provider trait for chat-completion implementations
//! - A Together AI provider (OpenAI-compatible wire format)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{CompletionError, Result};
pub use messages::{Message, Role};
pub use provider::ChatProvider;
pub use providers::{TogetherConfig, TogetherProvider};
