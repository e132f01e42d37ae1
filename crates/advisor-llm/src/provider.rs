//! Chat provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for chat-completion providers
///
/// Implementations of this trait provide access to a hosted chat-completion
/// service (e.g., Together AI or any OpenAI-compatible endpoint).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate a completion from the model
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages and parameters
    ///
    /// # Returns
    ///
    /// The completion response with the assistant's message and metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "together")
    fn name(&self) -> &str;
}
