pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::RemoteCallError;

/// A remote service that turns one user message into one reply.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, message: &str) -> Result<String, RemoteCallError>;
}
