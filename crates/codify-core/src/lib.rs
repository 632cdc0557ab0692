pub mod ai;
pub mod config;
pub mod error;
pub mod exchange;
pub mod state;

// Re-export main types for convenience
pub use ai::{CompletionService, GeminiClient};
pub use config::Config;
pub use error::{ExchangeError, RemoteCallError};
pub use exchange::{ExchangeController, PendingRequest, Submission};
pub use state::{ChatEntry, ChatRole, Conversation};
