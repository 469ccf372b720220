pub mod app;
pub mod client;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod credential;
pub mod error;
pub mod handler;
pub mod state;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use client::CompletionClient;
pub use config::{Config, Endpoint};
pub use conversation::{Conversation, Failure, Outcome};
pub use credential::ApiKey;
pub use error::ChatError;
pub use state::{ChatMessage, ChatRole};
