//! Command handlers for the Ward Assistant CLI.

pub mod ask;
pub mod classify;
pub mod serve;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use classify::ClassifyCommand;
pub use serve::ServeCommand;
