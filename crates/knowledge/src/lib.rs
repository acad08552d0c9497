//! Question routing and retrieval for the ward assistant.
//!
//! Incoming questions are normalized to unaccented lowercase Vietnamese,
//! labelled with a `(category, subject)` pair by keyword scoring and then
//! answered by the document store's hybrid search.

pub mod chat;
pub mod classifier;
pub mod keywords;
pub mod store;
pub mod text;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chat::{AliasInput, ChatEvent, ChatReply, ChatService, ChunkInput};
pub use classifier::{
    classify, route, score, BucketScores, Category, Classification, RoutedQuery, Subject,
};
pub use store::{create_store, DocumentStore, MemoryStore, SupabaseStore};
pub use text::normalize_text;
pub use types::{Alias, Chunk, ChunkUpdate, NewAlias, SearchHit, SearchParams};
