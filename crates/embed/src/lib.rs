//! Embedding integration crate for Ward Assistant.
//!
//! Provides a provider-agnostic abstraction over text embedding APIs.
//!
//! # Providers
//! - **OpenAI** (and any OpenAI-compatible `/embeddings` endpoint)
//! - **Hash**: deterministic offline embeddings for tests and local runs
//!
//! # Example
//! ```no_run
//! use ward_embed::{EmbeddingClient, providers::OpenAiEmbedder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiEmbedder::new("sk-...", "text-embedding-3-small", 1536)?;
//! let vector = client.embed("thủ tục đăng ký khai sinh").await?;
//! println!("{} dimensions", vector.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::EmbeddingClient;
pub use factory::create_client;
pub use providers::{HashEmbedder, OpenAiEmbedder};
pub use types::ProviderType;
