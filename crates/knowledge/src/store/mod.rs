//! Document store abstraction.
//!
//! The store owns chunks, aliases and the hybrid search procedure. The
//! production backend is a PostgREST (Supabase) project; the in-memory
//! backend serves tests and offline runs.

pub mod memory;
pub mod supabase;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use crate::types::{Alias, Chunk, ChunkUpdate, NewAlias, SearchHit, SearchParams};
use std::sync::Arc;
use ward_core::{AppConfig, AppError, AppResult};

/// Trait for document store backends.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Backend name (e.g. "supabase", "memory")
    fn backend_name(&self) -> &str;

    async fn list_chunks(&self) -> AppResult<Vec<Chunk>>;

    /// Returns `None` when no chunk has this id.
    async fn update_chunk(&self, id: &str, update: ChunkUpdate) -> AppResult<Option<Chunk>>;

    async fn list_aliases(&self) -> AppResult<Vec<Alias>>;

    /// Returns the inserted rows.
    async fn create_alias(&self, alias: NewAlias) -> AppResult<Vec<Alias>>;

    /// Returns `None` when no alias has this id.
    async fn update_alias(&self, id: &str, alias: NewAlias) -> AppResult<Option<Alias>>;

    /// Returns `false` when no alias has this id.
    async fn delete_alias(&self, id: &str) -> AppResult<bool>;

    /// Run the hybrid (lexical + vector) search procedure.
    async fn search(&self, params: &SearchParams) -> AppResult<Vec<SearchHit>>;
}

/// Create the document store selected in configuration.
pub fn create_store(config: &AppConfig) -> AppResult<Arc<dyn DocumentStore>> {
    match config.store.backend.as_str() {
        "supabase" => {
            let url = config.store.url.as_deref().ok_or_else(|| {
                AppError::Config("Store URL not set (store.url or SUPABASE_URL)".to_string())
            })?;
            let key = config.store_key().ok_or_else(|| {
                AppError::Config(format!(
                    "Store key not found in environment variable: {}",
                    config.store.key_env
                ))
            })?;
            let store = SupabaseStore::new(
                url,
                key,
                &config.store.search_function,
                config.store.timeout_secs,
            )?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(AppError::Config(format!(
            "Unknown store backend: '{}'. Supported backends: supabase, memory",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_memory_store() {
        let mut config = AppConfig::default();
        config.store.backend = "memory".to_string();
        let store = create_store(&config).unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[test]
    fn test_supabase_requires_url() {
        let mut config = AppConfig::default();
        config.store.url = None;
        let err = create_store(&config).unwrap_err();
        assert!(err.to_string().contains("Store URL"));
    }

    #[test]
    fn test_unknown_backend() {
        let mut config = AppConfig::default();
        config.store.backend = "sqlite".to_string();
        assert!(create_store(&config).is_err());
    }
}
