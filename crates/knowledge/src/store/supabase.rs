//! PostgREST (Supabase) document store.
//!
//! Tables are reached through `/rest/v1/{table}`, stored procedures through
//! `/rest/v1/rpc/{function}`. Row filters use PostgREST operators
//! (`id=eq.<id>`), and writes ask for the affected rows back with
//! `Prefer: return=representation` so "not found" can be told apart from
//! success.

use super::DocumentStore;
use crate::types::{
    Alias, Chunk, ChunkUpdate, NewAlias, SearchHit, SearchParams, ALIAS_COLUMNS, CHUNK_COLUMNS,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use ward_core::{AppError, AppResult};

const DOCUMENTS_TABLE: &str = "documents";
const ALIAS_TABLE: &str = "alias";

/// Document store backed by a PostgREST endpoint.
#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    /// `{project_url}/rest/v1`
    rest_url: String,
    key: String,
    search_function: String,
}

impl std::fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("rest_url", &self.rest_url)
            .field("search_function", &self.search_function)
            .finish_non_exhaustive()
    }
}

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
    #[serde(default)]
    hint: Option<String>,
}

impl SupabaseStore {
    /// Create a store for the project at `url` authenticated with `key`.
    pub fn new(
        url: &str,
        key: impl Into<String>,
        search_function: &str,
        timeout_secs: u64,
    ) -> AppResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(AppError::Config("Store key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Store(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            key,
            search_function: search_function.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, path))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    /// Request that returns the affected rows.
    fn write(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, table)
            .header("Prefer", "return=representation")
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> AppResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Store(format!("Failed to {}: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = match serde_json::from_str::<PostgrestError>(&error_text) {
                Ok(PostgrestError {
                    message,
                    hint: Some(hint),
                }) => format!("{} ({})", message, hint),
                Ok(err) => err.message,
                Err(_) => error_text,
            };
            return Err(AppError::Store(format!(
                "Failed to {} ({}): {}",
                what, status, message
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Store(format!("Failed to parse response to {}: {}", what, e)))
    }
}

#[async_trait::async_trait]
impl DocumentStore for SupabaseStore {
    fn backend_name(&self) -> &str {
        "supabase"
    }

    #[instrument(skip(self))]
    async fn list_chunks(&self) -> AppResult<Vec<Chunk>> {
        let builder = self
            .request(Method::GET, DOCUMENTS_TABLE)
            .query(&[("select", CHUNK_COLUMNS)]);
        let chunks: Vec<Chunk> = self.send(builder, "list chunks").await?;
        debug!("Fetched {} chunks", chunks.len());
        Ok(chunks)
    }

    #[instrument(skip(self, update))]
    async fn update_chunk(&self, id: &str, update: ChunkUpdate) -> AppResult<Option<Chunk>> {
        let builder = self
            .write(Method::PATCH, DOCUMENTS_TABLE)
            .query(&[("id", format!("eq.{}", id)), ("select", CHUNK_COLUMNS.to_string())])
            .json(&update);
        let rows: Vec<Chunk> = self.send(builder, "update chunk").await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn list_aliases(&self) -> AppResult<Vec<Alias>> {
        let builder = self
            .request(Method::GET, ALIAS_TABLE)
            .query(&[("select", ALIAS_COLUMNS)]);
        let aliases: Vec<Alias> = self.send(builder, "list aliases").await?;
        debug!("Fetched {} aliases", aliases.len());
        Ok(aliases)
    }

    #[instrument(skip(self, alias), fields(alias_text = %alias.alias_text))]
    async fn create_alias(&self, alias: NewAlias) -> AppResult<Vec<Alias>> {
        let builder = self
            .write(Method::POST, ALIAS_TABLE)
            .query(&[("select", ALIAS_COLUMNS)])
            .json(&alias);
        self.send(builder, "create alias").await
    }

    #[instrument(skip(self, alias))]
    async fn update_alias(&self, id: &str, alias: NewAlias) -> AppResult<Option<Alias>> {
        let builder = self
            .write(Method::PATCH, ALIAS_TABLE)
            .query(&[("id", format!("eq.{}", id)), ("select", ALIAS_COLUMNS.to_string())])
            .json(&alias);
        let rows: Vec<Alias> = self.send(builder, "update alias").await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn delete_alias(&self, id: &str) -> AppResult<bool> {
        let builder = self
            .write(Method::DELETE, ALIAS_TABLE)
            .query(&[("id", format!("eq.{}", id)), ("select", "id".to_string())]);
        let rows: Vec<serde_json::Value> = self.send(builder, "delete alias").await?;
        Ok(!rows.is_empty())
    }

    #[instrument(skip(self, params), fields(
        function = %self.search_function,
        tenant = %params.p_tenant,
        limit = params.p_limit
    ))]
    async fn search(&self, params: &SearchParams) -> AppResult<Vec<SearchHit>> {
        let path = format!("rpc/{}", self.search_function);
        let builder = self.request(Method::POST, &path).json(params);
        let hits: Vec<SearchHit> = self.send(builder, "run search").await?;
        debug!("Search returned {} rows", hits.len());
        Ok(hits)
    }
}
