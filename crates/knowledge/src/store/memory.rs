//! In-process document store.
//!
//! Mirrors the PostgREST backend closely enough to run the whole pipeline
//! without a database. Search filters by category and subject when they
//! are given, skips inactive chunks and ranks by a blend of cosine
//! similarity and normalized-token overlap. A chunk is scored against its
//! own text and against every alias pointing at it, keeping the best match.
//!
//! The store holds a single tenant, so `p_tenant` is not used for filtering.

use super::DocumentStore;
use crate::text::normalize_text;
use crate::types::{Alias, Chunk, ChunkUpdate, NewAlias, SearchHit, SearchParams};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use ward_core::AppResult;

const VECTOR_WEIGHT: f32 = 0.7;
const LEXICAL_WEIGHT: f32 = 0.3;

#[derive(Debug, Clone)]
struct StoredChunk {
    chunk: Chunk,
    normalized_text: String,
    embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone)]
struct StoredAlias {
    alias: Alias,
    embedding: Vec<f32>,
}

/// Document store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    chunks: RwLock<Vec<StoredChunk>>,
    aliases: RwLock<Vec<StoredAlias>>,
    next_alias_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk, optionally with its precomputed embedding.
    pub async fn insert_chunk(&self, chunk: Chunk, embedding: Option<Vec<f32>>) {
        let normalized_text = normalize_text(chunk.text_content.as_deref().unwrap_or(""));
        self.chunks.write().await.push(StoredChunk {
            chunk,
            normalized_text,
            embedding,
        });
    }

    fn to_alias(&self, id: String, alias: &NewAlias) -> Alias {
        Alias {
            id,
            document_id: alias.document_id.clone(),
            alias_text: alias.alias_text.clone(),
            normalized_alias: alias.normalized_alias.clone(),
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Share of query tokens that appear in the chunk text.
fn token_overlap(query: &str, text: &str) -> f32 {
    let query_tokens: HashSet<&str> = query.split_whitespace().collect();
    if query_tokens.is_empty() {
        return 0.0;
    }
    let text_tokens: HashSet<&str> = text.split_whitespace().collect();
    let shared = query_tokens.intersection(&text_tokens).count();
    shared as f32 / query_tokens.len() as f32
}

/// Blended score of one text and its embedding against the query.
fn score_text(params: &SearchParams, embedding: Option<&[f32]>, normalized: &str) -> f32 {
    let vector = embedding
        .map(|e| cosine(e, &params.p_query_embedding))
        .unwrap_or(0.0);
    let lexical = token_overlap(&params.p_query_format, normalized);
    VECTOR_WEIGHT * vector + LEXICAL_WEIGHT * lexical
}

fn matches_filter(value: Option<&str>, filter: Option<&str>) -> bool {
    match filter {
        Some(wanted) => value == Some(wanted),
        None => true,
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn list_chunks(&self) -> AppResult<Vec<Chunk>> {
        Ok(self
            .chunks
            .read()
            .await
            .iter()
            .map(|s| s.chunk.clone())
            .collect())
    }

    async fn update_chunk(&self, id: &str, update: ChunkUpdate) -> AppResult<Option<Chunk>> {
        let mut chunks = self.chunks.write().await;
        let Some(stored) = chunks.iter_mut().find(|s| s.chunk.id == id) else {
            return Ok(None);
        };

        stored.chunk.text_content = update.text_content;
        stored.chunk.category = update.category;
        stored.chunk.subject = update.subject;
        // A cleared normalized copy takes the chunk out of lexical matching
        stored.normalized_text = update.normalized_text.unwrap_or_default();

        Ok(Some(stored.chunk.clone()))
    }

    async fn list_aliases(&self) -> AppResult<Vec<Alias>> {
        Ok(self
            .aliases
            .read()
            .await
            .iter()
            .map(|s| s.alias.clone())
            .collect())
    }

    async fn create_alias(&self, alias: NewAlias) -> AppResult<Vec<Alias>> {
        let id = self.next_alias_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = self.to_alias(id.to_string(), &alias);
        self.aliases.write().await.push(StoredAlias {
            alias: created.clone(),
            embedding: alias.embedding,
        });
        Ok(vec![created])
    }

    async fn update_alias(&self, id: &str, alias: NewAlias) -> AppResult<Option<Alias>> {
        let mut aliases = self.aliases.write().await;
        let Some(stored) = aliases.iter_mut().find(|s| s.alias.id == id) else {
            return Ok(None);
        };

        stored.alias = self.to_alias(id.to_string(), &alias);
        stored.embedding = alias.embedding;
        Ok(Some(stored.alias.clone()))
    }

    async fn delete_alias(&self, id: &str) -> AppResult<bool> {
        let mut aliases = self.aliases.write().await;
        let before = aliases.len();
        aliases.retain(|s| s.alias.id != id);
        Ok(aliases.len() != before)
    }

    async fn search(&self, params: &SearchParams) -> AppResult<Vec<SearchHit>> {
        let chunks = self.chunks.read().await;
        let aliases = self.aliases.read().await;

        let mut scored: Vec<(f32, &StoredChunk)> = chunks
            .iter()
            .filter(|s| s.chunk.is_active != Some(false))
            .filter(|s| matches_filter(s.chunk.category.as_deref(), params.p_category.as_deref()))
            .filter(|s| matches_filter(s.chunk.subject.as_deref(), params.p_subject.as_deref()))
            .map(|s| {
                let own = score_text(params, s.embedding.as_deref(), &s.normalized_text);
                let best = aliases
                    .iter()
                    .filter(|a| a.alias.document_id.as_deref() == Some(s.chunk.id.as_str()))
                    .map(|a| {
                        score_text(params, Some(a.embedding.as_slice()), &a.alias.normalized_alias)
                    })
                    .fold(own, f32::max);
                (best, s)
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(params.p_limit as usize);

        Ok(scored
            .into_iter()
            .map(|(score, s)| {
                serde_json::json!({
                    "id": s.chunk.id,
                    "procedure_name": s.chunk.procedure_name,
                    "text_content": s.chunk.text_content,
                    "category": s.chunk.category,
                    "subject": s.chunk.subject,
                    "score": score,
                })
            })
            .collect())
    }
}
