//! Chat pipeline.
//!
//! A message is trimmed, normalized and classified, then the raw message is
//! embedded and the store's hybrid search is called with the label as
//! filter. The same service also owns alias and chunk edits, since both
//! need the normalizer and the embedder.

use crate::classifier::{route, Category, RoutedQuery};
use crate::store::{create_store, DocumentStore};
use crate::text::normalize_text;
use crate::types::{Alias, Chunk, ChunkUpdate, NewAlias, SearchHit, SearchParams};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::instrument;
use ward_core::config::DEFAULT_TENANT;
use ward_core::{AppConfig, AppError, AppResult};
use ward_embed::{create_client, EmbeddingClient};

/// Number of ranked rows requested when none is configured.
pub const DEFAULT_LIMIT: u32 = 5;

/// Result of a non-streaming chat turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub replies: Vec<SearchHit>,
    pub message: String,
    pub log_data: String,
    pub timestamp: DateTime<Utc>,
}

/// One server-sent event of a streaming chat turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatEvent {
    Log(String),
    Replies(Vec<SearchHit>),
    Error(String),
}

impl ChatEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ChatEvent::Log(_))
    }
}

/// Alias payload accepted on create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AliasInput {
    #[serde(default, deserialize_with = "crate::types::opt_string_or_number")]
    pub document_id: Option<String>,
    #[serde(default)]
    pub alias_text: Option<String>,
}

/// Chunk payload accepted on update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkInput {
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

/// Query routing and retrieval over a document store.
#[derive(Debug, Clone)]
pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingClient>,
    tenant: String,
    limit: u32,
}

impl ChatService {
    pub fn new(store: Arc<dyn DocumentStore>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            store,
            embedder,
            tenant: DEFAULT_TENANT.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Build the store and embedder selected in configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let store = create_store(config)?;
        let api_key = config.embedding_api_key();
        let embedder = create_client(&config.embedding, api_key.as_deref())?;

        tracing::info!(
            "Chat service ready: store={}, embeddings={}/{}",
            store.backend_name(),
            embedder.provider_name(),
            embedder.model_name()
        );

        Ok(Self::new(store, embedder)
            .with_tenant(config.store.tenant.clone())
            .with_limit(config.store.search_limit))
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingClient> {
        &self.embedder
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Answer a message with ranked rows from the store.
    #[instrument(skip(self), fields(tenant = %self.tenant))]
    pub async fn answer(&self, message: &str) -> AppResult<ChatReply> {
        let message = require_message(message)?;
        let routed = route(message);
        tracing::info!("Query: {} => {}", message, routed.classification);

        let replies = self.retrieve(message, &routed).await?;

        Ok(ChatReply {
            replies,
            message: message.to_string(),
            log_data: format!("Query: {}\n=> {}", message, routed.classification),
            timestamp: Utc::now(),
        })
    }

    /// Answer a message as a sequence of progress events.
    ///
    /// The stream always ends with either `Replies` or `Error`.
    pub fn stream(self: Arc<Self>, message: String) -> BoxStream<'static, ChatEvent> {
        let (tx, rx) = mpsc::channel(8);

        tokio::spawn(async move {
            if let Err(e) = self.run_stream(&message, &tx).await {
                tracing::warn!("Chat stream failed: {}", e);
                let _ = tx.send(ChatEvent::Error(e.to_string())).await;
            }
        });

        Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        }))
    }

    async fn run_stream(&self, message: &str, tx: &mpsc::Sender<ChatEvent>) -> AppResult<()> {
        send(tx, ChatEvent::Log("Received message".to_string())).await;
        let message = require_message(message)?;

        let routed = route(message);
        send(tx, ChatEvent::Log(format!("Normalized: {}", routed.normalized))).await;
        send(tx, ChatEvent::Log(routed.classification.to_string())).await;

        let replies = self.retrieve(message, &routed).await?;
        send(tx, ChatEvent::Replies(replies)).await;
        Ok(())
    }

    async fn retrieve(&self, message: &str, routed: &RoutedQuery) -> AppResult<Vec<SearchHit>> {
        let embedding = self.embedder.embed(message).await?;

        let params = SearchParams {
            p_query_format: routed.normalized.clone(),
            p_query_embedding: embedding,
            p_tenant: self.tenant.clone(),
            p_category: routed.classification.category.map(|c| c.as_str().to_string()),
            p_subject: routed.classification.subject.map(|s| s.as_str().to_string()),
            p_limit: self.limit,
        };

        let hits = self.store.search(&params).await?;
        tracing::debug!("Search returned {} rows", hits.len());
        Ok(hits)
    }

    pub async fn list_chunks(&self) -> AppResult<Vec<Chunk>> {
        self.store.list_chunks().await
    }

    pub async fn list_aliases(&self) -> AppResult<Vec<Alias>> {
        self.store.list_aliases().await
    }

    /// Store a new alias with its embedding and normalized form.
    pub async fn create_alias(&self, input: AliasInput) -> AppResult<Vec<Alias>> {
        let alias = self.prepare_alias(input).await?;
        self.store.create_alias(alias).await
    }

    pub async fn update_alias(&self, id: &str, input: AliasInput) -> AppResult<Alias> {
        let alias = self.prepare_alias(input).await?;
        self.store
            .update_alias(id, alias)
            .await?
            .ok_or_else(|| AppError::NotFound("Alias not found".to_string()))
    }

    pub async fn delete_alias(&self, id: &str) -> AppResult<()> {
        if self.store.delete_alias(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Alias not found".to_string()))
        }
    }

    /// Replace a chunk's text and labels.
    ///
    /// Only ward-information chunks carry a normalized copy of their text;
    /// for every other category `normalized_text` is cleared.
    pub async fn update_chunk(&self, id: &str, input: ChunkInput) -> AppResult<Chunk> {
        let input = ChunkInput {
            category: input.category.filter(|c| !c.is_empty()),
            subject: input.subject.filter(|s| !s.is_empty()),
            ..input
        };

        let normalized_text = match (&input.category, &input.text_content) {
            (Some(category), Some(text)) if category == Category::ThongTinPhuong.as_str() => {
                Some(normalize_text(text))
            }
            _ => None,
        };

        let update = ChunkUpdate {
            text_content: input.text_content,
            normalized_text,
            category: input.category,
            subject: input.subject,
        };

        self.store
            .update_chunk(id, update)
            .await?
            .ok_or_else(|| AppError::NotFound("Chunk not found".to_string()))
    }

    async fn prepare_alias(&self, input: AliasInput) -> AppResult<NewAlias> {
        let alias_text = input
            .alias_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Validation("alias_text is required".to_string()))?;

        let embedding = self.embedder.embed(&alias_text).await?;

        Ok(NewAlias {
            document_id: input.document_id,
            normalized_alias: normalize_text(&alias_text),
            alias_text,
            embedding,
        })
    }
}

fn require_message(message: &str) -> AppResult<&str> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }
    Ok(message)
}

async fn send(tx: &mpsc::Sender<ChatEvent>, event: ChatEvent) {
    if tx.send(event).await.is_err() {
        tracing::debug!("Chat stream receiver dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use futures::StreamExt;
    use ward_embed::HashEmbedder;

    fn service() -> ChatService {
        ChatService::new(Arc::new(MemoryStore::new()), Arc::new(HashEmbedder::new(64)))
    }

    /// Store that keeps every chunk update it receives.
    #[derive(Debug, Default)]
    struct RecordingStore {
        updates: std::sync::Mutex<Vec<ChunkUpdate>>,
    }

    impl RecordingStore {
        fn last_update(&self) -> ChunkUpdate {
            self.updates.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl DocumentStore for RecordingStore {
        fn backend_name(&self) -> &str {
            "recording"
        }

        async fn list_chunks(&self) -> AppResult<Vec<Chunk>> {
            Ok(Vec::new())
        }

        async fn update_chunk(&self, id: &str, update: ChunkUpdate) -> AppResult<Option<Chunk>> {
            self.updates.lock().unwrap().push(update.clone());
            Ok(Some(Chunk {
                id: id.to_string(),
                procedure_name: None,
                text_content: update.text_content,
                category: update.category,
                subject: update.subject,
                is_active: Some(true),
                effective_date: None,
            }))
        }

        async fn list_aliases(&self) -> AppResult<Vec<Alias>> {
            Ok(Vec::new())
        }

        async fn create_alias(&self, _alias: NewAlias) -> AppResult<Vec<Alias>> {
            Ok(Vec::new())
        }

        async fn update_alias(&self, _id: &str, _alias: NewAlias) -> AppResult<Option<Alias>> {
            Ok(None)
        }

        async fn delete_alias(&self, _id: &str) -> AppResult<bool> {
            Ok(false)
        }

        async fn search(&self, _params: &SearchParams) -> AppResult<Vec<SearchHit>> {
            Ok(Vec::new())
        }
    }

    fn recording_service() -> (Arc<RecordingStore>, ChatService) {
        let store = Arc::new(RecordingStore::default());
        let svc = ChatService::new(store.clone(), Arc::new(HashEmbedder::new(16)));
        (store, svc)
    }

    #[tokio::test]
    async fn test_update_chunk_normalizes_ward_information() {
        let (store, svc) = recording_service();
        let text = "Giờ làm việc: Thứ 2 - Thứ 6, 7h30";

        svc.update_chunk(
            "5",
            ChunkInput {
                text_content: Some(text.to_string()),
                category: Some("thong_tin_phuong".to_string()),
                subject: Some("lich_lam_viec".to_string()),
            },
        )
        .await
        .unwrap();

        let update = store.last_update();
        assert_eq!(update.normalized_text, Some(normalize_text(text)));
        assert_eq!(update.category.as_deref(), Some("thong_tin_phuong"));
        assert_eq!(update.subject.as_deref(), Some("lich_lam_viec"));
    }

    #[tokio::test]
    async fn test_update_chunk_clears_normalized_text_for_procedures() {
        let (store, svc) = recording_service();

        svc.update_chunk(
            "6",
            ChunkInput {
                text_content: Some("Hồ sơ đăng ký kết hôn".to_string()),
                category: Some("thu_tuc_hanh_chinh".to_string()),
                subject: Some("tu_phap_ho_tich".to_string()),
            },
        )
        .await
        .unwrap();

        let update = store.last_update();
        assert_eq!(update.normalized_text, None);
        assert_eq!(update.text_content.as_deref(), Some("Hồ sơ đăng ký kết hôn"));
    }

    #[tokio::test]
    async fn test_update_chunk_empty_labels_become_null() {
        let (store, svc) = recording_service();

        svc.update_chunk(
            "7",
            ChunkInput {
                text_content: Some("Ghi chú".to_string()),
                category: Some(String::new()),
                subject: Some(String::new()),
            },
        )
        .await
        .unwrap();

        let update = store.last_update();
        assert_eq!(update.category, None);
        assert_eq!(update.subject, None);
        assert_eq!(update.normalized_text, None);
    }

    #[tokio::test]
    async fn test_answer_rejects_blank_message() {
        let err = service().answer("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "Message cannot be empty");
    }

    #[tokio::test]
    async fn test_answer_log_data() {
        let reply = service().answer("  Giờ làm việc của phường?  ").await.unwrap();

        assert_eq!(reply.message, "Giờ làm việc của phường?");
        assert_eq!(
            reply.log_data,
            "Query: Giờ làm việc của phường?\n=> Category: thong_tin_phuong, Subject: lich_lam_viec"
        );
        assert!(reply.replies.is_empty());
    }

    #[tokio::test]
    async fn test_stream_events_in_order() {
        let events: Vec<ChatEvent> = Arc::new(service())
            .stream("Thủ tục khai sinh".to_string())
            .collect()
            .await;

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], ChatEvent::Log("Received message".to_string()));
        assert_eq!(events[1], ChatEvent::Log("Normalized: thu tuc khai sinh".to_string()));
        assert_eq!(
            events[2],
            ChatEvent::Log("Category: thu_tuc_hanh_chinh, Subject: tu_phap_ho_tich".to_string())
        );
        assert!(matches!(events[3], ChatEvent::Replies(_)));
    }

    #[tokio::test]
    async fn test_stream_empty_message_ends_with_error() {
        let events: Vec<ChatEvent> = Arc::new(service()).stream(String::new()).collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ChatEvent::Error("Message cannot be empty".to_string()));
        assert!(events[1].is_terminal());
    }

    #[test]
    fn test_event_wire_shape() {
        let json = serde_json::to_value(ChatEvent::Log("hi".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"log": "hi"}));
        let json = serde_json::to_value(ChatEvent::Replies(vec![])).unwrap();
        assert_eq!(json, serde_json::json!({"replies": []}));
    }

    #[tokio::test]
    async fn test_alias_requires_text() {
        let err = service()
            .create_alias(AliasInput {
                document_id: Some("1".to_string()),
                alias_text: Some("  ".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_alias_normalizes() {
        let svc = service();
        let created = svc
            .create_alias(AliasInput {
                document_id: Some("7".to_string()),
                alias_text: Some("Làm giấy khai sinh".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].normalized_alias, "lam giay khai sinh");
        assert_eq!(created[0].document_id.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_missing_alias_and_chunk_are_not_found() {
        let svc = service();
        let err = svc.delete_alias("42").await.unwrap_err();
        assert_eq!(err.to_string(), "Alias not found");

        let err = svc
            .update_chunk("42", ChunkInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Chunk not found");
    }

    #[test]
    fn test_alias_input_numeric_document_id() {
        let input: AliasInput =
            serde_json::from_value(serde_json::json!({"document_id": 12, "alias_text": "x"}))
                .unwrap();
        assert_eq!(input.document_id.as_deref(), Some("12"));
    }
}
