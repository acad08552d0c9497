//! End-to-end routing and retrieval against the in-memory store.

use crate::chat::{ChatEvent, ChatService, ChunkInput};
use crate::store::MemoryStore;
use crate::types::Chunk;
use futures::StreamExt;
use std::sync::Arc;
use ward_embed::{EmbeddingClient, HashEmbedder};

const DIMENSIONS: usize = 256;

fn chunk(id: &str, procedure: &str, text: &str, category: &str, subject: &str) -> Chunk {
    Chunk {
        id: id.to_string(),
        procedure_name: Some(procedure.to_string()),
        text_content: Some(text.to_string()),
        category: Some(category.to_string()),
        subject: Some(subject.to_string()),
        is_active: Some(true),
        effective_date: Some("2025-07-01".to_string()),
    }
}

async fn ward_service() -> ChatService {
    let embedder = Arc::new(HashEmbedder::new(DIMENSIONS));
    let store = MemoryStore::new();

    let rows = [
        chunk(
            "1",
            "Đăng ký khai sinh",
            "Thủ tục đăng ký khai sinh: nộp tờ khai và giấy chứng sinh",
            "thu_tuc_hanh_chinh",
            "tu_phap_ho_tich",
        ),
        chunk(
            "2",
            "Lịch làm việc",
            "Giờ làm việc từ thứ 2 đến thứ 6, buổi sáng 7h30",
            "thong_tin_phuong",
            "lich_lam_viec",
        ),
        chunk(
            "3",
            "Lãnh đạo phường",
            "Chủ tịch UBND phường Bà Điểm",
            "thong_tin_phuong",
            "lanh_dao",
        ),
        chunk(
            "4",
            "Khu phố",
            "Phường có 12 khu phố",
            "thong_tin_phuong",
            "tong_quan",
        ),
    ];

    for row in rows {
        let text = row.text_content.clone().unwrap_or_default();
        let embedding = embedder.embed(&text).await.unwrap();
        store.insert_chunk(row, Some(embedding)).await;
    }

    ChatService::new(Arc::new(store), embedder).with_limit(3)
}

fn ids(replies: &[serde_json::Value]) -> Vec<String> {
    replies
        .iter()
        .map(|r| r["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_procedure_question_hits_procedure_chunk() {
    let svc = ward_service().await;
    let reply = svc.answer("Thủ tục đăng ký khai sinh cần gì?").await.unwrap();

    assert_eq!(ids(&reply.replies), vec!["1"]);
    assert!(reply.log_data.ends_with("Category: thu_tuc_hanh_chinh, Subject: tu_phap_ho_tich"));
}

#[tokio::test]
async fn test_schedule_question_is_filtered_to_schedule() {
    let svc = ward_service().await;
    let reply = svc.answer("Phường làm việc mấy giờ?").await.unwrap();

    assert_eq!(ids(&reply.replies), vec!["2"]);
}

#[tokio::test]
async fn test_neighbourhood_count_routes_to_overview() {
    let svc = ward_service().await;
    let reply = svc.answer("Phường có bao nhiêu khu phố?").await.unwrap();

    assert_eq!(ids(&reply.replies), vec!["4"]);
}

#[tokio::test]
async fn test_unclassified_question_searches_everything() {
    let svc = ward_service().await;
    let reply = svc.answer("Xin chào").await.unwrap();

    assert_eq!(reply.replies.len(), 3);
    assert!(reply.log_data.ends_with("Category: none, Subject: none"));
}

#[tokio::test]
async fn test_stream_ends_with_filtered_replies() {
    let svc = Arc::new(ward_service().await);
    let events: Vec<ChatEvent> = svc
        .stream("Chủ tịch UBND phường là ai".to_string())
        .collect()
        .await;

    let last = events.last().cloned();
    match last {
        Some(ChatEvent::Replies(rows)) => assert_eq!(ids(&rows), vec!["3"]),
        other => panic!("unexpected final event: {:?}", other),
    }
}

#[tokio::test]
async fn test_chunk_edit_changes_search_label() {
    let svc = ward_service().await;

    svc.update_chunk(
        "3",
        ChunkInput {
            text_content: Some("Giờ tiếp dân của Chủ tịch: thứ 5".to_string()),
            category: Some("thong_tin_phuong".to_string()),
            subject: Some("lich_lam_viec".to_string()),
        },
    )
    .await
    .unwrap();

    let reply = svc.answer("Lịch làm việc thứ 5").await.unwrap();
    let mut found = ids(&reply.replies);
    found.sort();
    assert_eq!(found, vec!["2", "3"]);

    let chunks = svc.store().list_chunks().await.unwrap();
    assert_eq!(chunks.len(), 4);
}
