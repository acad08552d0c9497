//! Document store record types.

use serde::{Deserialize, Deserializer, Serialize};

/// A stored document fragment (`documents` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Name of the procedure the chunk belongs to
    #[serde(default)]
    pub procedure_name: Option<String>,

    #[serde(default)]
    pub text_content: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub is_active: Option<bool>,

    #[serde(default)]
    pub effective_date: Option<String>,
}

/// Column list requested when listing chunks.
pub const CHUNK_COLUMNS: &str =
    "id,procedure_name,text_content,category,subject,is_active,effective_date";

/// Partial update applied to a chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkUpdate {
    pub text_content: Option<String>,
    /// Normalized copy of `text_content` used by lexical search
    pub normalized_text: Option<String>,
    pub category: Option<String>,
    pub subject: Option<String>,
}

/// An alternate phrasing mapped to a document (`alias` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub document_id: Option<String>,

    #[serde(default)]
    pub alias_text: String,

    #[serde(default)]
    pub normalized_alias: String,
}

/// Column list requested when listing aliases.
pub const ALIAS_COLUMNS: &str = "id,document_id,alias_text,normalized_alias";

/// Alias row as written on insert or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlias {
    pub document_id: Option<String>,
    pub alias_text: String,
    pub normalized_alias: String,
    pub embedding: Vec<f32>,
}

/// Arguments of the hybrid search procedure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParams {
    /// Normalized query for the lexical half
    pub p_query_format: String,
    /// Query embedding for the vector half
    pub p_query_embedding: Vec<f32>,
    pub p_tenant: String,
    pub p_category: Option<String>,
    pub p_subject: Option<String>,
    pub p_limit: u32,
}

/// Opaque ranked row returned by the search procedure.
pub type SearchHit = serde_json::Value;

/// Accept ids stored either as text/uuid or as integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_numeric_id() {
        let chunk: Chunk = serde_json::from_value(serde_json::json!({
            "id": 42,
            "text_content": "Giờ làm việc: 7h30 - 17h00",
            "category": "thong_tin_phuong",
            "subject": "lich_lam_viec",
            "is_active": true
        }))
        .unwrap();

        assert_eq!(chunk.id, "42");
        assert_eq!(chunk.procedure_name, None);
        assert_eq!(chunk.is_active, Some(true));
    }

    #[test]
    fn test_alias_uuid_ids() {
        let alias: Alias = serde_json::from_value(serde_json::json!({
            "id": "6f1c2c1e-0000-4000-8000-000000000001",
            "document_id": null,
            "alias_text": "Làm khai sinh",
            "normalized_alias": "lam khai sinh"
        }))
        .unwrap();

        assert_eq!(alias.id, "6f1c2c1e-0000-4000-8000-000000000001");
        assert_eq!(alias.document_id, None);
    }

    #[test]
    fn test_rejects_object_id() {
        let result: Result<Alias, _> =
            serde_json::from_value(serde_json::json!({"id": {"nested": 1}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_search_params_serialize_nulls() {
        let params = SearchParams {
            p_query_format: "xin chao".to_string(),
            p_query_embedding: vec![0.5, 0.5],
            p_tenant: "xa_ba_diem".to_string(),
            p_category: None,
            p_subject: None,
            p_limit: 5,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert!(json["p_category"].is_null());
        assert!(json["p_subject"].is_null());
        assert_eq!(json["p_limit"], 5);
    }
}
