//! Deterministic offline embeddings via feature hashing.

use crate::client::EmbeddingClient;
use ward_core::AppResult;

/// Offline provider for tests and local runs without an API key.
///
/// Each whitespace token and each of its character trigrams is hashed into
/// a bucket; the resulting vector is scaled to unit length. Texts that share
/// words land close together, which is enough to exercise the search path
/// end to end. Empty text yields the zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, feature: &str, seed: u64) -> usize {
        // FNV-1a
        let hash = feature.bytes().fold(0xcbf2_9ce4_8422_2325 ^ seed, |acc, b| {
            (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        });
        (hash % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        for token in lower.split_whitespace() {
            vector[self.bucket(token, 0)] += 1.0;

            let chars: Vec<char> = token.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(&trigram, 1)] += 0.5;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingClient for HashEmbedder {
    fn provider_name(&self) -> &str {
        "hash"
    }

    fn model_name(&self) -> &str {
        "hash-trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_unit_length() {
        let provider = HashEmbedder::new(256);
        let embedding = provider.embed("thu tuc dang ky khai sinh").await.unwrap();

        assert_eq!(embedding.len(), 256);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = HashEmbedder::new(128);
        let a = provider.embed("lich lam viec").await.unwrap();
        let b = provider.embed("lich lam viec").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_words_score_higher() {
        let provider = HashEmbedder::new(512);
        let query = provider.embed("dang ky khai sinh").await.unwrap();
        let related = provider.embed("ho so dang ky khai sinh cho tre").await.unwrap();
        let unrelated = provider.embed("gio lam viec buoi sang").await.unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = HashEmbedder::new(64);
        let embedding = provider.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_batch_len() {
        let provider = HashEmbedder::new(64);
        let texts = vec!["a".to_string(), "b c".to_string()];
        assert_eq!(provider.embed_batch(&texts).await.unwrap().len(), 2);
    }
}
