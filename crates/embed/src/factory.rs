//! Embedding provider factory.
//!
//! Resolves the configured provider name into a client, injecting the API
//! key and endpoint where the provider needs them.

use crate::client::EmbeddingClient;
use crate::providers::{openai::DEFAULT_OPENAI_URL, HashEmbedder, OpenAiEmbedder};
use crate::types::ProviderType;
use std::sync::Arc;
use ward_core::config::EmbeddingSettings;
use ward_core::{AppError, AppResult};

/// Create an embedding client from settings.
///
/// # Errors
/// Returns error if the provider is unknown or a required API key is missing.
pub fn create_client(
    settings: &EmbeddingSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingClient>> {
    let provider = ProviderType::parse(&settings.provider).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, hash",
            settings.provider
        ))
    })?;

    tracing::debug!(
        "Creating embedding client: provider={}, model={}, dimensions={}",
        provider.as_str(),
        settings.model,
        settings.dimensions
    );

    match provider {
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config(format!(
                    "OpenAI provider requires API key (set {})",
                    settings.api_key_env
                ))
            })?;
            let endpoint = settings.endpoint.as_deref().unwrap_or(DEFAULT_OPENAI_URL);
            let client = OpenAiEmbedder::with_options(
                api_key,
                settings.model.clone(),
                settings.dimensions,
                endpoint,
                settings.timeout_secs,
            )?;
            Ok(Arc::new(client))
        }
        ProviderType::Hash => Ok(Arc::new(HashEmbedder::new(settings.dimensions))),
    }
}
