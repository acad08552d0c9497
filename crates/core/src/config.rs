//! Configuration management for Ward Assistant.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - YAML config file (`ward.yaml`, or the path in `WARD_CONFIG`)
//! - Environment variables
//! - Command-line flags (`with_overrides`)
//!
//! Secrets never live in the file itself. The file names the environment
//! variable holding each secret (`keyEnv`, `apiKeyEnv`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ward.yaml";

/// Tenant key passed to the hybrid search procedure.
pub const DEFAULT_TENANT: &str = "xa_ba_diem";

/// Known document store backends.
pub const STORE_BACKENDS: [&str; 2] = ["supabase", "memory"];

/// Known embedding providers.
pub const EMBEDDING_PROVIDERS: [&str; 3] = ["openai", "hash", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file the values were merged from, if any
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// HTTP gateway settings
    pub server: ServerConfig,

    /// Document store settings
    pub store: StoreConfig,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,
}

/// HTTP gateway bind address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Document store (PostgREST backend) settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// "supabase" or "memory"
    pub backend: String,

    /// Project URL, e.g. https://xyz.supabase.co
    pub url: Option<String>,

    /// Environment variable holding the service key
    pub key_env: String,

    /// Tenant passed to the search procedure
    pub tenant: String,

    /// Name of the hybrid search RPC
    pub search_function: String,

    /// Maximum number of chunks returned per query
    pub search_limit: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "supabase".to_string(),
            url: None,
            key_env: "SUPABASE_KEY".to_string(),
            tenant: DEFAULT_TENANT.to_string(),
            search_function: "search_documents_full_hybrid_v4".to_string(),
            search_limit: 5,
            timeout_secs: 30,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// "openai", "hash" or "mock"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Override for the API base URL
    pub endpoint: Option<String>,

    /// Expected vector dimensionality
    pub dimensions: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            endpoint: None,
            dimensions: 1536,
            timeout_secs: 30,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    server: Option<ServerConfig>,
    store: Option<StoreConfig>,
    embedding: Option<EmbeddingSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `WARD_CONFIG`: Path to config file
    /// - `SUPABASE_URL`: Store project URL
    /// - `WARD_STORE`: Store backend
    /// - `WARD_TENANT`: Search tenant
    /// - `WARD_HOST` / `WARD_PORT`: Gateway bind address
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ward_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Tenant: {}", config.store.tenant);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("WARD_CONFIG").ok().map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    config = config.merge_yaml(&path)?;
                }
            }
        }

        config.apply_env();
        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(server) = config_file.server {
            result.server = server;
        }
        if let Some(store) = config_file.store {
            result.store = store;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Environment variables override YAML config.
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            self.store.url = Some(url);
        }

        if let Ok(backend) = std::env::var("WARD_STORE") {
            self.store.backend = backend;
        }

        if let Ok(tenant) = std::env::var("WARD_TENANT") {
            self.store.tenant = tenant;
        }

        if let Ok(host) = std::env::var("WARD_HOST") {
            self.server.host = host;
        }

        if let Some(port) = std::env::var("WARD_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over file and environment values.
    pub fn with_overrides(
        mut self,
        store_backend: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(backend) = store_backend {
            self.store.backend = backend;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve the store service key from its environment variable.
    pub fn store_key(&self) -> Option<String> {
        std::env::var(&self.store.key_env).ok()
    }

    /// Resolve the embedding API key from its environment variable.
    pub fn embedding_api_key(&self) -> Option<String> {
        std::env::var(&self.embedding.api_key_env).ok()
    }

    /// Validate configuration for the selected backends.
    pub fn validate(&self) -> AppResult<()> {
        let backend = self.store.backend.as_str();
        if !STORE_BACKENDS.contains(&backend) {
            return Err(AppError::Config(format!(
                "Unknown store backend: {}. Supported: {}",
                backend,
                STORE_BACKENDS.join(", ")
            )));
        }

        let provider = self.embedding.provider.as_str();
        if !EMBEDDING_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.store.search_limit == 0 {
            return Err(AppError::Config(
                "store.searchLimit must be at least 1".to_string(),
            ));
        }

        if backend == "supabase" {
            if self.store.url.is_none() {
                return Err(AppError::Config(
                    "Store URL not set (store.url or SUPABASE_URL)".to_string(),
                ));
            }
            if self.store_key().is_none() {
                return Err(AppError::Config(format!(
                    "Store key not found in environment variable: {}",
                    self.store.key_env
                )));
            }
        }

        if provider == "openai" && self.embedding_api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.embedding.api_key_env
            )));
        }

        Ok(())
    }
}
