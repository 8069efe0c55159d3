//! Application state wiring config, store, and backend together.
//!
//! The service is generic over store and provider traits; AppState pins it
//! to the concrete infra implementations selected by the loaded config.

use std::path::PathBuf;

use secrecy::ExposeSecret;

use gridchat_core::chat::ChatService;
use gridchat_core::llm::{DeltaStream, LlmProvider};
use gridchat_infra::config::{self, AppConfig, BackendKind};
use gridchat_infra::llm::openai_compat::config::OpenAiCompatConfig;
use gridchat_infra::llm::{OpenAiCompatibleProvider, RemoteProcessProvider};
use gridchat_infra::sqlite::{pool, DatabasePool, SqliteChatStore};
use gridchat_types::error::BackendError;
use gridchat_types::llm::{CompletionRequest, CompletionResponse, GenerationConfig};

/// Backend chosen at startup from config.
pub enum ConfiguredProvider {
    OpenaiCompat(OpenAiCompatibleProvider),
    Remote(RemoteProcessProvider),
}

impl LlmProvider for ConfiguredProvider {
    fn name(&self) -> &str {
        match self {
            ConfiguredProvider::OpenaiCompat(p) => p.name(),
            ConfiguredProvider::Remote(p) => p.name(),
        }
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        match self {
            ConfiguredProvider::OpenaiCompat(p) => p.complete(request).await,
            ConfiguredProvider::Remote(p) => p.complete(request).await,
        }
    }

    fn stream(&self, request: CompletionRequest) -> DeltaStream {
        match self {
            ConfiguredProvider::OpenaiCompat(p) => p.stream(request),
            ConfiguredProvider::Remote(p) => p.stream(request),
        }
    }
}

pub type ConcreteChatService = ChatService<SqliteChatStore, ConfiguredProvider>;

/// Everything a command handler needs.
pub struct AppState {
    pub service: ConcreteChatService,
    pub model: String,
    pub generation: GenerationConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, open the store,
    /// construct the configured backend.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = config::default_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = config::load_config(&data_dir).await;

        let db_path = config
            .db_path
            .clone()
            .unwrap_or_else(pool::default_db_path);
        let db_pool = DatabasePool::open(&db_path).await?;
        let store = SqliteChatStore::new(db_pool);

        let provider = build_provider(&config)?;
        tracing::debug!(
            backend = provider.name(),
            db = %db_path.display(),
            "initialized"
        );

        let mut service = ChatService::new(store, provider);
        if let Some(ref title_model) = config.backend.title_model {
            service = service.with_title_model(title_model);
        }

        Ok(Self {
            service,
            model: config.backend.model.clone(),
            generation: config.generation.clone(),
            data_dir,
        })
    }
}

fn build_provider(config: &AppConfig) -> anyhow::Result<ConfiguredProvider> {
    match config.backend.kind {
        BackendKind::OpenaiCompat => {
            let api_key = config
                .backend
                .api_key
                .as_ref()
                .map(|k| k.expose_secret().to_string())
                // Local servers ignore the key but the header must be present.
                .unwrap_or_else(|| "none".to_string());

            Ok(ConfiguredProvider::OpenaiCompat(
                OpenAiCompatibleProvider::new(OpenAiCompatConfig {
                    provider_name: "openai_compat".to_string(),
                    base_url: config.backend.base_url.clone(),
                    api_key,
                    model: config.backend.model.clone(),
                    timeout: std::time::Duration::from_secs(config.backend.timeout_secs),
                }),
            ))
        }
        BackendKind::Remote => {
            let remote = config.backend.remote.clone().ok_or_else(|| {
                anyhow::anyhow!("backend.kind is \"remote\" but [backend.remote] is missing")
            })?;
            Ok(ConfiguredProvider::Remote(RemoteProcessProvider::new(
                remote,
            )))
        }
    }
}
