use anyhow::{Context, Result};
use std::sync::Arc;

use uvmap_core::{AppError, Config, ConfigError, StoreBackend};
use uvmap_uv::{
    AnnotationManager, CacheStore, FetchOrchestrator, FirestoreCacheStore, MemoryCacheStore,
    OpenUvClient, Session, SqliteCacheStore,
};

/// Wires the configured store and provider into the core services.
pub struct App {
    config: Arc<Config>,
    orchestrator: Arc<FetchOrchestrator>,
    annotations: AnnotationManager,
    session: Session,
}

impl App {
    /// Create an application instance from validated configuration
    pub fn new(config: Config) -> Result<Self> {
        let store = build_store(&config)?;
        let provider = OpenUvClient::from_config(&config.provider)
            .map_err(AppError::from)
            .context("Failed to create UV provider client")?;

        tracing::info!(
            "Using {:?} store with collection {}",
            config.store.backend,
            config.store.collection
        );

        let orchestrator = Arc::new(FetchOrchestrator::new(store, Arc::new(provider)));
        let annotations = AnnotationManager::new(orchestrator.clone());

        Ok(Self {
            config: Arc::new(config),
            orchestrator,
            annotations,
            session: Session::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }

    pub fn annotations(&self) -> &AnnotationManager {
        &self.annotations
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        self.orchestrator.store()
    }
}

fn build_store(config: &Config) -> Result<Arc<dyn CacheStore>> {
    let collection = config.store.collection.clone();
    let store: Arc<dyn CacheStore> = match config.store.backend {
        StoreBackend::Sqlite => {
            let path = config.store.effective_sqlite_path(&config.config_dir);
            tracing::debug!("Opening SQLite store at {}", path.display());
            Arc::new(SqliteCacheStore::new(&path, collection).map_err(AppError::from)?)
        }
        StoreBackend::Firestore => {
            let url = config.store.firestore_documents_url().ok_or_else(|| {
                AppError::from(ConfigError::MissingSetting(
                    "store.firestore_project_id".to_string(),
                ))
            })?;
            Arc::new(
                FirestoreCacheStore::new(&url, collection, config.store.firestore_api_key.clone())
                    .map_err(AppError::from)?,
            )
        }
        StoreBackend::Memory => Arc::new(MemoryCacheStore::new()),
    };
    Ok(store)
}
