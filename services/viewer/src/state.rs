//! Application state shared by the HTTP handlers.

use tokio::sync::RwLock;
use tracing::{error, info};

use layer_manager::{
    CapabilitiesClient, LayerManager, LoadState, TranslationReport, ViewSettings, ViewerConfig,
};
use wmts_common::{ProjectionRegistry, ViewerResult};

/// Shared application state.
///
/// The view is fixed at startup. The layer list and load state are mutated
/// by handlers and by the one background capabilities load.
pub struct AppState {
    pub config: ViewerConfig,
    pub view: ViewSettings,
    pub manager: RwLock<LayerManager>,
    pub load_state: RwLock<LoadState>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> ViewerResult<Self> {
        config.validate()?;

        let registry = ProjectionRegistry::with_defaults();
        let view = ViewSettings::for_config(&config, &registry)?;
        let manager = LayerManager::from_config(&config)?;

        Ok(Self {
            config,
            view,
            manager: RwLock::new(manager),
            load_state: RwLock::new(LoadState::Pending),
        })
    }

    /// Fetch and install the configured capabilities document.
    pub async fn load_capabilities(&self, client: &CapabilitiesClient) {
        let result = client.discover(&self.config).await;
        self.finish_load(result).await;
    }

    /// Record the outcome of a capabilities load.
    pub async fn finish_load(&self, result: ViewerResult<TranslationReport>) {
        let state = match result {
            Ok(report) => {
                let skipped = report.skipped.clone();
                let added = self.manager.write().await.install_report(report);
                info!(layers = added, skipped = skipped.len(), "Capabilities loaded");
                LoadState::Loaded {
                    layers: added,
                    skipped,
                }
            }
            Err(e) => {
                error!(error = %e, "Capabilities load failed");
                LoadState::failed(&e)
            }
        };

        *self.load_state.write().await = state;
    }
}
