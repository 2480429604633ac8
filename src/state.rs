use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{bootstrap::StoreBootstrap, Store};
use crate::storage::medium_from_config;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Reads config, opens the durable medium and bootstraps the store.
    /// Any failure here aborts startup.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let medium = medium_from_config(&config.backend).await?;
        let store = StoreBootstrap::new(medium, config.admin.clone())
            .open()
            .await?;
        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Store, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    #[cfg(test)]
    pub async fn fake() -> Self {
        use crate::config::StoreBackend;
        use crate::db::test_support::{admin_seed, memory_store};

        let (store, _medium) = memory_store().await;
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            backend: StoreBackend::File {
                path: "unused.json".into(),
            },
            admin: admin_seed(),
        });
        Self::from_parts(store, config)
    }
}
