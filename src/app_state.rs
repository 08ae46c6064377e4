use crate::{config::Config, service::FestivalService, store::SqliteStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: FestivalService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize the store once at startup; every service operation
        // receives this handle explicitly, never through ambient state.
        let store = SqliteStore::connect(&config.database.url).await?;
        store.init().await?;
        let service = FestivalService::new(Arc::new(store));

        Ok(Self { service, config })
    }
}
