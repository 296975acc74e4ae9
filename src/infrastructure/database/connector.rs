use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::db::DatabaseManager;
use super::store::DataStore;
use crate::config::DatabaseConfig;
use crate::error::Result;

/// Produces a live [`DataStore`] handle, verifying connectivity on the way.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn DataStore>>;

    /// Short description of the target, safe to print.
    fn describe(&self) -> String;
}

pub struct MongoConnector {
    config: DatabaseConfig,
    timeout: Duration,
}

impl MongoConnector {
    pub fn new(config: DatabaseConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }
}

#[async_trait]
impl StoreConnector for MongoConnector {
    async fn connect(&self) -> Result<Arc<dyn DataStore>> {
        let manager = DatabaseManager::new(&self.config, self.timeout).await?;
        Ok(Arc::new(manager))
    }

    fn describe(&self) -> String {
        format!("mongodb://{}:{}/{}", self.config.host, self.config.port, self.config.name)
    }
}

/// Connector over an already-constructed store; `connect` only pings it.
pub struct ExistingStore(pub Arc<dyn DataStore>);

#[async_trait]
impl StoreConnector for ExistingStore {
    async fn connect(&self) -> Result<Arc<dyn DataStore>> {
        self.0.ping().await?;
        Ok(Arc::clone(&self.0))
    }

    fn describe(&self) -> String {
        "existing store handle".to_string()
    }
}
