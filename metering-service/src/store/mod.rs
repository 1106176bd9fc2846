//! Persistence seam. The core never touches storage; the service layer reaches
//! it through [`MeteringStore`].

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use anyhow::{Context, Result};
use metering_client::domain::{
    Baseline, Classification, EnpiDefinition, Indicator, NewBaseline, NewClassification,
    NewEnpiDefinition, NewIndicator, NewReading, NewTarget, Reading, ReadingFilter, Target,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::config::DatabaseConfig;

/// Storage collaborator. Deleting a classification removes its readings,
/// indicators, baselines and EnPI definitions; deleting a definition removes
/// its targets.
#[async_trait::async_trait]
pub trait MeteringStore: Send + Sync {
    async fn list_classifications(&self) -> Result<Vec<Classification>>;
    async fn get_classification(&self, id: i32) -> Result<Option<Classification>>;
    async fn create_classification(&self, new: &NewClassification) -> Result<Classification>;
    async fn update_classification(&self, id: i32, new: &NewClassification) -> Result<Option<Classification>>;
    async fn delete_classification(&self, id: i32) -> Result<bool>;

    /// Readings matching `filter` (inclusive bounds), ordered by timestamp.
    async fn readings(&self, filter: &ReadingFilter) -> Result<Vec<Reading>>;
    async fn insert_readings(&self, readings: &[NewReading]) -> Result<Vec<Reading>>;

    async fn list_indicators(&self) -> Result<Vec<Indicator>>;
    async fn get_indicator(&self, id: i32) -> Result<Option<Indicator>>;
    async fn insert_indicator(&self, new: &NewIndicator) -> Result<Indicator>;
    async fn delete_indicator(&self, id: i32) -> Result<bool>;

    async fn list_baselines(&self) -> Result<Vec<Baseline>>;
    async fn get_baseline(&self, id: i32) -> Result<Option<Baseline>>;
    async fn insert_baseline(&self, new: &NewBaseline) -> Result<Baseline>;
    async fn delete_baseline(&self, id: i32) -> Result<bool>;

    async fn list_definitions(&self) -> Result<Vec<EnpiDefinition>>;
    async fn get_definition(&self, id: i32) -> Result<Option<EnpiDefinition>>;
    async fn insert_definition(&self, new: &NewEnpiDefinition) -> Result<EnpiDefinition>;
    async fn update_definition(&self, id: i32, new: &NewEnpiDefinition) -> Result<Option<EnpiDefinition>>;
    async fn delete_definition(&self, id: i32) -> Result<bool>;

    async fn list_targets(&self, definition_id: Option<i32>) -> Result<Vec<Target>>;
    async fn get_target(&self, id: i32) -> Result<Option<Target>>;
    async fn insert_target(&self, new: &NewTarget) -> Result<Target>;
    async fn update_target(&self, id: i32, new: &NewTarget) -> Result<Option<Target>>;
    async fn delete_target(&self, id: i32) -> Result<bool>;
}

/// Opens the configured store: the seeded in-process store for `uri = "memory"`,
/// otherwise a Postgres pool.
pub async fn connect(cfg: &DatabaseConfig) -> Result<Arc<dyn MeteringStore>> {
    if cfg.is_memory() {
        tracing::info!("using in-memory store");
        return Ok(Arc::new(MemoryStore::seeded()));
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect(&cfg.uri)
        .await
        .context("failed to connect to postgres")?;
    tracing::info!(max_connections = cfg.max_connections, "connected to postgres");
    Ok(Arc::new(PgStore::new(pool)))
}
