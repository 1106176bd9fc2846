use anyhow::Result;
use metering_client::{
    db::{
        baseline_queries, classification_queries, definition_queries, indicator_queries,
        reading_queries, target_queries,
    },
    domain::{
        Baseline, Classification, EnpiDefinition, Indicator, NewBaseline, NewClassification,
        NewEnpiDefinition, NewIndicator, NewReading, NewTarget, Reading, ReadingFilter, Target,
    },
};
use sqlx::PgPool;

use super::MeteringStore;

/// Postgres-backed store. Expects `sql/schema/01_metering.sql` to be applied.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MeteringStore for PgStore {
    async fn list_classifications(&self) -> Result<Vec<Classification>> {
        classification_queries::list_classifications(&self.pool).await
    }

    async fn get_classification(&self, id: i32) -> Result<Option<Classification>> {
        classification_queries::get_classification(&self.pool, id).await
    }

    async fn create_classification(&self, new: &NewClassification) -> Result<Classification> {
        classification_queries::insert_classification(&self.pool, new).await
    }

    async fn update_classification(&self, id: i32, new: &NewClassification) -> Result<Option<Classification>> {
        classification_queries::update_classification(&self.pool, id, new).await
    }

    async fn delete_classification(&self, id: i32) -> Result<bool> {
        classification_queries::delete_classification(&self.pool, id).await
    }

    async fn readings(&self, filter: &ReadingFilter) -> Result<Vec<Reading>> {
        reading_queries::list_readings(&self.pool, filter).await
    }

    async fn insert_readings(&self, readings: &[NewReading]) -> Result<Vec<Reading>> {
        reading_queries::insert_readings(&self.pool, readings).await
    }

    async fn list_indicators(&self) -> Result<Vec<Indicator>> {
        indicator_queries::list_indicators(&self.pool).await
    }

    async fn get_indicator(&self, id: i32) -> Result<Option<Indicator>> {
        indicator_queries::get_indicator(&self.pool, id).await
    }

    async fn insert_indicator(&self, new: &NewIndicator) -> Result<Indicator> {
        indicator_queries::insert_indicator(&self.pool, new).await
    }

    async fn delete_indicator(&self, id: i32) -> Result<bool> {
        indicator_queries::delete_indicator(&self.pool, id).await
    }

    async fn list_baselines(&self) -> Result<Vec<Baseline>> {
        baseline_queries::list_baselines(&self.pool).await
    }

    async fn get_baseline(&self, id: i32) -> Result<Option<Baseline>> {
        baseline_queries::get_baseline(&self.pool, id).await
    }

    async fn insert_baseline(&self, new: &NewBaseline) -> Result<Baseline> {
        baseline_queries::insert_baseline(&self.pool, new).await
    }

    async fn delete_baseline(&self, id: i32) -> Result<bool> {
        baseline_queries::delete_baseline(&self.pool, id).await
    }

    async fn list_definitions(&self) -> Result<Vec<EnpiDefinition>> {
        definition_queries::list_definitions(&self.pool).await
    }

    async fn get_definition(&self, id: i32) -> Result<Option<EnpiDefinition>> {
        definition_queries::get_definition(&self.pool, id).await
    }

    async fn insert_definition(&self, new: &NewEnpiDefinition) -> Result<EnpiDefinition> {
        definition_queries::insert_definition(&self.pool, new).await
    }

    async fn update_definition(&self, id: i32, new: &NewEnpiDefinition) -> Result<Option<EnpiDefinition>> {
        definition_queries::update_definition(&self.pool, id, new).await
    }

    async fn delete_definition(&self, id: i32) -> Result<bool> {
        definition_queries::delete_definition(&self.pool, id).await
    }

    async fn list_targets(&self, definition_id: Option<i32>) -> Result<Vec<Target>> {
        target_queries::list_targets(&self.pool, definition_id).await
    }

    async fn get_target(&self, id: i32) -> Result<Option<Target>> {
        target_queries::get_target(&self.pool, id).await
    }

    async fn insert_target(&self, new: &NewTarget) -> Result<Target> {
        target_queries::insert_target(&self.pool, new).await
    }

    async fn update_target(&self, id: i32, new: &NewTarget) -> Result<Option<Target>> {
        target_queries::update_target(&self.pool, id, new).await
    }

    async fn delete_target(&self, id: i32) -> Result<bool> {
        target_queries::delete_target(&self.pool, id).await
    }
}
