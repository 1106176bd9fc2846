use std::collections::HashSet;

use metering_client::domain::NewReading;
use time::macros::datetime;

use crate::{
    pipeline::{Envelope, PipelineError, Transform},
    store::MeteringStore,
};

/// Pure validation of an imported reading.
///
/// Rules:
/// - classification_id must be positive.
/// - energy_value and power must be finite and non-negative.
/// - ts must be within a broad sanity window [2000-01-01, 2100-01-01].
pub fn validate_reading(env: Envelope<NewReading>) -> Result<Envelope<NewReading>, PipelineError> {
    let r = &env.payload;

    if r.classification_id <= 0 {
        return Err(PipelineError::Transform(format!(
            "classification_id must be positive, got {}",
            r.classification_id
        )));
    }
    if !r.energy_value.is_finite() || r.energy_value < 0.0 {
        return Err(PipelineError::Transform("energy_value must be non-negative".to_string()));
    }
    if !r.power.is_finite() || r.power < 0.0 {
        return Err(PipelineError::Transform("power must be non-negative".to_string()));
    }

    let min_ts = datetime!(2000-01-01 00:00:00 UTC);
    let max_ts = datetime!(2100-01-01 00:00:00 UTC);

    if r.ts < min_ts || r.ts > max_ts {
        return Err(PipelineError::Transform("timestamp out of allowed range".to_string()));
    }

    Ok(env)
}

#[derive(Clone, Default)]
pub struct ReadingValidation;

#[async_trait::async_trait]
impl Transform<NewReading, NewReading> for ReadingValidation {
    async fn apply(&self, input: Envelope<NewReading>) -> Result<Envelope<NewReading>, PipelineError> {
        match validate_reading(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("validation_reading_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}

/// Drops readings whose classification is not in the store, so orphan rows
/// are counted here instead of failing a whole batch at the sink.
#[derive(Clone, Debug, Default)]
pub struct KnownClassifications {
    ids: HashSet<i32>,
}

impl KnownClassifications {
    pub fn new(ids: impl IntoIterator<Item = i32>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Snapshot of the classification ids currently in `store`.
    pub async fn load(store: &dyn MeteringStore) -> anyhow::Result<Self> {
        let classifications = store.list_classifications().await?;
        Ok(Self::new(classifications.into_iter().map(|c| c.id)))
    }
}

#[async_trait::async_trait]
impl Transform<NewReading, NewReading> for KnownClassifications {
    async fn apply(&self, input: Envelope<NewReading>) -> Result<Envelope<NewReading>, PipelineError> {
        let id = input.payload.classification_id;
        if self.ids.contains(&id) {
            Ok(input)
        } else {
            metrics::counter!("validation_reading_rejected_total").increment(1);
            Err(PipelineError::Transform(format!("unknown classification {id}")))
        }
    }
}
