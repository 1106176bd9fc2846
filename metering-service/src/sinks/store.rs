use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use metering_client::domain::NewReading;

use crate::{
    pipeline::{Envelope, PipelineError, Sink},
    store::MeteringStore,
};

/// Writes readings to a [`MeteringStore`] in batches, retrying each batch
/// with linear backoff.
pub struct StoreSink {
    store: Arc<dyn MeteringStore>,
    batch_size: usize,
    max_retries: u32,
    retry_backoff: Duration,
}

impl StoreSink {
    pub fn new(store: Arc<dyn MeteringStore>, batch_size: usize, max_retries: u32, retry_backoff: Duration) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            max_retries,
            retry_backoff,
        }
    }

    async fn flush_batch(&self, batch: &[Envelope<NewReading>]) -> Result<(), PipelineError> {
        if batch.is_empty() {
            return Ok(());
        }

        let rows: Vec<NewReading> = batch.iter().map(|e| e.payload.clone()).collect();
        let mut attempt: u32 = 0;
        loop {
            match self.store.insert_readings(&rows).await {
                Ok(inserted) => {
                    metrics::counter!("store_ingested_records_total").increment(inserted.len() as u64);

                    if let Some(min_received) = batch.iter().map(|e| e.received_at).min() {
                        if let Ok(dur) = std::time::SystemTime::now().duration_since(min_received) {
                            tracing::debug!(rows = inserted.len(), latency_s = dur.as_secs_f64(), "batch stored");
                        }
                    }

                    return Ok(());
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "store sink flush failed, retrying with backoff");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, rows = rows.len(), "batch rejected, storing rows one by one");
                    return self.flush_rows(&rows).await;
                }
            }
        }
    }

    /// Stores each row on its own so one bad row cannot sink its batch.
    /// Gives up only when the store itself stops answering.
    async fn flush_rows(&self, rows: &[NewReading]) -> Result<(), PipelineError> {
        let mut stored: u64 = 0;
        let mut rejected: u64 = 0;

        for row in rows {
            match self.store.insert_readings(std::slice::from_ref(row)).await {
                Ok(inserted) => stored += inserted.len() as u64,
                Err(e) => {
                    if let Err(health) = self.store.list_classifications().await {
                        tracing::error!(error = %health, "store unavailable, giving up");
                        metrics::counter!("store_sink_errors_total").increment(1);
                        return Err(PipelineError::Sink(health.to_string()));
                    }
                    rejected += 1;
                    tracing::warn!(
                        error = %e,
                        classification_id = row.classification_id,
                        ts = %row.ts,
                        "skipping reading the store rejected"
                    );
                }
            }
        }

        metrics::counter!("store_ingested_records_total").increment(stored);
        metrics::counter!("store_rejected_records_total").increment(rejected);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sink<NewReading> for StoreSink {
    async fn run<S>(&self, mut input: S) -> Result<(), PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<NewReading>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut buffer: Vec<Envelope<NewReading>> = Vec::with_capacity(self.batch_size);

        while let Some(item) = input.next().await {
            let env = match item {
                Ok(env) => env,
                Err(e) => {
                    tracing::error!(error = %e, "error in upstream pipeline for StoreSink");
                    continue;
                }
            };

            buffer.push(env);
            if buffer.len() >= self.batch_size {
                self.flush_batch(&buffer).await?;
                buffer.clear();
            }
        }

        if !buffer.is_empty() {
            self.flush_batch(&buffer).await?;
        }

        Ok(())
    }
}
