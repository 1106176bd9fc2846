use anyhow::{bail, Result};
use metering_service::{
    config::AppConfig,
    observability,
    pipeline::Pipeline,
    sinks::StoreSink,
    sources::ReadingCsvFileSource,
    store,
    transform,
};
use std::{env, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: import_readings <csv_file_path>");
    }
    let file_path = &args[1];

    // METERING_CONFIG may point at an import-specific file.
    let cfg = AppConfig::load()?;
    if cfg.database.is_memory() {
        tracing::warn!("importing into the in-memory store; rows are discarded on exit");
    }

    let store = store::connect(&cfg.database).await?;
    let known = transform::KnownClassifications::load(store.as_ref()).await?;

    let sink = StoreSink::new(
        store,
        cfg.import.batch_size,
        cfg.import.max_retries,
        Duration::from_millis(cfg.import.retry_backoff_ms),
    );

    let source = ReadingCsvFileSource::new(file_path);
    let pipeline = Pipeline::new(source, sink)
        .with_stage(transform::ReadingValidation::default())
        .with_stage(known);

    tracing::info!(path = %file_path, "importing readings");
    pipeline.run().await?;
    tracing::info!(path = %file_path, "import finished");

    Ok(())
}
