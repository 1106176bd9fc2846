//! Reading import plumbing. A source yields rows, each stage checks or
//! rewrites one row at a time, and the sink batches what survives into the
//! store. A failed row travels down the stream as an `Err` item; only the
//! sink decides whether an error ends the import.

use std::{pin::Pin, sync::Arc, time::SystemTime};

use futures::{Stream, StreamExt};

/// One row in flight, stamped when the source produced it.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn now(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("unreadable row: {0}")]
    Source(String),
    #[error("rejected row: {0}")]
    Transform(String),
    #[error("store write failed: {0}")]
    Sink(String),
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

/// Row-level check. Returning `Err` drops this row and nothing else.
#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

/// Consumes the stream. Errored items are the sink's to log and skip.
#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    async fn run<S>(&self, input: S) -> Result<(), PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

type Stage<T> = Arc<dyn Transform<T, T> + Send + Sync>;

/// A source, its stages in the order they were added, and a sink.
pub struct Pipeline<S, T, K> {
    source: S,
    stages: Vec<Stage<T>>,
    sink: K,
}

impl<S, T, K> Pipeline<S, T, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source,
            stages: Vec::new(),
            sink,
        }
    }

    pub fn with_stage(mut self, stage: impl Transform<T, T> + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }
}

impl<S, T, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + 'static,
    K: Sink<T> + 'static,
{
    pub async fn run(self) -> Result<(), PipelineError> {
        let Pipeline { source, stages, sink } = self;
        tracing::debug!(stages = stages.len(), "pipeline starting");

        let rows = stages.into_iter().fold(source.stream().await, through);
        sink.run(rows).await
    }
}

/// Rows already failed upstream pass by the stage untouched.
fn through<T: Send + 'static>(rows: EnvelopeStream<T>, stage: Stage<T>) -> EnvelopeStream<T> {
    Box::pin(rows.then(move |row| {
        let stage = stage.clone();
        async move { stage.apply(row?).await }
    }))
}
