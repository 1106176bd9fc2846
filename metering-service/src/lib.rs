pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod indicators;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod service;
pub mod sinks;
pub mod sources;
pub mod store;
pub mod transform;

pub use error::MeteringError;
pub use pipeline::{Envelope, Pipeline};
pub use service::MeteringService;
