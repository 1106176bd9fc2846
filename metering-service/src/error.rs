use metering_client::domain::ParseFormulaError;

/// Failure kinds surfaced by the generator, the indicator engine, the report
/// aggregations and the service layer around them.
///
/// `NoData` is distinct from a computed zero.
#[derive(thiserror::Error, Debug)]
pub enum MeteringError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("classification {0} not found")]
    ClassificationNotFound(i32),
    #[error("no metering data: {0}")]
    NoData(String),
    #[error("invalid formula '{0}'")]
    InvalidFormula(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl From<ParseFormulaError> for MeteringError {
    fn from(e: ParseFormulaError) -> Self {
        Self::InvalidFormula(e.0)
    }
}

pub type Result<T, E = MeteringError> = std::result::Result<T, E>;
