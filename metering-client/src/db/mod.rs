pub mod baseline_queries;
pub mod classification_queries;
pub mod definition_queries;
pub mod indicator_queries;
pub mod reading_queries;
pub mod target_queries;
