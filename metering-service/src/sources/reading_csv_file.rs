use std::{fs::File, path::PathBuf};

use csv::StringRecord;
use metering_client::domain::NewReading;
use time::OffsetDateTime;

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

pub const DEFAULT_INTERVAL_MINUTES: i64 = 15;

/// CSV backfill source for readings.
///
/// Expected header columns (by name):
/// - ts (RFC3339 timestamp)
/// - classification_id
/// - energy_value
/// - power (optional, derived from energy_value and the interval when blank)
/// - interval_minutes (optional, default 15)
///
/// Unparseable rows are yielded as errors so the sink can skip them.
pub struct ReadingCsvFileSource {
    path: PathBuf,
}

impl ReadingCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_optional_f64(s: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        trimmed.parse().map(Some)
    }
}

pub(crate) fn record_to_reading(record: &StringRecord, headers: &StringRecord) -> Result<NewReading, PipelineError> {
    let get = |name: &str| -> Option<&str> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|idx| record.get(idx))
    };
    let require = |name: &str| -> Result<&str, PipelineError> {
        get(name).ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in CSV record")))
    };

    let ts_str = require("ts")?;
    let ts = OffsetDateTime::parse(ts_str.trim(), &time::format_description::well_known::Rfc3339)
        .map_err(|e| PipelineError::Source(format!("invalid ts '{ts_str}': {e}")))?;

    let id_str = require("classification_id")?;
    let classification_id: i32 = id_str
        .trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid classification_id '{id_str}': {e}")))?;

    let energy_str = require("energy_value")?;
    let energy_value: f64 = energy_str
        .trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid energy_value '{energy_str}': {e}")))?;

    let power_str = get("power").unwrap_or("");
    let power = parse_optional_f64(power_str)
        .map_err(|e| PipelineError::Source(format!("invalid power '{power_str}': {e}")))?;

    let power = match power {
        Some(p) => p,
        None => {
            let interval_str = get("interval_minutes").unwrap_or("").trim();
            let interval_minutes = if interval_str.is_empty() {
                DEFAULT_INTERVAL_MINUTES
            } else {
                interval_str
                    .parse::<i64>()
                    .map_err(|e| PipelineError::Source(format!("invalid interval_minutes '{interval_str}': {e}")))?
            };
            if interval_minutes <= 0 {
                return Err(PipelineError::Source(format!(
                    "interval_minutes must be positive, got {interval_minutes}"
                )));
            }
            energy_value * 60.0 / interval_minutes as f64
        }
    };

    Ok(NewReading {
        ts,
        classification_id,
        energy_value,
        power,
    })
}

#[async_trait::async_trait]
impl Source<NewReading> for ReadingCsvFileSource {
    async fn stream(&self) -> EnvelopeStream<NewReading> {
        let path = self.path.clone();
        let s = async_stream::stream! {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    yield Err(PipelineError::Source(format!("failed to open CSV file {}: {e}", path.display())));
                    return;
                }
            };
            let mut rdr = csv::Reader::from_reader(file);
            let headers = match rdr.headers() {
                Ok(h) => h.clone(),
                Err(e) => {
                    yield Err(PipelineError::Source(format!("failed to read CSV headers: {e}")));
                    return;
                }
            };

            for (line, result) in rdr.records().enumerate() {
                let parsed = result
                    .map_err(|e| PipelineError::Source(format!("failed to read CSV record: {e}")))
                    .and_then(|record| record_to_reading(&record, &headers));

                match parsed {
                    Ok(reading) => yield Ok(Envelope::now(reading)),
                    Err(e) => {
                        metrics::counter!("reading_csv_parse_errors_total").increment(1);
                        tracing::warn!(line = line + 2, error = %e, "skipping CSV row");
                        yield Err(e);
                    }
                }
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use time::macros::datetime;

    use super::*;

    fn headers(cols: &[&str]) -> StringRecord {
        StringRecord::from(cols.to_vec())
    }

    #[test]
    fn parses_full_record() {
        let h = headers(&["ts", "classification_id", "energy_value", "power"]);
        let r = StringRecord::from(vec!["2024-01-01T08:00:00Z", "2", "2.5", "10"]);

        let reading = record_to_reading(&r, &h).unwrap();
        assert_eq!(reading.ts, datetime!(2024-01-01 08:00:00 UTC));
        assert_eq!(reading.classification_id, 2);
        assert_eq!(reading.energy_value, 2.5);
        assert_eq!(reading.power, 10.0);
    }

    #[test]
    fn derives_power_from_default_interval() {
        let h = headers(&["ts", "classification_id", "energy_value"]);
        let r = StringRecord::from(vec!["2024-01-01T08:00:00Z", "1", "2.5"]);

        assert_eq!(record_to_reading(&r, &h).unwrap().power, 10.0);
    }

    #[test]
    fn derives_power_from_interval_column() {
        let h = headers(&["ts", "classification_id", "energy_value", "power", "interval_minutes"]);
        let r = StringRecord::from(vec!["2024-01-01T08:00:00Z", "1", "3", "", "60"]);

        assert_eq!(record_to_reading(&r, &h).unwrap().power, 3.0);
    }

    #[test]
    fn rejects_bad_timestamp() {
        let h = headers(&["ts", "classification_id", "energy_value"]);
        let r = StringRecord::from(vec!["yesterday", "1", "2.5"]);

        assert!(matches!(record_to_reading(&r, &h), Err(PipelineError::Source(_))));
    }

    #[test]
    fn rejects_missing_column() {
        let h = headers(&["ts", "energy_value"]);
        let r = StringRecord::from(vec!["2024-01-01T08:00:00Z", "2.5"]);

        assert!(matches!(record_to_reading(&r, &h), Err(PipelineError::Source(_))));
    }

    #[tokio::test]
    async fn stream_continues_past_bad_rows() {
        let path = std::env::temp_dir().join(format!("readings-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "ts,classification_id,energy_value\n\
             2024-01-01T00:00:00Z,1,1.0\n\
             not-a-time,1,1.0\n\
             2024-01-01T00:15:00Z,1,2.0\n",
        )
        .unwrap();

        let items: Vec<_> = ReadingCsvFileSource::new(&path).stream().await.collect().await;
        std::fs::remove_file(&path).ok();

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
        assert_eq!(items[2].as_ref().unwrap().payload.energy_value, 2.0);
    }

    #[tokio::test]
    async fn missing_file_yields_single_error() {
        let items: Vec<_> = ReadingCsvFileSource::new("/nonexistent/readings.csv")
            .stream()
            .await
            .collect()
            .await;

        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
