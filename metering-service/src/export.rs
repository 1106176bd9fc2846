use anyhow::{anyhow, Result};
use metering_client::domain::Reading;
use time::format_description::well_known::Rfc3339;

/// Render readings as CSV. The columns are the ones the CSV import source
/// reads (plus `id`, which it ignores), so an export can be re-imported.
pub fn readings_to_csv(readings: &[Reading]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["id", "ts", "classification_id", "energy_value", "power"])?;

    for r in readings {
        wtr.write_record([
            r.id.to_string(),
            r.ts.format(&Rfc3339)?,
            r.classification_id.to_string(),
            r.energy_value.to_string(),
            r.power.to_string(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("failed to flush CSV writer: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}
