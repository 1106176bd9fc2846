use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{NewReading, Reading, ReadingFilter};

/// Postgres caps a statement at 65535 bind parameters; each reading binds four.
const INSERT_CHUNK: usize = 10_000;

/// Fetch readings matching `filter`, ordered by timestamp. Bounds are inclusive.
pub async fn list_readings(pool: &PgPool, filter: &ReadingFilter) -> Result<Vec<Reading>> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT id, ts, classification_id, energy_value, power FROM metering_data WHERE TRUE",
    );

    if let Some(id) = filter.classification_id {
        builder.push(" AND classification_id = ").push_bind(id);
    }
    if let Some(start) = filter.start {
        builder.push(" AND ts >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        builder.push(" AND ts <= ").push_bind(end);
    }
    builder.push(" ORDER BY ts, id");

    let rows = builder.build_query_as::<Reading>().fetch_all(pool).await?;

    Ok(rows)
}

/// Insert readings in one transaction, returning them with their new ids in
/// input order.
pub async fn insert_readings(pool: &PgPool, readings: &[NewReading]) -> Result<Vec<Reading>> {
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(readings.len());

    for chunk in readings.chunks(INSERT_CHUNK) {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO metering_data (ts, classification_id, energy_value, power) ",
        );
        builder.push_values(chunk, |mut b, r| {
            b.push_bind(r.ts)
                .push_bind(r.classification_id)
                .push_bind(r.energy_value)
                .push_bind(r.power);
        });
        builder.push(" RETURNING id, ts, classification_id, energy_value, power");

        let mut rows = builder.build_query_as::<Reading>().fetch_all(&mut *tx).await?;
        // ids are assigned in VALUES order; RETURNING itself is unordered.
        rows.sort_by_key(|r| r.id);
        inserted.extend(rows);
    }

    tx.commit().await?;

    Ok(inserted)
}
