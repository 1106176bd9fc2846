use anyhow::Result;
use sqlx::PgPool;

use crate::domain::{Baseline, NewBaseline};

pub async fn list_baselines(pool: &PgPool) -> Result<Vec<Baseline>> {
    let rows = sqlx::query_as::<_, Baseline>(
        r#"
        SELECT id, classification_id, start_ts AS start, end_ts AS "end", description
        FROM baselines
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_baseline(pool: &PgPool, id: i32) -> Result<Option<Baseline>> {
    let row = sqlx::query_as::<_, Baseline>(
        r#"
        SELECT id, classification_id, start_ts AS start, end_ts AS "end", description
        FROM baselines
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn insert_baseline(pool: &PgPool, new: &NewBaseline) -> Result<Baseline> {
    let row = sqlx::query_as::<_, Baseline>(
        r#"
        INSERT INTO baselines (classification_id, start_ts, end_ts, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, classification_id, start_ts AS start, end_ts AS "end", description
        "#,
    )
    .bind(new.classification_id)
    .bind(new.start)
    .bind(new.end)
    .bind(&new.description)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn delete_baseline(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM baselines WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
