use anyhow::Result;
use sqlx::PgPool;

use crate::domain::{Classification, NewClassification};

pub async fn list_classifications(pool: &PgPool) -> Result<Vec<Classification>> {
    let rows = sqlx::query_as::<_, Classification>(
        r#"
        SELECT id, name, type
        FROM classifications
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_classification(pool: &PgPool, id: i32) -> Result<Option<Classification>> {
    let row = sqlx::query_as::<_, Classification>(
        r#"
        SELECT id, name, type
        FROM classifications
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn insert_classification(pool: &PgPool, new: &NewClassification) -> Result<Classification> {
    let row = sqlx::query_as::<_, Classification>(
        r#"
        INSERT INTO classifications (name, type)
        VALUES ($1, $2)
        RETURNING id, name, type
        "#,
    )
    .bind(&new.name)
    .bind(new.kind.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn update_classification(
    pool: &PgPool,
    id: i32,
    new: &NewClassification,
) -> Result<Option<Classification>> {
    let row = sqlx::query_as::<_, Classification>(
        r#"
        UPDATE classifications
        SET name = $2, type = $3
        WHERE id = $1
        RETURNING id, name, type
        "#,
    )
    .bind(id)
    .bind(&new.name)
    .bind(new.kind.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Delete a classification. Readings, indicators, baselines and EnPI
/// definitions (with their targets) go with it through `ON DELETE CASCADE`.
pub async fn delete_classification(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM classifications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
