use anyhow::Result;
use sqlx::PgPool;

use crate::domain::{EnpiDefinition, NewEnpiDefinition};

const DEFINITION_COLUMNS: &str =
    "id, name, classification_id, formula, normalize_by, normalization_unit, description, created_at";

pub async fn list_definitions(pool: &PgPool) -> Result<Vec<EnpiDefinition>> {
    let sql = format!("SELECT {DEFINITION_COLUMNS} FROM enpi_definitions ORDER BY id");
    let rows = sqlx::query_as::<_, EnpiDefinition>(&sql).fetch_all(pool).await?;

    Ok(rows)
}

pub async fn get_definition(pool: &PgPool, id: i32) -> Result<Option<EnpiDefinition>> {
    let sql = format!("SELECT {DEFINITION_COLUMNS} FROM enpi_definitions WHERE id = $1");
    let row = sqlx::query_as::<_, EnpiDefinition>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn insert_definition(pool: &PgPool, new: &NewEnpiDefinition) -> Result<EnpiDefinition> {
    let sql = format!(
        r#"
        INSERT INTO enpi_definitions
            (name, classification_id, formula, normalize_by, normalization_unit, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {DEFINITION_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, EnpiDefinition>(&sql)
        .bind(&new.name)
        .bind(new.classification_id)
        .bind(new.formula.as_str())
        .bind(&new.normalize_by)
        .bind(&new.normalization_unit)
        .bind(&new.description)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Replace every field except `created_at`.
pub async fn update_definition(
    pool: &PgPool,
    id: i32,
    new: &NewEnpiDefinition,
) -> Result<Option<EnpiDefinition>> {
    let sql = format!(
        r#"
        UPDATE enpi_definitions
        SET name = $2, classification_id = $3, formula = $4,
            normalize_by = $5, normalization_unit = $6, description = $7
        WHERE id = $1
        RETURNING {DEFINITION_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, EnpiDefinition>(&sql)
        .bind(id)
        .bind(&new.name)
        .bind(new.classification_id)
        .bind(new.formula.as_str())
        .bind(&new.normalize_by)
        .bind(&new.normalization_unit)
        .bind(&new.description)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Targets attached to the definition are removed by `ON DELETE CASCADE`.
pub async fn delete_definition(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM enpi_definitions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
