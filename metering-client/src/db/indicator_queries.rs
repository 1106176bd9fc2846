use anyhow::Result;
use sqlx::PgPool;

use crate::domain::{Indicator, NewIndicator};

const INDICATOR_COLUMNS: &str = "id, name, formula, current_value, baseline_value, baseline_status, calculation_date, classification_id";

pub async fn list_indicators(pool: &PgPool) -> Result<Vec<Indicator>> {
    let sql = format!("SELECT {INDICATOR_COLUMNS} FROM enpis ORDER BY id");
    let rows = sqlx::query_as::<_, Indicator>(&sql).fetch_all(pool).await?;

    Ok(rows)
}

pub async fn get_indicator(pool: &PgPool, id: i32) -> Result<Option<Indicator>> {
    let sql = format!("SELECT {INDICATOR_COLUMNS} FROM enpis WHERE id = $1");
    let row = sqlx::query_as::<_, Indicator>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn insert_indicator(pool: &PgPool, new: &NewIndicator) -> Result<Indicator> {
    let sql = format!(
        r#"
        INSERT INTO enpis
            (name, formula, current_value, baseline_value, baseline_status, calculation_date, classification_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {INDICATOR_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Indicator>(&sql)
        .bind(&new.name)
        .bind(new.formula.as_str())
        .bind(new.current_value)
        .bind(new.baseline_value)
        .bind(new.baseline_status.as_str())
        .bind(new.calculation_date)
        .bind(new.classification_id)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

pub async fn delete_indicator(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM enpis WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
