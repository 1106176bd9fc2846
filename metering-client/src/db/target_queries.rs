use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{NewTarget, Target};

const TARGET_COLUMNS: &str = "id, definition_id, target_type, target_value, target_date, description";

/// All targets, or only those of one definition.
pub async fn list_targets(pool: &PgPool, definition_id: Option<i32>) -> Result<Vec<Target>> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {TARGET_COLUMNS} FROM targets"));
    if let Some(id) = definition_id {
        builder.push(" WHERE definition_id = ").push_bind(id);
    }
    builder.push(" ORDER BY id");

    let rows = builder.build_query_as::<Target>().fetch_all(pool).await?;

    Ok(rows)
}

pub async fn get_target(pool: &PgPool, id: i32) -> Result<Option<Target>> {
    let sql = format!("SELECT {TARGET_COLUMNS} FROM targets WHERE id = $1");
    let row = sqlx::query_as::<_, Target>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn insert_target(pool: &PgPool, new: &NewTarget) -> Result<Target> {
    let sql = format!(
        r#"
        INSERT INTO targets (definition_id, target_type, target_value, target_date, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {TARGET_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Target>(&sql)
        .bind(new.definition_id)
        .bind(new.kind.as_str())
        .bind(new.target_value)
        .bind(new.target_date)
        .bind(&new.description)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

pub async fn update_target(pool: &PgPool, id: i32, new: &NewTarget) -> Result<Option<Target>> {
    let sql = format!(
        r#"
        UPDATE targets
        SET definition_id = $2, target_type = $3, target_value = $4, target_date = $5, description = $6
        WHERE id = $1
        RETURNING {TARGET_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Target>(&sql)
        .bind(id)
        .bind(new.definition_id)
        .bind(new.kind.as_str())
        .bind(new.target_value)
        .bind(new.target_date)
        .bind(&new.description)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn delete_target(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM targets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
