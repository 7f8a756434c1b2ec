use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Age bracket in months, e.g. "Toddlers" 12..=36
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AgeRange {
    pub id: Uuid,
    pub daycare_id: Uuid,
    pub name: String,
    pub min_months: i32,
    pub max_months: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAgeRange {
    pub daycare_id: Option<Uuid>,
    pub name: String,
    pub min_months: i32,
    pub max_months: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgeRangePatch {
    pub name: Option<String>,
    pub min_months: Option<i32>,
    pub max_months: Option<i32>,
}

impl AgeRange {
    pub const TABLE: &'static str = "age_ranges";

    pub fn contains_months(&self, months: i32) -> bool {
        (self.min_months..=self.max_months).contains(&months)
    }

    pub async fn insert<'e, E>(executor: E, daycare_id: Uuid, new: &NewAgeRange) -> Result<AgeRange, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, AgeRange>(
            "INSERT INTO age_ranges (daycare_id, name, min_months, max_months) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(daycare_id)
        .bind(&new.name)
        .bind(new.min_months)
        .bind(new.max_months)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn update<'e, E>(executor: E, id: Uuid, patch: &AgeRangePatch) -> Result<AgeRange, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, AgeRange>(
            r#"
            UPDATE age_ranges SET
                name = COALESCE($2, name),
                min_months = COALESCE($3, min_months),
                max_months = COALESCE($4, max_months),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.min_months)
        .bind(patch.max_months)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("age range {} not found", id)))
    }
}
