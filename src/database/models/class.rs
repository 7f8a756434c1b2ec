use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// A group of children within a daycare
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Class {
    pub id: Uuid,
    pub daycare_id: Uuid,
    pub age_range_id: Option<Uuid>,
    pub name: String,
    pub capacity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewClass {
    pub daycare_id: Option<Uuid>,
    pub age_range_id: Option<Uuid>,
    pub name: String,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassPatch {
    pub age_range_id: Option<Uuid>,
    pub name: Option<String>,
    pub capacity: Option<i32>,
}

impl Class {
    pub const TABLE: &'static str = "classes";

    pub async fn insert<'e, E>(executor: E, daycare_id: Uuid, new: &NewClass) -> Result<Class, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, Class>(
            "INSERT INTO classes (daycare_id, age_range_id, name, capacity) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(daycare_id)
        .bind(new.age_range_id)
        .bind(&new.name)
        .bind(new.capacity)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn update<'e, E>(executor: E, id: Uuid, patch: &ClassPatch) -> Result<Class, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Class>(
            r#"
            UPDATE classes SET
                age_range_id = COALESCE($2, age_range_id),
                name = COALESCE($3, name),
                capacity = COALESCE($4, capacity),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.age_range_id)
        .bind(&patch.name)
        .bind(patch.capacity)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("class {} not found", id)))
    }
}
