use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Child {
    pub id: Uuid,
    pub daycare_id: Uuid,
    pub class_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated column values for a new child
#[derive(Debug, Clone)]
pub struct NewChild {
    pub daycare_id: Uuid,
    pub class_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: String,
}

/// Partial update. `birth_date` is already parsed by the service.
#[derive(Debug, Clone, Default)]
pub struct ChildPatch {
    pub class_id: Option<Uuid>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
}

impl Child {
    pub const TABLE: &'static str = "children";

    pub async fn insert<'e, E>(executor: E, new: &NewChild) -> Result<Child, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, Child>(
            r#"
            INSERT INTO children (daycare_id, class_id, first_name, last_name, birth_date, gender)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.daycare_id)
        .bind(new.class_id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(new.birth_date)
        .bind(&new.gender)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn update<'e, E>(executor: E, id: Uuid, patch: &ChildPatch) -> Result<Child, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Child>(
            r#"
            UPDATE children SET
                class_id = COALESCE($2, class_id),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                birth_date = COALESCE($5, birth_date),
                gender = COALESCE($6, gender),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.class_id)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(patch.birth_date)
        .bind(&patch.gender)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("child {} not found", id)))
    }

    /// Detach a child from its class
    pub async fn clear_class<'e, E>(executor: E, id: Uuid) -> Result<Child, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Child>(
            "UPDATE children SET class_id = NULL, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("child {} not found", id)))
    }

    pub async fn set_image_url<'e, E>(executor: E, id: Uuid, image_url: &str) -> Result<Child, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Child>(
            "UPDATE children SET image_url = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(image_url)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("child {} not found", id)))
    }
}
