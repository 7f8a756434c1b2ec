use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OfficeManager {
    pub id: Uuid,
    pub user_id: Uuid,
    pub daycare_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfficeManagerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub daycare_id: Option<Uuid>,
}

impl OfficeManager {
    pub const TABLE: &'static str = "office_managers";

    pub async fn insert<'e, E>(
        executor: E,
        user_id: Uuid,
        daycare_id: Uuid,
        first_name: &str,
        last_name: &str,
        phone: Option<&str>,
    ) -> Result<OfficeManager, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, OfficeManager>(
            r#"
            INSERT INTO office_managers (user_id, daycare_id, first_name, last_name, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(daycare_id)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn find_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Option<OfficeManager>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, OfficeManager>("SELECT * FROM office_managers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn update<'e, E>(executor: E, id: Uuid, patch: &OfficeManagerPatch) -> Result<OfficeManager, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, OfficeManager>(
            r#"
            UPDATE office_managers SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                daycare_id = COALESCE($5, daycare_id),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.phone)
        .bind(patch.daycare_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("office manager {} not found", id)))
    }
}
