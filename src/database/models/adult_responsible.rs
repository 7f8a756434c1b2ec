use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdultResponsible {
    pub id: Uuid,
    pub user_id: Uuid,
    pub daycare_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated column values for a new row
#[derive(Debug, Clone)]
pub struct NewResponsibleRow<'a> {
    pub user_id: Uuid,
    pub daycare_id: Uuid,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub gender: &'a str,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsiblePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl AdultResponsible {
    pub const TABLE: &'static str = "adult_responsibles";

    pub async fn insert<'e, E>(executor: E, new: &NewResponsibleRow<'_>) -> Result<AdultResponsible, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, AdultResponsible>(
            r#"
            INSERT INTO adult_responsibles (user_id, daycare_id, first_name, last_name, gender, phone, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.daycare_id)
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.gender)
        .bind(new.phone)
        .bind(new.address)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn find_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Option<AdultResponsible>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, AdultResponsible>("SELECT * FROM adult_responsibles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn update<'e, E>(executor: E, id: Uuid, patch: &ResponsiblePatch) -> Result<AdultResponsible, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, AdultResponsible>(
            r#"
            UPDATE adult_responsibles SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                gender = COALESCE($4, gender),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.gender)
        .bind(&patch.phone)
        .bind(&patch.address)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("adult responsible {} not found", id)))
    }

    pub async fn set_image_url<'e, E>(executor: E, id: Uuid, image_url: &str) -> Result<AdultResponsible, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, AdultResponsible>(
            "UPDATE adult_responsibles SET image_url = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(image_url)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("adult responsible {} not found", id)))
    }
}
