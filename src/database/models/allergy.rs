use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Allergy {
    pub id: Uuid,
    pub child_id: Uuid,
    pub name: String,
    pub severity: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAllergy {
    pub name: String,
    pub severity: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllergyPatch {
    pub name: Option<String>,
    pub severity: Option<String>,
    pub notes: Option<String>,
}

impl Allergy {
    pub const TABLE: &'static str = "allergies";

    pub async fn insert<'e, E>(executor: E, child_id: Uuid, new: &NewAllergy) -> Result<Allergy, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, Allergy>(
            "INSERT INTO allergies (child_id, name, severity, notes) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(child_id)
        .bind(&new.name)
        .bind(&new.severity)
        .bind(&new.notes)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn update<'e, E>(executor: E, id: Uuid, patch: &AllergyPatch) -> Result<Allergy, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Allergy>(
            r#"
            UPDATE allergies SET
                name = COALESCE($2, name),
                severity = COALESCE($3, severity),
                notes = COALESCE($4, notes),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.severity)
        .bind(&patch.notes)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("allergy {} not found", id)))
    }
}
