use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SpecialInstruction {
    pub id: Uuid,
    pub child_id: Uuid,
    pub instruction: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSpecialInstruction {
    pub instruction: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecialInstructionPatch {
    pub instruction: Option<String>,
}

impl SpecialInstruction {
    pub const TABLE: &'static str = "special_instructions";

    pub async fn insert<'e, E>(executor: E, child_id: Uuid, instruction: &str) -> Result<SpecialInstruction, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, SpecialInstruction>(
            "INSERT INTO special_instructions (child_id, instruction) VALUES ($1, $2) RETURNING *",
        )
        .bind(child_id)
        .bind(instruction)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn update<'e, E>(executor: E, id: Uuid, instruction: &str) -> Result<SpecialInstruction, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, SpecialInstruction>(
            "UPDATE special_instructions SET instruction = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(instruction)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("special instruction {} not found", id)))
    }
}
