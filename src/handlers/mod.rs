// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (JWT auth, then a role gate per route group)

pub mod protected;
pub mod public;

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::error::ApiError;

/// Optional list filters shared by the collection endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub daycare_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
}

pub(crate) async fn pool() -> Result<PgPool, ApiError> {
    Ok(DatabaseManager::pool().await?)
}
