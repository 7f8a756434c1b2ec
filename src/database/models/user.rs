use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::types::Role;

/// Login account. The password hash is never selected into this struct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, email, role, created_at, updated_at";

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    /// Insert a user; the password is hashed by pgcrypto
    pub async fn insert<'e, E>(executor: E, email: &str, password: &str, role: Role) -> Result<User, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "INSERT INTO users (email, password, role) \
             VALUES ($1, crypt($2, gen_salt('bf')), $3) \
             RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password)
            .bind(role.as_str())
            .fetch_one(executor)
            .await?;
        Ok(user)
    }

    /// Returns the user only when the password matches the stored hash
    pub async fn verify_credentials<'e, E>(executor: E, email: &str, password: &str) -> Result<Option<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1) AND password = crypt($2, password)",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn find<'e, E>(executor: E, id: Uuid) -> Result<Option<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn update_password<'e, E>(executor: E, id: Uuid, password: &str) -> Result<(), DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE users SET password = crypt($2, gen_salt('bf')), updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password)
        .execute(executor)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<(), DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
