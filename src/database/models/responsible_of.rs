use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::types::Relationship;

/// Link row between an adult responsible and a child
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResponsibleOf {
    pub responsible_id: Uuid,
    pub child_id: Uuid,
    pub relationship: String,
    pub created_at: DateTime<Utc>,
}

/// A responsible as seen from one of their children
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LinkedResponsible {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub phone: Option<String>,
    pub relationship: String,
}

/// A child as seen from one of their responsibles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LinkedChild {
    pub id: Uuid,
    pub daycare_id: Uuid,
    pub class_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub image_url: Option<String>,
    pub relationship: String,
}

impl ResponsibleOf {
    pub const TABLE: &'static str = "responsible_of";

    pub async fn insert<'e, E>(
        executor: E,
        responsible_id: Uuid,
        child_id: Uuid,
        relationship: Relationship,
    ) -> Result<ResponsibleOf, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, ResponsibleOf>(
            r#"
            INSERT INTO responsible_of (responsible_id, child_id, relationship)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(responsible_id)
        .bind(child_id)
        .bind(relationship.as_str())
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn delete<'e, E>(executor: E, responsible_id: Uuid, child_id: Uuid) -> Result<(), DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM responsible_of WHERE responsible_id = $1 AND child_id = $2")
            .bind(responsible_id)
            .bind(child_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "responsible {} is not linked to child {}",
                responsible_id, child_id
            )));
        }
        Ok(())
    }

    pub async fn count_for_child<'e, E>(executor: E, child_id: Uuid) -> Result<i64, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM responsible_of WHERE child_id = $1")
            .bind(child_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn exists<'e, E>(executor: E, responsible_id: Uuid, child_id: Uuid) -> Result<bool, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let (found,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM responsible_of WHERE responsible_id = $1 AND child_id = $2)",
        )
        .bind(responsible_id)
        .bind(child_id)
        .fetch_one(executor)
        .await?;
        Ok(found)
    }

    pub async fn responsibles_of_child<'e, E>(executor: E, child_id: Uuid) -> Result<Vec<LinkedResponsible>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, LinkedResponsible>(
            r#"
            SELECT a.id, a.first_name, a.last_name, a.gender, a.phone, r.relationship
            FROM adult_responsibles a
            JOIN responsible_of r ON r.responsible_id = a.id
            WHERE r.child_id = $1
            ORDER BY r.created_at
            "#,
        )
        .bind(child_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn children_of_responsible<'e, E>(executor: E, responsible_id: Uuid) -> Result<Vec<LinkedChild>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, LinkedChild>(
            r#"
            SELECT c.id, c.daycare_id, c.class_id, c.first_name, c.last_name,
                   c.birth_date, c.gender, c.image_url, r.relationship
            FROM children c
            JOIN responsible_of r ON r.child_id = c.id
            WHERE r.responsible_id = $1
            ORDER BY c.last_name, c.first_name
            "#,
        )
        .bind(responsible_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
