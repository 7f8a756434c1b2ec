use sqlx::{postgres::PgRow, FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Generic single-table reads and deletes shared by every entity.
///
/// Table and column names are `&'static str` so they can only come from
/// code, never from a request.
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn select_one(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        Self::find_in(&self.pool, self.table_name, id).await
    }

    /// Same as `select_one` but a missing row is an error
    pub async fn select_404(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.select_one(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} record {} not found", self.table_name, id)))
    }

    /// Lookup that can run on a pool or inside a transaction
    pub async fn find_in<'e, E>(executor: E, table_name: &'static str, id: Uuid) -> Result<Option<T>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT * FROM {} WHERE id = $1", table_name);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// All rows, newest first
    pub async fn select_all(&self) -> Result<Vec<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} ORDER BY created_at DESC", self.table_name);
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Rows whose `column` equals `value`, newest first
    pub async fn select_by(&self, column: &'static str, value: Uuid) -> Result<Vec<T>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $1 ORDER BY created_at DESC",
            self.table_name, column
        );
        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn count_by(&self, column: &'static str, value: Uuid) -> Result<i64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", self.table_name, column);
        let (count,): (i64,) = sqlx::query_as(&sql).bind(value).fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table_name);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} record {} not found", self.table_name, id)));
        }
        Ok(())
    }
}
