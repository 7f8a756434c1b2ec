use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{not_found, validation, Scope, ServiceError};
use crate::database::models::{Daycare, DaycarePatch, NewDaycare};
use crate::database::Repository;

pub struct DaycareService {
    repo: Repository<Daycare>,
}

impl DaycareService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(Daycare::TABLE, pool),
        }
    }

    /// Admins see every daycare, office managers only their own
    pub async fn list(&self, scope: &Scope) -> Result<Vec<Daycare>, ServiceError> {
        match scope {
            Scope::All => Ok(self.repo.select_all().await?),
            Scope::Daycare(own) => Ok(self.repo.select_one(*own).await?.into_iter().collect()),
        }
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<Daycare, ServiceError> {
        let daycare = self.repo.select_404(id).await.map_err(not_found)?;
        scope.check(daycare.id, daycare, "daycare", id)
    }

    pub async fn create(&self, mut new: NewDaycare) -> Result<Daycare, ServiceError> {
        new.name = validation::name("name", &new.name)?;
        new.address = validation::optional_text(new.address.as_deref());
        new.phone = validation::optional_text(new.phone.as_deref());
        new.email = new.email.as_deref().map(validation::email).transpose()?;

        let daycare = Daycare::insert(self.repo.pool(), &new).await?;
        info!("Created daycare {} ({})", daycare.name, daycare.id);
        Ok(daycare)
    }

    pub async fn update(&self, id: Uuid, mut patch: DaycarePatch) -> Result<Daycare, ServiceError> {
        patch.name = validation::optional_name("name", patch.name.as_deref())?;
        patch.address = validation::optional_text(patch.address.as_deref());
        patch.phone = validation::optional_text(patch.phone.as_deref());
        patch.email = patch.email.as_deref().map(validation::email).transpose()?;

        Daycare::update(self.repo.pool(), id, &patch).await.map_err(not_found)
    }

    /// Deleting a daycare cascades to everything it owns, including the
    /// login accounts of its staff and responsibles.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.repo.pool().begin().await?;

        let accounts = sqlx::query(
            r#"
            DELETE FROM users WHERE id IN (
                SELECT user_id FROM office_managers WHERE daycare_id = $1
                UNION
                SELECT user_id FROM adult_responsibles WHERE daycare_id = $1
            )
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM daycares WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(ServiceError::NotFound(format!("daycare {} not found", id)));
        }

        tx.commit().await?;
        info!("Deleted daycare {} and {} user accounts", id, accounts.rows_affected());
        Ok(())
    }
}
