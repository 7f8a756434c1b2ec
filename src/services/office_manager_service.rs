use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{not_found, validation, ServiceError};
use crate::database::models::{Daycare, OfficeManager, OfficeManagerPatch, User};
use crate::database::{DatabaseError, Repository};
use crate::types::Role;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOfficeManagerRequest {
    pub email: String,
    pub password: String,
    pub daycare_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

pub struct OfficeManagerService {
    repo: Repository<OfficeManager>,
}

impl OfficeManagerService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(OfficeManager::TABLE, pool),
        }
    }

    pub async fn list(&self, daycare_id: Option<Uuid>) -> Result<Vec<OfficeManager>, ServiceError> {
        let rows = match daycare_id {
            Some(id) => self.repo.select_by("daycare_id", id).await?,
            None => self.repo.select_all().await?,
        };
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<OfficeManager, ServiceError> {
        self.repo.select_404(id).await.map_err(not_found)
    }

    /// Creates the login account and the profile in one transaction
    pub async fn create(&self, request: CreateOfficeManagerRequest) -> Result<OfficeManager, ServiceError> {
        let email = validation::email(&request.email)?;
        validation::password(&request.password)?;
        let first_name = validation::name("first_name", &request.first_name)?;
        let last_name = validation::name("last_name", &request.last_name)?;
        let phone = validation::optional_text(request.phone.as_deref());

        let mut tx = self.repo.pool().begin().await?;

        let daycare = Repository::<Daycare>::find_in(&mut *tx, Daycare::TABLE, request.daycare_id).await?;
        if daycare.is_none() {
            return Err(ServiceError::NotFound(format!("daycare {} not found", request.daycare_id)));
        }

        let user = User::insert(&mut *tx, &email, &request.password, Role::OfficeManager)
            .await
            .map_err(duplicate_email)?;
        let manager = OfficeManager::insert(
            &mut *tx,
            user.id,
            request.daycare_id,
            &first_name,
            &last_name,
            phone.as_deref(),
        )
        .await?;

        tx.commit().await?;
        info!("Created office manager {} for daycare {}", manager.id, manager.daycare_id);
        Ok(manager)
    }

    pub async fn update(&self, id: Uuid, mut patch: OfficeManagerPatch) -> Result<OfficeManager, ServiceError> {
        patch.first_name = validation::optional_name("first_name", patch.first_name.as_deref())?;
        patch.last_name = validation::optional_name("last_name", patch.last_name.as_deref())?;
        patch.phone = validation::optional_text(patch.phone.as_deref());

        OfficeManager::update(self.repo.pool(), id, &patch)
            .await
            .map_err(|e| match e {
                DatabaseError::ForeignKeyViolation(_) => {
                    ServiceError::NotFound("daycare not found".to_string())
                }
                other => not_found(other),
            })
    }

    /// Removing the login account cascades to the profile
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let manager = self.get(id).await?;
        User::delete(self.repo.pool(), manager.user_id).await?;
        info!("Deleted office manager {}", id);
        Ok(())
    }
}

/// Unique violation on `users.email` reads better as a conflict
pub(crate) fn duplicate_email(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::UniqueViolation(_) => ServiceError::Conflict("email is already registered".to_string()),
        other => ServiceError::Database(other),
    }
}
