use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::office_manager_service::duplicate_email;
use super::{not_found, validation, Scope, ServiceError};
use crate::database::models::{
    AdultResponsible, Daycare, LinkedChild, NewResponsibleRow, ResponsibleOf, ResponsiblePatch, User,
};
use crate::database::Repository;
use crate::types::Role;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateResponsibleRequest {
    pub email: String,
    pub password: String,
    pub daycare_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub struct ResponsibleService {
    repo: Repository<AdultResponsible>,
}

impl ResponsibleService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(AdultResponsible::TABLE, pool),
        }
    }

    pub async fn list(&self, scope: &Scope, daycare_id: Option<Uuid>) -> Result<Vec<AdultResponsible>, ServiceError> {
        let rows = match scope.list_filter(daycare_id) {
            Some(id) => self.repo.select_by("daycare_id", id).await?,
            None => self.repo.select_all().await?,
        };
        Ok(rows)
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<AdultResponsible, ServiceError> {
        let responsible = self.repo.select_404(id).await.map_err(not_found)?;
        scope.check(responsible.daycare_id, responsible, "adult responsible", id)
    }

    /// Profile of the responsible owning the given login account
    pub async fn get_by_user(&self, user_id: Uuid) -> Result<AdultResponsible, ServiceError> {
        AdultResponsible::find_by_user(self.repo.pool(), user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("no responsible profile for this account".to_string()))
    }

    /// Inserts the login account and the responsible row in one transaction
    pub async fn create(&self, scope: &Scope, request: CreateResponsibleRequest) -> Result<AdultResponsible, ServiceError> {
        let daycare_id = scope.resolve_daycare(request.daycare_id)?;
        let email = validation::email(&request.email)?;
        validation::password(&request.password)?;
        let first_name = validation::name("first_name", &request.first_name)?;
        let last_name = validation::name("last_name", &request.last_name)?;
        let gender = validation::gender(&request.gender)?;
        let phone = validation::optional_text(request.phone.as_deref());
        let address = validation::optional_text(request.address.as_deref());

        let mut tx = self.repo.pool().begin().await?;

        if Repository::<Daycare>::find_in(&mut *tx, Daycare::TABLE, daycare_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("daycare {} not found", daycare_id)));
        }

        let user = User::insert(&mut *tx, &email, &request.password, Role::Responsible)
            .await
            .map_err(duplicate_email)?;
        let responsible = AdultResponsible::insert(
            &mut *tx,
            &NewResponsibleRow {
                user_id: user.id,
                daycare_id,
                first_name: &first_name,
                last_name: &last_name,
                gender: gender.as_str(),
                phone: phone.as_deref(),
                address: address.as_deref(),
            },
        )
        .await?;

        tx.commit().await?;
        info!("Created adult responsible {} in daycare {}", responsible.id, daycare_id);
        Ok(responsible)
    }

    pub async fn update(&self, scope: &Scope, id: Uuid, mut patch: ResponsiblePatch) -> Result<AdultResponsible, ServiceError> {
        self.get(scope, id).await?;

        patch.first_name = validation::optional_name("first_name", patch.first_name.as_deref())?;
        patch.last_name = validation::optional_name("last_name", patch.last_name.as_deref())?;
        patch.gender = patch
            .gender
            .as_deref()
            .map(|g| validation::gender(g).map(|g| g.as_str().to_string()))
            .transpose()?;
        patch.phone = validation::optional_text(patch.phone.as_deref());
        patch.address = validation::optional_text(patch.address.as_deref());

        AdultResponsible::update(self.repo.pool(), id, &patch).await.map_err(not_found)
    }

    /// Removes the login account, which cascades to the profile and its links
    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), ServiceError> {
        let responsible = self.get(scope, id).await?;
        User::delete(self.repo.pool(), responsible.user_id).await?;
        info!("Deleted adult responsible {}", id);
        Ok(())
    }

    pub async fn children(&self, scope: &Scope, id: Uuid) -> Result<Vec<LinkedChild>, ServiceError> {
        self.get(scope, id).await?;
        Ok(ResponsibleOf::children_of_responsible(self.repo.pool(), id).await?)
    }
}
