use sqlx::PgPool;
use uuid::Uuid;

use super::child_service::normalize_allergy;
use super::{not_found, validation, ChildService, Scope, ServiceError};
use crate::database::models::{Allergy, AllergyPatch, NewAllergy};
use crate::database::Repository;

/// Allergies are always addressed through their child, which carries the daycare
pub struct AllergyService {
    repo: Repository<Allergy>,
    children: ChildService,
}

impl AllergyService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(Allergy::TABLE, pool.clone()),
            children: ChildService::new(pool),
        }
    }

    pub async fn list(&self, scope: &Scope, child_id: Uuid) -> Result<Vec<Allergy>, ServiceError> {
        self.children.find(scope, child_id).await?;
        Ok(self.repo.select_by("child_id", child_id).await?)
    }

    pub async fn get(&self, scope: &Scope, child_id: Uuid, id: Uuid) -> Result<Allergy, ServiceError> {
        self.children.find(scope, child_id).await?;
        let allergy = self.repo.select_404(id).await.map_err(not_found)?;
        if allergy.child_id != child_id {
            return Err(ServiceError::NotFound(format!("allergy {} not found", id)));
        }
        Ok(allergy)
    }

    pub async fn create(&self, scope: &Scope, child_id: Uuid, new: NewAllergy) -> Result<Allergy, ServiceError> {
        self.children.find(scope, child_id).await?;
        let new = normalize_allergy(new)?;
        Ok(Allergy::insert(self.repo.pool(), child_id, &new).await?)
    }

    pub async fn update(&self, scope: &Scope, child_id: Uuid, id: Uuid, mut patch: AllergyPatch) -> Result<Allergy, ServiceError> {
        self.get(scope, child_id, id).await?;
        patch.name = validation::optional_name("allergy name", patch.name.as_deref())?;
        patch.severity = validation::optional_text(patch.severity.as_deref());
        patch.notes = validation::optional_text(patch.notes.as_deref());
        Allergy::update(self.repo.pool(), id, &patch).await.map_err(not_found)
    }

    pub async fn delete(&self, scope: &Scope, child_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        self.get(scope, child_id, id).await?;
        self.repo.delete(id).await.map_err(not_found)
    }
}
