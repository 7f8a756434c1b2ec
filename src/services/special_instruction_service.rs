use sqlx::PgPool;
use uuid::Uuid;

use super::child_service::instruction_text;
use super::{not_found, ChildService, Scope, ServiceError};
use crate::database::models::{NewSpecialInstruction, SpecialInstruction, SpecialInstructionPatch};
use crate::database::Repository;

pub struct SpecialInstructionService {
    repo: Repository<SpecialInstruction>,
    children: ChildService,
}

impl SpecialInstructionService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(SpecialInstruction::TABLE, pool.clone()),
            children: ChildService::new(pool),
        }
    }

    pub async fn list(&self, scope: &Scope, child_id: Uuid) -> Result<Vec<SpecialInstruction>, ServiceError> {
        self.children.find(scope, child_id).await?;
        Ok(self.repo.select_by("child_id", child_id).await?)
    }

    pub async fn get(&self, scope: &Scope, child_id: Uuid, id: Uuid) -> Result<SpecialInstruction, ServiceError> {
        self.children.find(scope, child_id).await?;
        let instruction = self.repo.select_404(id).await.map_err(not_found)?;
        if instruction.child_id != child_id {
            return Err(ServiceError::NotFound(format!("special instruction {} not found", id)));
        }
        Ok(instruction)
    }

    pub async fn create(&self, scope: &Scope, child_id: Uuid, new: NewSpecialInstruction) -> Result<SpecialInstruction, ServiceError> {
        self.children.find(scope, child_id).await?;
        let text = instruction_text(&new.instruction)?;
        Ok(SpecialInstruction::insert(self.repo.pool(), child_id, &text).await?)
    }

    pub async fn update(
        &self,
        scope: &Scope,
        child_id: Uuid,
        id: Uuid,
        patch: SpecialInstructionPatch,
    ) -> Result<SpecialInstruction, ServiceError> {
        let current = self.get(scope, child_id, id).await?;
        match patch.instruction {
            Some(raw) => {
                let text = instruction_text(&raw)?;
                SpecialInstruction::update(self.repo.pool(), id, &text).await.map_err(not_found)
            }
            None => Ok(current),
        }
    }

    pub async fn delete(&self, scope: &Scope, child_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        self.get(scope, child_id, id).await?;
        self.repo.delete(id).await.map_err(not_found)
    }
}
