use sqlx::PgPool;
use uuid::Uuid;

use super::{not_found, validation, Scope, ServiceError};
use crate::database::models::{AgeRange, AgeRangePatch, NewAgeRange};
use crate::database::Repository;

pub struct AgeRangeService {
    repo: Repository<AgeRange>,
}

impl AgeRangeService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(AgeRange::TABLE, pool),
        }
    }

    pub async fn list(&self, scope: &Scope, daycare_id: Option<Uuid>) -> Result<Vec<AgeRange>, ServiceError> {
        let mut rows = match scope.list_filter(daycare_id) {
            Some(id) => self.repo.select_by("daycare_id", id).await?,
            None => self.repo.select_all().await?,
        };
        rows.sort_by_key(|r| (r.min_months, r.max_months));
        Ok(rows)
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<AgeRange, ServiceError> {
        let range = self.repo.select_404(id).await.map_err(not_found)?;
        scope.check(range.daycare_id, range, "age range", id)
    }

    pub async fn create(&self, scope: &Scope, mut new: NewAgeRange) -> Result<AgeRange, ServiceError> {
        let daycare_id = scope.resolve_daycare(new.daycare_id)?;
        new.name = validation::name("name", &new.name)?;
        validation::months_range(new.min_months, new.max_months)?;

        Ok(AgeRange::insert(self.repo.pool(), daycare_id, &new).await?)
    }

    pub async fn update(&self, scope: &Scope, id: Uuid, mut patch: AgeRangePatch) -> Result<AgeRange, ServiceError> {
        let current = self.get(scope, id).await?;
        patch.name = validation::optional_name("name", patch.name.as_deref())?;
        // Check the bounds as they will be after the update
        validation::months_range(
            patch.min_months.unwrap_or(current.min_months),
            patch.max_months.unwrap_or(current.max_months),
        )?;

        AgeRange::update(self.repo.pool(), id, &patch).await.map_err(not_found)
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), ServiceError> {
        self.get(scope, id).await?;
        self.repo.delete(id).await.map_err(not_found)
    }
}
