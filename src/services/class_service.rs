use sqlx::PgPool;
use uuid::Uuid;

use super::{not_found, validation, Scope, ServiceError};
use crate::database::models::{AgeRange, Child, Class, ClassPatch, NewClass};
use crate::database::Repository;

pub struct ClassService {
    repo: Repository<Class>,
}

impl ClassService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(Class::TABLE, pool),
        }
    }

    pub async fn list(&self, scope: &Scope, daycare_id: Option<Uuid>) -> Result<Vec<Class>, ServiceError> {
        let rows = match scope.list_filter(daycare_id) {
            Some(id) => self.repo.select_by("daycare_id", id).await?,
            None => self.repo.select_all().await?,
        };
        Ok(rows)
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<Class, ServiceError> {
        let class = self.repo.select_404(id).await.map_err(not_found)?;
        scope.check(class.daycare_id, class, "class", id)
    }

    pub async fn create(&self, scope: &Scope, mut new: NewClass) -> Result<Class, ServiceError> {
        let daycare_id = scope.resolve_daycare(new.daycare_id)?;
        new.name = validation::name("name", &new.name)?;
        validation::capacity(new.capacity)?;
        if let Some(age_range_id) = new.age_range_id {
            self.check_age_range(age_range_id, daycare_id).await?;
        }

        Ok(Class::insert(self.repo.pool(), daycare_id, &new).await?)
    }

    pub async fn update(&self, scope: &Scope, id: Uuid, mut patch: ClassPatch) -> Result<Class, ServiceError> {
        let class = self.get(scope, id).await?;
        patch.name = validation::optional_name("name", patch.name.as_deref())?;
        validation::capacity(patch.capacity)?;
        if let Some(age_range_id) = patch.age_range_id {
            self.check_age_range(age_range_id, class.daycare_id).await?;
        }

        Class::update(self.repo.pool(), id, &patch).await.map_err(not_found)
    }

    /// Children in the class are detached, not deleted
    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), ServiceError> {
        self.get(scope, id).await?;
        self.repo.delete(id).await.map_err(not_found)
    }

    pub async fn children(&self, scope: &Scope, id: Uuid) -> Result<Vec<Child>, ServiceError> {
        self.get(scope, id).await?;
        let children = Repository::<Child>::new(Child::TABLE, self.repo.pool().clone());
        Ok(children.select_by("class_id", id).await?)
    }

    async fn check_age_range(&self, age_range_id: Uuid, daycare_id: Uuid) -> Result<(), ServiceError> {
        let range = Repository::<AgeRange>::find_in(self.repo.pool(), AgeRange::TABLE, age_range_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("age range {} not found", age_range_id)))?;
        if range.daycare_id != daycare_id {
            return Err(ServiceError::DaycareMismatch(format!(
                "age range {} belongs to another daycare",
                age_range_id
            )));
        }
        Ok(())
    }
}
