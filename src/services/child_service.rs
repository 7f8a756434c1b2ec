//! Children: enrollment, CRUD, and responsible links.
//!
//! Enrollment writes the child, its first `responsible_of` link, and any
//! initial allergies and special instructions in a single transaction.
//! Any failure rolls the whole thing back.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::{PgConnection, PgPool};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{not_found, validation, Scope, ServiceError};
use crate::database::models::{
    AdultResponsible, AgeRange, Allergy, Child, ChildPatch, Class, LinkedResponsible, NewAllergy, NewChild,
    ResponsibleOf, SpecialInstruction,
};
use crate::database::{DatabaseError, Repository};
use crate::types::{Gender, Relationship};

#[derive(Debug, Clone, Deserialize)]
pub struct AddChildRequest {
    pub first_name: String,
    pub last_name: String,
    /// Free-form; anything that is not a parseable date string is `InvalidDate`
    #[serde(default, deserialize_with = "lenient_string")]
    pub birth_date: Option<String>,
    pub gender: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub responsible_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub relationship: Option<String>,
    pub daycare_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
    #[serde(default)]
    pub allergies: Vec<NewAllergy>,
    #[serde(default)]
    pub special_instructions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateChildRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub class_id: Option<Uuid>,
    /// Detach from the current class; wins over `class_id`
    #[serde(default)]
    pub clear_class: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkRequest {
    pub responsible_id: Uuid,
    #[serde(default, deserialize_with = "lenient_string")]
    pub relationship: Option<String>,
}

/// Accept any JSON value where a string is expected. Non-strings keep their
/// JSON text so validation can report them with the domain error.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Result of a successful enrollment
#[derive(Debug, Clone, Serialize)]
pub struct EnrolledChild {
    pub child: Child,
    pub link: ResponsibleOf,
    pub allergies: Vec<Allergy>,
    pub special_instructions: Vec<SpecialInstruction>,
}

/// A child together with everything hanging off it
#[derive(Debug, Clone, Serialize)]
pub struct ChildDetail {
    #[serde(flatten)]
    pub child: Child,
    pub responsibles: Vec<LinkedResponsible>,
    pub allergies: Vec<Allergy>,
    pub special_instructions: Vec<SpecialInstruction>,
}

/// An enrollment request that passed every check not needing the database
#[derive(Debug, Clone)]
pub struct ValidatedEnrollment {
    first_name: String,
    last_name: String,
    birth_date: NaiveDate,
    gender: Gender,
    responsible_id: Uuid,
    relationship: Relationship,
    daycare_id: Option<Uuid>,
    class_id: Option<Uuid>,
    allergies: Vec<NewAllergy>,
    special_instructions: Vec<String>,
}

impl AddChildRequest {
    /// Checks in order: birth date, responsible id, relationship, then the rest
    pub fn validate(self) -> Result<ValidatedEnrollment, ServiceError> {
        let birth_date = validation::birth_date(self.birth_date.as_deref().unwrap_or_default())?;

        let responsible_id = match self.responsible_id.as_deref().map(str::trim) {
            None | Some("") => return Err(ServiceError::MissingResponsible),
            Some(raw) => Uuid::parse_str(raw)
                .map_err(|_| ServiceError::Validation(format!("responsible id '{}' is not a valid UUID", raw)))?,
        };

        let relationship = validation::relationship(self.relationship.as_deref().unwrap_or_default())?;
        let first_name = validation::name("first_name", &self.first_name)?;
        let last_name = validation::name("last_name", &self.last_name)?;
        let gender = validation::gender(&self.gender)?;

        let allergies = self
            .allergies
            .into_iter()
            .map(normalize_allergy)
            .collect::<Result<Vec<_>, _>>()?;
        let special_instructions = self
            .special_instructions
            .iter()
            .map(|s| instruction_text(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValidatedEnrollment {
            first_name,
            last_name,
            birth_date,
            gender,
            responsible_id,
            relationship,
            daycare_id: self.daycare_id,
            class_id: self.class_id,
            allergies,
            special_instructions,
        })
    }
}

pub(crate) fn normalize_allergy(allergy: NewAllergy) -> Result<NewAllergy, ServiceError> {
    Ok(NewAllergy {
        name: validation::name("allergy name", &allergy.name)?,
        severity: validation::optional_text(allergy.severity.as_deref()),
        notes: validation::optional_text(allergy.notes.as_deref()),
    })
}

pub(crate) fn instruction_text(raw: &str) -> Result<String, ServiceError> {
    validation::optional_text(Some(raw))
        .ok_or_else(|| ServiceError::Validation("instruction must not be empty".to_string()))
}

/// Class whose age range must still fit after an update: a newly assigned
/// class, or the current one when only the birth date moves
fn class_to_recheck(current: &Child, patch: &ChildPatch, clear_class: bool) -> Option<Uuid> {
    if clear_class {
        return None;
    }
    match (patch.class_id, patch.birth_date) {
        (Some(class_id), _) => Some(class_id),
        (None, Some(_)) => current.class_id,
        (None, None) => None,
    }
}

pub struct ChildService {
    repo: Repository<Child>,
}

impl ChildService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new(Child::TABLE, pool),
        }
    }

    fn pool(&self) -> &PgPool {
        self.repo.pool()
    }

    /// Enroll a child under an existing adult responsible.
    pub async fn add_child(&self, scope: &Scope, request: AddChildRequest) -> Result<EnrolledChild, ServiceError> {
        self.add_validated(scope, request.validate()?).await
    }

    /// Database half of `add_child`, for callers that validated up front
    pub async fn add_validated(&self, scope: &Scope, enrollment: ValidatedEnrollment) -> Result<EnrolledChild, ServiceError> {
        let mut tx = self.pool().begin().await?;
        match Self::enroll(&mut tx, scope, &enrollment).await {
            Ok(enrolled) => {
                tx.commit().await?;
                info!(
                    "Enrolled child {} in daycare {} under responsible {} ({})",
                    enrolled.child.id, enrolled.child.daycare_id, enrollment.responsible_id, enrollment.relationship
                );
                Ok(enrolled)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Rollback after failed enrollment also failed: {}", rollback_err);
                }
                warn!("Child enrollment rolled back: {}", e);
                Err(e)
            }
        }
    }

    async fn enroll(
        conn: &mut PgConnection,
        scope: &Scope,
        enrollment: &ValidatedEnrollment,
    ) -> Result<EnrolledChild, ServiceError> {
        let responsible = Repository::<AdultResponsible>::find_in(
            &mut *conn,
            AdultResponsible::TABLE,
            enrollment.responsible_id,
        )
        .await?
        .filter(|r| scope.permits(r.daycare_id))
        .ok_or_else(|| {
            ServiceError::NotFound(format!("adult responsible {} not found", enrollment.responsible_id))
        })?;

        let daycare_id = match enrollment.daycare_id {
            Some(requested) if requested != responsible.daycare_id => {
                return Err(ServiceError::DaycareMismatch(format!(
                    "child daycare {} does not match responsible daycare {}",
                    requested, responsible.daycare_id
                )));
            }
            _ => responsible.daycare_id,
        };

        if let Some(class_id) = enrollment.class_id {
            Self::check_class(&mut *conn, class_id, daycare_id, enrollment.birth_date).await?;
        }

        let child = Child::insert(
            &mut *conn,
            &NewChild {
                daycare_id,
                class_id: enrollment.class_id,
                first_name: enrollment.first_name.clone(),
                last_name: enrollment.last_name.clone(),
                birth_date: enrollment.birth_date,
                gender: enrollment.gender.as_str().to_string(),
            },
        )
        .await?;

        let link = ResponsibleOf::insert(&mut *conn, responsible.id, child.id, enrollment.relationship).await?;

        let mut allergies = Vec::with_capacity(enrollment.allergies.len());
        for allergy in &enrollment.allergies {
            allergies.push(Allergy::insert(&mut *conn, child.id, allergy).await?);
        }

        let mut special_instructions = Vec::with_capacity(enrollment.special_instructions.len());
        for instruction in &enrollment.special_instructions {
            special_instructions.push(SpecialInstruction::insert(&mut *conn, child.id, instruction).await?);
        }

        Ok(EnrolledChild {
            child,
            link,
            allergies,
            special_instructions,
        })
    }

    /// The class must live in the child's daycare and, when it has an age
    /// range, the child's age must fall inside it.
    async fn check_class(
        conn: &mut PgConnection,
        class_id: Uuid,
        daycare_id: Uuid,
        birth_date: NaiveDate,
    ) -> Result<(), ServiceError> {
        let class = Repository::<Class>::find_in(&mut *conn, Class::TABLE, class_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("class {} not found", class_id)))?;
        if class.daycare_id != daycare_id {
            return Err(ServiceError::DaycareMismatch(format!(
                "class {} belongs to another daycare",
                class_id
            )));
        }

        if let Some(age_range_id) = class.age_range_id {
            if let Some(range) = Repository::<AgeRange>::find_in(&mut *conn, AgeRange::TABLE, age_range_id).await? {
                let months = validation::age_in_months(birth_date, Utc::now().date_naive());
                if !range.contains_months(months) {
                    return Err(ServiceError::Validation(format!(
                        "child is {} months old, class '{}' takes {} to {} months",
                        months, class.name, range.min_months, range.max_months
                    )));
                }
            }
        }
        Ok(())
    }

    pub async fn list(
        &self,
        scope: &Scope,
        daycare_id: Option<Uuid>,
        class_id: Option<Uuid>,
    ) -> Result<Vec<Child>, ServiceError> {
        let mut rows = match scope.list_filter(daycare_id) {
            Some(id) => self.repo.select_by("daycare_id", id).await?,
            None => self.repo.select_all().await?,
        };
        if let Some(class_id) = class_id {
            rows.retain(|c| c.class_id == Some(class_id));
        }
        Ok(rows)
    }

    /// Bare row, scoped
    pub async fn find(&self, scope: &Scope, id: Uuid) -> Result<Child, ServiceError> {
        let child = self.repo.select_404(id).await.map_err(not_found)?;
        scope.check(child.daycare_id, child, "child", id)
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<ChildDetail, ServiceError> {
        let child = self.find(scope, id).await?;
        self.detail(child).await
    }

    pub async fn detail(&self, child: Child) -> Result<ChildDetail, ServiceError> {
        let responsibles = ResponsibleOf::responsibles_of_child(self.pool(), child.id).await?;
        let allergies = Repository::<Allergy>::new(Allergy::TABLE, self.pool().clone())
            .select_by("child_id", child.id)
            .await?;
        let special_instructions = Repository::<SpecialInstruction>::new(SpecialInstruction::TABLE, self.pool().clone())
            .select_by("child_id", child.id)
            .await?;
        Ok(ChildDetail {
            child,
            responsibles,
            allergies,
            special_instructions,
        })
    }

    pub async fn update(&self, scope: &Scope, id: Uuid, request: UpdateChildRequest) -> Result<Child, ServiceError> {
        let current = self.find(scope, id).await?;

        let birth_date = request.birth_date.as_deref().map(validation::birth_date).transpose()?;
        let patch = ChildPatch {
            class_id: if request.clear_class { None } else { request.class_id },
            first_name: validation::optional_name("first_name", request.first_name.as_deref())?,
            last_name: validation::optional_name("last_name", request.last_name.as_deref())?,
            birth_date,
            gender: request
                .gender
                .as_deref()
                .map(|g| validation::gender(g).map(|g| g.as_str().to_string()))
                .transpose()?,
        };

        let mut tx = self.pool().begin().await?;
        if let Some(class_id) = class_to_recheck(&current, &patch, request.clear_class) {
            Self::check_class(&mut tx, class_id, current.daycare_id, birth_date.unwrap_or(current.birth_date)).await?;
        }
        let mut child = Child::update(&mut *tx, id, &patch).await.map_err(not_found)?;
        if request.clear_class {
            child = Child::clear_class(&mut *tx, id).await.map_err(not_found)?;
        }
        tx.commit().await?;
        Ok(child)
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), ServiceError> {
        self.find(scope, id).await?;
        self.repo.delete(id).await.map_err(not_found)?;
        info!("Deleted child {}", id);
        Ok(())
    }

    pub async fn responsibles(&self, scope: &Scope, id: Uuid) -> Result<Vec<LinkedResponsible>, ServiceError> {
        self.find(scope, id).await?;
        Ok(ResponsibleOf::responsibles_of_child(self.pool(), id).await?)
    }

    /// Link an existing child to another responsible of the same daycare
    pub async fn link_responsible(&self, scope: &Scope, child_id: Uuid, request: LinkRequest) -> Result<ResponsibleOf, ServiceError> {
        let relationship = validation::relationship(request.relationship.as_deref().unwrap_or_default())?;
        let child = self.find(scope, child_id).await?;

        let responsible = Repository::<AdultResponsible>::find_in(self.pool(), AdultResponsible::TABLE, request.responsible_id)
            .await?
            .filter(|r| scope.permits(r.daycare_id))
            .ok_or_else(|| ServiceError::NotFound(format!("adult responsible {} not found", request.responsible_id)))?;

        if responsible.daycare_id != child.daycare_id {
            return Err(ServiceError::DaycareMismatch(format!(
                "responsible {} and child {} belong to different daycares",
                responsible.id, child.id
            )));
        }

        ResponsibleOf::insert(self.pool(), responsible.id, child.id, relationship)
            .await
            .map_err(|e| match e {
                DatabaseError::UniqueViolation(_) => ServiceError::Conflict(format!(
                    "responsible {} is already linked to child {}",
                    responsible.id, child.id
                )),
                other => ServiceError::Database(other),
            })
    }

    /// Remove a link, refusing to leave the child without any responsible
    pub async fn unlink_responsible(&self, scope: &Scope, child_id: Uuid, responsible_id: Uuid) -> Result<(), ServiceError> {
        self.find(scope, child_id).await?;

        let mut tx = self.pool().begin().await?;
        // Serialize concurrent unlinks of the same child
        sqlx::query("SELECT 1 FROM responsible_of WHERE child_id = $1 FOR UPDATE")
            .bind(child_id)
            .execute(&mut *tx)
            .await?;

        if !ResponsibleOf::exists(&mut *tx, responsible_id, child_id).await? {
            return Err(ServiceError::NotFound(format!(
                "responsible {} is not linked to child {}",
                responsible_id, child_id
            )));
        }
        if ResponsibleOf::count_for_child(&mut *tx, child_id).await? <= 1 {
            return Err(ServiceError::Conflict(
                "a child must keep at least one responsible".to_string(),
            ));
        }

        ResponsibleOf::delete(&mut *tx, responsible_id, child_id).await.map_err(not_found)?;
        tx.commit().await?;
        Ok(())
    }

    /// Children of the responsible behind a login account, with details
    pub async fn for_responsible(&self, responsible_id: Uuid) -> Result<Vec<ChildDetail>, ServiceError> {
        let linked = ResponsibleOf::children_of_responsible(self.pool(), responsible_id).await?;
        let mut details = Vec::with_capacity(linked.len());
        for child in linked {
            let row = self.repo.select_404(child.id).await.map_err(not_found)?;
            details.push(self.detail(row).await?);
        }
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AddChildRequest {
        AddChildRequest {
            first_name: "Lea".to_string(),
            last_name: "Martin".to_string(),
            birth_date: Some("2022-04-10".to_string()),
            gender: "female".to_string(),
            responsible_id: Some(Uuid::new_v4().to_string()),
            relationship: Some("Mother".to_string()),
            daycare_id: None,
            class_id: None,
            allergies: vec![NewAllergy {
                name: " peanuts ".to_string(),
                severity: Some("severe".to_string()),
                notes: Some("  ".to_string()),
            }],
            special_instructions: vec!["Nap after lunch".to_string()],
        }
    }

    #[test]
    fn validates_a_complete_request() {
        let v = request().validate().unwrap();
        assert_eq!(v.relationship, Relationship::Mother);
        assert_eq!(v.gender, Gender::Female);
        assert_eq!(v.birth_date, NaiveDate::from_ymd_opt(2022, 4, 10).unwrap());
        assert_eq!(v.allergies[0].name, "peanuts");
        assert_eq!(v.allergies[0].notes, None);
        assert_eq!(v.special_instructions, vec!["Nap after lunch".to_string()]);
    }

    #[test]
    fn malformed_date_is_a_parse_error() {
        let mut r = request();
        r.birth_date = Some("the tenth of april".to_string());
        assert!(matches!(r.validate(), Err(ServiceError::InvalidDate(_))));
    }

    #[test]
    fn date_is_checked_before_responsible() {
        let mut r = request();
        r.birth_date = Some("nope".to_string());
        r.responsible_id = None;
        assert!(matches!(r.validate(), Err(ServiceError::InvalidDate(_))));
    }

    #[test]
    fn missing_responsible_is_a_domain_error() {
        let mut r = request();
        r.responsible_id = None;
        assert!(matches!(r.validate(), Err(ServiceError::MissingResponsible)));

        let mut r = request();
        r.responsible_id = Some("   ".to_string());
        assert!(matches!(r.validate(), Err(ServiceError::MissingResponsible)));
    }

    #[test]
    fn malformed_responsible_id_is_rejected() {
        let mut r = request();
        r.responsible_id = Some("not-a-uuid".to_string());
        assert!(matches!(r.validate(), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn invalid_relationship_lists_valid_values() {
        let mut r = request();
        r.relationship = Some("aunt".to_string());
        let err = r.validate().unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRelationship(_)));
        assert!(err
            .to_string()
            .contains("father, mother, grandfather, grandmother, guardian"));
    }

    #[test]
    fn blank_instruction_is_rejected() {
        let mut r = request();
        r.special_instructions.push("   ".to_string());
        assert!(matches!(r.validate(), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn deserializes_with_defaults() {
        let r: AddChildRequest = serde_json::from_value(serde_json::json!({
            "first_name": "Noah",
            "last_name": "Roy",
            "birth_date": "01/02/2023",
            "gender": "male",
            "relationship": "father"
        }))
        .unwrap();
        assert!(r.allergies.is_empty());
        assert!(r.special_instructions.is_empty());
        assert!(matches!(r.validate(), Err(ServiceError::MissingResponsible)));
    }

    fn from_json(body: Value) -> AddChildRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn wrongly_typed_fields_reach_the_domain_errors() {
        let id = Uuid::new_v4().to_string();

        let r = from_json(serde_json::json!({
            "first_name": "Noah", "last_name": "Roy", "gender": "male",
            "birth_date": 20220101, "responsible_id": id, "relationship": "father"
        }));
        assert!(matches!(r.validate(), Err(ServiceError::InvalidDate(raw)) if raw == "20220101"));

        let r = from_json(serde_json::json!({
            "first_name": "Noah", "last_name": "Roy", "gender": "male",
            "birth_date": "2022-01-01", "responsible_id": id
        }));
        assert!(matches!(r.validate(), Err(ServiceError::InvalidRelationship(_))));

        let r = from_json(serde_json::json!({
            "first_name": "Noah", "last_name": "Roy", "gender": "male",
            "responsible_id": id, "relationship": "father"
        }));
        assert!(matches!(r.validate(), Err(ServiceError::InvalidDate(_))));
    }

    fn child(class_id: Option<Uuid>) -> Child {
        Child {
            id: Uuid::new_v4(),
            daycare_id: Uuid::new_v4(),
            class_id,
            first_name: "Lea".to_string(),
            last_name: "Martin".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            gender: "female".to_string(),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn birth_date_change_rechecks_the_current_class() {
        let current_class = Uuid::new_v4();
        let current = child(Some(current_class));
        let moved = ChildPatch {
            birth_date: NaiveDate::from_ymd_opt(2019, 1, 1),
            ..ChildPatch::default()
        };
        assert_eq!(class_to_recheck(&current, &moved, false), Some(current_class));
        assert_eq!(class_to_recheck(&current, &moved, true), None);
        assert_eq!(class_to_recheck(&child(None), &moved, false), None);

        let renamed = ChildPatch {
            first_name: Some("Leah".to_string()),
            ..ChildPatch::default()
        };
        assert_eq!(class_to_recheck(&current, &renamed, false), None);

        let other_class = Uuid::new_v4();
        let reassigned = ChildPatch {
            class_id: Some(other_class),
            ..ChildPatch::default()
        };
        assert_eq!(class_to_recheck(&current, &reassigned, false), Some(other_class));
    }
}
