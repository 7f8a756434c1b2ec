pub mod age_range_service;
pub mod allergy_service;
pub mod auth_service;
pub mod child_service;
pub mod class_service;
pub mod daycare_service;
pub mod image_service;
pub mod office_manager_service;
pub mod responsible_service;
pub mod special_instruction_service;
pub mod validation;

pub use age_range_service::AgeRangeService;
pub use allergy_service::AllergyService;
pub use auth_service::{AuthService, ChangePasswordRequest, LoginRequest, LoginResult};
pub use child_service::{
    AddChildRequest, ChildDetail, ChildService, EnrolledChild, LinkRequest, UpdateChildRequest,
    ValidatedEnrollment,
};
pub use class_service::ClassService;
pub use daycare_service::DaycareService;
pub use image_service::{ImageOwner, ImageService, ImageUpload};
pub use office_manager_service::{CreateOfficeManagerRequest, OfficeManagerService};
pub use responsible_service::{CreateResponsibleRequest, ResponsibleService};
pub use special_instruction_service::SpecialInstructionService;

use thiserror::Error;
use uuid::Uuid;

use crate::auth::JwtError;
use crate::database::DatabaseError;
use crate::storage::StorageError;
use crate::types::Relationship;

/// Errors raised by validation and business rules in the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("responsible id is required")]
    MissingResponsible,

    #[error("invalid relationship '{0}': valid values are {valid}", valid = Relationship::valid_values())]
    InvalidRelationship(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    DaycareMismatch(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Jwt(#[from] JwtError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::from(err))
    }
}

/// Which daycares a caller may see and modify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Platform administrator: every daycare
    All,
    /// Office manager: a single daycare
    Daycare(Uuid),
}

impl Scope {
    pub fn permits(&self, daycare_id: Uuid) -> bool {
        match self {
            Scope::All => true,
            Scope::Daycare(own) => *own == daycare_id,
        }
    }

    /// Daycare a new row is written to
    pub fn resolve_daycare(&self, requested: Option<Uuid>) -> Result<Uuid, ServiceError> {
        match (self, requested) {
            (Scope::All, Some(id)) => Ok(id),
            (Scope::All, None) => Err(ServiceError::Validation("daycare_id is required".to_string())),
            (Scope::Daycare(own), None) => Ok(*own),
            (Scope::Daycare(own), Some(id)) if *own == id => Ok(id),
            (Scope::Daycare(_), Some(_)) => Err(ServiceError::Forbidden(
                "cannot write to another daycare".to_string(),
            )),
        }
    }

    /// Daycare filter applied to list queries
    pub fn list_filter(&self, requested: Option<Uuid>) -> Option<Uuid> {
        match self {
            Scope::All => requested,
            Scope::Daycare(own) => Some(*own),
        }
    }

    /// Rows outside the scope look exactly like missing rows
    pub fn check<T>(&self, daycare_id: Uuid, row: T, what: &str, id: Uuid) -> Result<T, ServiceError> {
        if self.permits(daycare_id) {
            Ok(row)
        } else {
            Err(ServiceError::NotFound(format!("{} {} not found", what, id)))
        }
    }
}

pub(crate) fn not_found(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
        other => ServiceError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_scope_sees_everything() {
        let daycare = Uuid::new_v4();
        assert!(Scope::All.permits(daycare));
        assert_eq!(Scope::All.list_filter(None), None);
        assert_eq!(Scope::All.list_filter(Some(daycare)), Some(daycare));
        assert_eq!(Scope::All.resolve_daycare(Some(daycare)).unwrap(), daycare);
        assert!(matches!(Scope::All.resolve_daycare(None), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn manager_scope_is_pinned_to_own_daycare() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();
        let scope = Scope::Daycare(own);
        assert!(scope.permits(own));
        assert!(!scope.permits(other));
        assert_eq!(scope.list_filter(Some(other)), Some(own));
        assert_eq!(scope.resolve_daycare(None).unwrap(), own);
        assert!(matches!(scope.resolve_daycare(Some(other)), Err(ServiceError::Forbidden(_))));
        assert!(matches!(
            scope.check(other, (), "child", Uuid::nil()),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn relationship_error_lists_valid_values() {
        let err = ServiceError::InvalidRelationship("uncle".to_string());
        assert_eq!(
            err.to_string(),
            "invalid relationship 'uncle': valid values are father, mother, grandfather, grandmother, guardian"
        );
    }
}
