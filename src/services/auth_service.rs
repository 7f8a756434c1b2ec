use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::office_manager_service::duplicate_email;
use super::{validation, ServiceError};
use crate::auth::{generate_jwt, Claims};
use crate::database::models::{AdultResponsible, OfficeManager, User};
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub daycare_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub expires_in: i64,
    pub user: SessionUser,
}

pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check credentials and issue a token. Every failure looks the same.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResult, ServiceError> {
        let email = request.email.trim();
        if email.is_empty() || request.password.is_empty() {
            return Err(ServiceError::InvalidCredentials);
        }

        let user = match User::verify_credentials(&self.pool, email, &request.password).await? {
            Some(user) => user,
            None => {
                warn!("Failed login attempt for {}", email);
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let role = user.role().ok_or_else(|| {
            warn!("User {} has unknown role '{}'", user.id, user.role);
            ServiceError::InvalidCredentials
        })?;
        let daycare_id = self.daycare_of(&user, role).await?;

        let claims = Claims::new(user.id, user.email.clone(), &[role], daycare_id);
        let token = generate_jwt(&claims)?;
        info!("User {} logged in as {}", user.id, role);

        Ok(LoginResult {
            token,
            expires_in: claims.exp - claims.iat,
            user: SessionUser {
                id: user.id,
                email: user.email,
                role,
                daycare_id,
            },
        })
    }

    /// Re-issue a token for a bearer whose token is still valid
    pub fn refresh(claims: &Claims) -> Result<LoginResult, ServiceError> {
        let renewed = claims.renewed();
        let token = generate_jwt(&renewed)?;
        let role = renewed
            .roles
            .iter()
            .find_map(|r| r.parse::<Role>().ok())
            .ok_or_else(|| ServiceError::Forbidden("token carries no known role".to_string()))?;

        Ok(LoginResult {
            token,
            expires_in: renewed.exp - renewed.iat,
            user: SessionUser {
                id: renewed.sub,
                email: renewed.email.clone(),
                role,
                daycare_id: renewed.daycare_id,
            },
        })
    }

    pub async fn change_password(&self, claims: &Claims, request: ChangePasswordRequest) -> Result<(), ServiceError> {
        validation::password(&request.new_password)?;
        let user = User::verify_credentials(&self.pool, &claims.email, &request.current_password)
            .await?
            .filter(|u| u.id == claims.sub)
            .ok_or(ServiceError::InvalidCredentials)?;
        User::update_password(&self.pool, user.id, &request.new_password).await?;
        info!("User {} changed their password", user.id);
        Ok(())
    }

    /// Bootstrap a platform administrator (admin CLI)
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = validation::email(email)?;
        validation::password(password)?;
        let user = User::insert(&self.pool, &email, password, Role::Admin)
            .await
            .map_err(duplicate_email)?;
        info!("Created admin user {}", user.id);
        Ok(user)
    }

    async fn daycare_of(&self, user: &User, role: Role) -> Result<Option<Uuid>, ServiceError> {
        let daycare_id = match role {
            Role::Admin => None,
            Role::OfficeManager => OfficeManager::find_by_user(&self.pool, user.id)
                .await?
                .map(|m| m.daycare_id),
            Role::Responsible => AdultResponsible::find_by_user(&self.pool, user.id)
                .await?
                .map(|r| r.daycare_id),
        };
        if role != Role::Admin && daycare_id.is_none() {
            warn!("User {} ({}) has no profile row", user.id, role);
            return Err(ServiceError::InvalidCredentials);
        }
        Ok(daycare_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validate_jwt;

    #[test]
    fn refresh_keeps_identity() {
        let daycare = Uuid::new_v4();
        let claims = Claims::with_expiry(Uuid::new_v4(), "om@sunny.example".into(), &[Role::OfficeManager], Some(daycare), 1);
        let result = AuthService::refresh(&claims).unwrap();

        assert_eq!(result.user.id, claims.sub);
        assert_eq!(result.user.role, Role::OfficeManager);
        assert_eq!(result.user.daycare_id, Some(daycare));

        let renewed = validate_jwt(&result.token).unwrap();
        assert_eq!(renewed.roles, claims.roles);
        assert!(renewed.exp >= claims.exp);
    }

    #[test]
    fn refresh_rejects_unknown_roles() {
        let mut claims = Claims::with_expiry(Uuid::new_v4(), "x@y.z".into(), &[Role::Admin], None, 1);
        claims.roles = vec!["janitor".to_string()];
        assert!(matches!(AuthService::refresh(&claims), Err(ServiceError::Forbidden(_))));
    }
}
