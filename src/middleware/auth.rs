use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::error::ApiError;
use crate::services::Scope;
use crate::types::Role;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub daycare_id: Option<Uuid>,
    pub claims: Claims,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
            roles: claims.roles.clone(),
            daycare_id: claims.daycare_id,
            claims,
        }
    }
}

impl AuthUser {
    pub fn has_role(&self, role: Role) -> bool {
        auth::has_any_role(&self.roles, &[role])
    }

    /// Daycares this caller may touch through the staff endpoints
    pub fn scope(&self) -> Result<Scope, ApiError> {
        if self.has_role(Role::Admin) {
            return Ok(Scope::All);
        }
        if self.has_role(Role::OfficeManager) {
            return self
                .daycare_id
                .map(Scope::Daycare)
                .ok_or_else(|| ApiError::forbidden("Office manager token carries no daycare"));
        }
        Err(ApiError::forbidden("Insufficient role"))
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = auth::validate_jwt(&token).map_err(|e| {
        tracing::warn!("Rejected token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    let auth_user = AuthUser::from(claims);
    tracing::debug!("Authenticated {} ({:?})", auth_user.email, auth_user.roles);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err("Empty JWT token".to_string()),
        Some(token) => Ok(token.trim().to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}
