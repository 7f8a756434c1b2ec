use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::AuthUser;
use crate::auth::has_any_role;
use crate::error::ApiError;
use crate::types::Role;

/// Role gate. Must run after `jwt_auth_middleware`.
///
/// ```ignore
/// router.route_layer(middleware::from_fn(|req, next| require_roles(&[Role::Admin], req, next)))
/// ```
pub async fn require_roles(allowed: &'static [Role], request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before role check"))?;

    if !has_any_role(&auth_user.roles, allowed) {
        tracing::warn!(
            "Role check failed for {}: has {:?}, needs one of {:?}",
            auth_user.email,
            auth_user.roles,
            allowed
        );
        return Err(ApiError::forbidden("Insufficient role"));
    }

    Ok(next.run(request).await)
}

pub async fn admin_only(request: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(&[Role::Admin], request, next).await
}

/// Admins and office managers
pub async fn staff_only(request: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(&[Role::Admin, Role::OfficeManager], request, next).await
}

pub async fn responsible_only(request: Request, next: Next) -> Result<Response, ApiError> {
    require_roles(&[Role::Responsible], request, next).await
}
