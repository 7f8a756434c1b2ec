// handlers/protected/auth.rs - session endpoints for any authenticated user

use axum::Extension;
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::pool;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json};
use crate::services::{AuthService, ChangePasswordRequest, LoginResult};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub daycare_id: Option<Uuid>,
    pub expires_at: i64,
}

/// GET /api/auth/whoami
pub async fn whoami_get(Extension(user): Extension<AuthUser>) -> ApiResult<WhoAmI> {
    Ok(ApiResponse::success(WhoAmI {
        id: user.user_id,
        email: user.email,
        roles: user.roles,
        daycare_id: user.daycare_id,
        expires_at: user.claims.exp,
    }))
}

/// POST /api/auth/refresh - same identity, fresh expiry
pub async fn refresh_post(Extension(user): Extension<AuthUser>) -> ApiResult<LoginResult> {
    let result = AuthService::refresh(&user.claims)?;
    Ok(ApiResponse::success(result))
}

/// PUT /api/auth/password
pub async fn password_put(
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    AuthService::new(pool().await?)
        .change_password(&user.claims, request)
        .await?;
    Ok(ApiResponse::no_content())
}
