// handlers/public/auth.rs - POST /auth/login

use crate::handlers::pool;
use crate::middleware::{ApiResponse, ApiResult, Json};
use crate::services::{AuthService, LoginRequest, LoginResult};

/// Authenticate with email and password and receive a JWT.
///
/// ```json
/// { "email": "manager@sunny.example", "password": "..." }
/// ```
///
/// Wrong email and wrong password both answer 401 `Invalid credentials`.
pub async fn login_post(Json(request): Json<LoginRequest>) -> ApiResult<LoginResult> {
    let result = AuthService::new(pool().await?).login(request).await?;
    tracing::info!("Login succeeded for {}", result.user.email);
    Ok(ApiResponse::success(result))
}
