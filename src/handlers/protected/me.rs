// handlers/protected/me.rs - /api/me for adult responsibles

use axum::Extension;

use crate::database::models::AdultResponsible;
use crate::handlers::pool;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{ChildDetail, ChildService, ResponsibleService};

/// Own profile, looked up by the token's user id
pub async fn profile(Extension(user): Extension<AuthUser>) -> ApiResult<AdultResponsible> {
    let responsible = ResponsibleService::new(pool().await?).get_by_user(user.user_id).await?;
    Ok(ApiResponse::success(responsible))
}

/// Own children with their allergies and special instructions
pub async fn children(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<ChildDetail>> {
    let pool = pool().await?;
    let responsible = ResponsibleService::new(pool.clone()).get_by_user(user.user_id).await?;
    let children = ChildService::new(pool).for_responsible(responsible.id).await?;
    Ok(ApiResponse::success(children))
}
