// handlers/protected/daycares.rs - /api/daycares
//
// Reads are open to staff (office managers see their own daycare only),
// writes are admin-only.

use axum::{extract::Path, Extension};
use uuid::Uuid;

use crate::database::models::{Daycare, DaycarePatch, NewDaycare};
use crate::handlers::pool;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json};
use crate::services::DaycareService;

pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Daycare>> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(DaycareService::new(pool().await?).list(&scope).await?))
}

pub async fn show(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<Daycare> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(DaycareService::new(pool().await?).get(&scope, id).await?))
}

pub async fn create(Json(new): Json<NewDaycare>) -> ApiResult<Daycare> {
    Ok(ApiResponse::created(DaycareService::new(pool().await?).create(new).await?))
}

pub async fn update(Path(id): Path<Uuid>, Json(patch): Json<DaycarePatch>) -> ApiResult<Daycare> {
    Ok(ApiResponse::success(DaycareService::new(pool().await?).update(id, patch).await?))
}

/// Cascades to every child, class and profile in the daycare, plus the
/// login accounts of its staff and responsibles.
pub async fn delete(Path(id): Path<Uuid>) -> ApiResult<()> {
    DaycareService::new(pool().await?).delete(id).await?;
    Ok(ApiResponse::no_content())
}
