// handlers/protected/office_managers.rs - /api/office-managers (admin only)

use axum::extract::{Path, Query};
use uuid::Uuid;

use crate::database::models::{OfficeManager, OfficeManagerPatch};
use crate::handlers::{pool, ListQuery};
use crate::middleware::{ApiResponse, ApiResult, Json};
use crate::services::{CreateOfficeManagerRequest, OfficeManagerService};

pub async fn list(Query(query): Query<ListQuery>) -> ApiResult<Vec<OfficeManager>> {
    let managers = OfficeManagerService::new(pool().await?).list(query.daycare_id).await?;
    Ok(ApiResponse::success(managers))
}

pub async fn show(Path(id): Path<Uuid>) -> ApiResult<OfficeManager> {
    Ok(ApiResponse::success(OfficeManagerService::new(pool().await?).get(id).await?))
}

/// Creates the login account and the profile together
pub async fn create(Json(request): Json<CreateOfficeManagerRequest>) -> ApiResult<OfficeManager> {
    let manager = OfficeManagerService::new(pool().await?).create(request).await?;
    Ok(ApiResponse::created(manager))
}

pub async fn update(Path(id): Path<Uuid>, Json(patch): Json<OfficeManagerPatch>) -> ApiResult<OfficeManager> {
    Ok(ApiResponse::success(OfficeManagerService::new(pool().await?).update(id, patch).await?))
}

pub async fn delete(Path(id): Path<Uuid>) -> ApiResult<()> {
    OfficeManagerService::new(pool().await?).delete(id).await?;
    Ok(ApiResponse::no_content())
}
