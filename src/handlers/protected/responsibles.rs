// handlers/protected/responsibles.rs - /api/responsibles

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::HeaderMap,
    Extension,
};
use std::sync::Arc;
use uuid::Uuid;

use super::children::content_type;
use crate::database::models::{AdultResponsible, LinkedChild, ResponsiblePatch};
use crate::handlers::{pool, ListQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json};
use crate::services::{CreateResponsibleRequest, ImageOwner, ImageService, ImageUpload, ResponsibleService};
use crate::storage::ImageStore;

pub async fn list(Extension(user): Extension<AuthUser>, Query(query): Query<ListQuery>) -> ApiResult<Vec<AdultResponsible>> {
    let scope = user.scope()?;
    let rows = ResponsibleService::new(pool().await?)
        .list(&scope, query.daycare_id)
        .await?;
    Ok(ApiResponse::success(rows))
}

pub async fn show(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<AdultResponsible> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(ResponsibleService::new(pool().await?).get(&scope, id).await?))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateResponsibleRequest>,
) -> ApiResult<AdultResponsible> {
    let scope = user.scope()?;
    let responsible = ResponsibleService::new(pool().await?).create(&scope, request).await?;
    Ok(ApiResponse::created(responsible))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ResponsiblePatch>,
) -> ApiResult<AdultResponsible> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(
        ResponsibleService::new(pool().await?).update(&scope, id, patch).await?,
    ))
}

pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<()> {
    let scope = user.scope()?;
    ResponsibleService::new(pool().await?).delete(&scope, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/responsibles/:id/children
pub async fn children(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<Vec<LinkedChild>> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(ResponsibleService::new(pool().await?).children(&scope, id).await?))
}

/// PUT /api/responsibles/:id/image - raw image bytes
pub async fn image_put(
    Extension(user): Extension<AuthUser>,
    Extension(store): Extension<Arc<dyn ImageStore>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<ImageUpload> {
    let scope = user.scope()?;
    let upload = ImageService::new(pool().await?, store)
        .upload(&scope, ImageOwner::Responsible, id, &body, content_type(&headers))
        .await?;
    Ok(ApiResponse::success(upload))
}
