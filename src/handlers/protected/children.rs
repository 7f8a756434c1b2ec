// handlers/protected/children.rs - /api/children
//
// POST /api/children is the enrollment transaction: child, first responsible
// link, and initial allergies / special instructions commit together or not at all.

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{header::CONTENT_TYPE, HeaderMap},
    Extension,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::{Child, LinkedResponsible, ResponsibleOf};
use crate::handlers::{pool, ListQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json};
use crate::services::{
    AddChildRequest, ChildDetail, ChildService, EnrolledChild, ImageOwner, ImageService, ImageUpload, LinkRequest,
    UpdateChildRequest,
};
use crate::storage::ImageStore;

pub async fn list(Extension(user): Extension<AuthUser>, Query(query): Query<ListQuery>) -> ApiResult<Vec<Child>> {
    let scope = user.scope()?;
    let rows = ChildService::new(pool().await?)
        .list(&scope, query.daycare_id, query.class_id)
        .await?;
    Ok(ApiResponse::success(rows))
}

pub async fn show(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<ChildDetail> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(ChildService::new(pool().await?).get(&scope, id).await?))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(request): Json<AddChildRequest>,
) -> ApiResult<EnrolledChild> {
    let scope = user.scope()?;
    let enrollment = request.validate()?;
    let enrolled = ChildService::new(pool().await?).add_validated(&scope, enrollment).await?;
    Ok(ApiResponse::created(enrolled))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateChildRequest>,
) -> ApiResult<Child> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(
        ChildService::new(pool().await?).update(&scope, id, request).await?,
    ))
}

pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<()> {
    let scope = user.scope()?;
    ChildService::new(pool().await?).delete(&scope, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/children/:id/responsibles
pub async fn responsibles(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<LinkedResponsible>> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(ChildService::new(pool().await?).responsibles(&scope, id).await?))
}

/// POST /api/children/:id/responsibles
pub async fn link(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<LinkRequest>,
) -> ApiResult<ResponsibleOf> {
    let scope = user.scope()?;
    let link = ChildService::new(pool().await?)
        .link_responsible(&scope, id, request)
        .await?;
    Ok(ApiResponse::created(link))
}

/// DELETE /api/children/:id/responsibles/:responsible_id
pub async fn unlink(
    Extension(user): Extension<AuthUser>,
    Path((id, responsible_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    let scope = user.scope()?;
    ChildService::new(pool().await?)
        .unlink_responsible(&scope, id, responsible_id)
        .await?;
    Ok(ApiResponse::no_content())
}

/// PUT /api/children/:id/image - raw image bytes
pub async fn image_put(
    Extension(user): Extension<AuthUser>,
    Extension(store): Extension<Arc<dyn ImageStore>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<ImageUpload> {
    let scope = user.scope()?;
    let upload = ImageService::new(pool().await?, store)
        .upload(&scope, ImageOwner::Child, id, &body, content_type(&headers))
        .await?;
    Ok(ApiResponse::success(upload))
}

/// Media type without parameters; empty when absent
pub(crate) fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn content_type_drops_parameters() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_type(&headers), "");
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png; charset=binary"));
        assert_eq!(content_type(&headers), "image/png");
    }
}
