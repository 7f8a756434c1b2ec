// handlers/protected/allergies.rs - /api/children/:id/allergies

use axum::{extract::Path, Extension};
use uuid::Uuid;

use crate::database::models::{Allergy, AllergyPatch, NewAllergy};
use crate::handlers::pool;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json};
use crate::services::AllergyService;

pub async fn list(Extension(user): Extension<AuthUser>, Path(child_id): Path<Uuid>) -> ApiResult<Vec<Allergy>> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(AllergyService::new(pool().await?).list(&scope, child_id).await?))
}

pub async fn show(
    Extension(user): Extension<AuthUser>,
    Path((child_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Allergy> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(AllergyService::new(pool().await?).get(&scope, child_id, id).await?))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Path(child_id): Path<Uuid>,
    Json(new): Json<NewAllergy>,
) -> ApiResult<Allergy> {
    let scope = user.scope()?;
    Ok(ApiResponse::created(
        AllergyService::new(pool().await?).create(&scope, child_id, new).await?,
    ))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path((child_id, id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<AllergyPatch>,
) -> ApiResult<Allergy> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(
        AllergyService::new(pool().await?).update(&scope, child_id, id, patch).await?,
    ))
}

pub async fn delete(Extension(user): Extension<AuthUser>, Path((child_id, id)): Path<(Uuid, Uuid)>) -> ApiResult<()> {
    let scope = user.scope()?;
    AllergyService::new(pool().await?).delete(&scope, child_id, id).await?;
    Ok(ApiResponse::no_content())
}
