// handlers/protected/age_ranges.rs - /api/age-ranges

use axum::{
    extract::{Path, Query},
    Extension,
};
use uuid::Uuid;

use crate::database::models::{AgeRange, AgeRangePatch, NewAgeRange};
use crate::handlers::{pool, ListQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json};
use crate::services::AgeRangeService;

pub async fn list(Extension(user): Extension<AuthUser>, Query(query): Query<ListQuery>) -> ApiResult<Vec<AgeRange>> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(
        AgeRangeService::new(pool().await?).list(&scope, query.daycare_id).await?,
    ))
}

pub async fn show(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<AgeRange> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(AgeRangeService::new(pool().await?).get(&scope, id).await?))
}

pub async fn create(Extension(user): Extension<AuthUser>, Json(new): Json<NewAgeRange>) -> ApiResult<AgeRange> {
    let scope = user.scope()?;
    Ok(ApiResponse::created(AgeRangeService::new(pool().await?).create(&scope, new).await?))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AgeRangePatch>,
) -> ApiResult<AgeRange> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(
        AgeRangeService::new(pool().await?).update(&scope, id, patch).await?,
    ))
}

pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<()> {
    let scope = user.scope()?;
    AgeRangeService::new(pool().await?).delete(&scope, id).await?;
    Ok(ApiResponse::no_content())
}
