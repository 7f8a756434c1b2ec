// handlers/protected/classes.rs - /api/classes

use axum::{
    extract::{Path, Query},
    Extension,
};
use uuid::Uuid;

use crate::database::models::{Child, Class, ClassPatch, NewClass};
use crate::handlers::{pool, ListQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json};
use crate::services::ClassService;

pub async fn list(Extension(user): Extension<AuthUser>, Query(query): Query<ListQuery>) -> ApiResult<Vec<Class>> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(
        ClassService::new(pool().await?).list(&scope, query.daycare_id).await?,
    ))
}

pub async fn show(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<Class> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(ClassService::new(pool().await?).get(&scope, id).await?))
}

pub async fn create(Extension(user): Extension<AuthUser>, Json(new): Json<NewClass>) -> ApiResult<Class> {
    let scope = user.scope()?;
    Ok(ApiResponse::created(ClassService::new(pool().await?).create(&scope, new).await?))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ClassPatch>,
) -> ApiResult<Class> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(ClassService::new(pool().await?).update(&scope, id, patch).await?))
}

/// Children in the class are kept and simply lose their class
pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<()> {
    let scope = user.scope()?;
    ClassService::new(pool().await?).delete(&scope, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/classes/:id/children
pub async fn children(Extension(user): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<Vec<Child>> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(ClassService::new(pool().await?).children(&scope, id).await?))
}
