// handlers/protected/instructions.rs - /api/children/:id/instructions

use axum::{extract::Path, Extension};
use uuid::Uuid;

use crate::database::models::{NewSpecialInstruction, SpecialInstruction, SpecialInstructionPatch};
use crate::handlers::pool;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json};
use crate::services::SpecialInstructionService;

pub async fn list(
    Extension(user): Extension<AuthUser>,
    Path(child_id): Path<Uuid>,
) -> ApiResult<Vec<SpecialInstruction>> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(
        SpecialInstructionService::new(pool().await?).list(&scope, child_id).await?,
    ))
}

pub async fn show(
    Extension(user): Extension<AuthUser>,
    Path((child_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<SpecialInstruction> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(
        SpecialInstructionService::new(pool().await?).get(&scope, child_id, id).await?,
    ))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    Path(child_id): Path<Uuid>,
    Json(new): Json<NewSpecialInstruction>,
) -> ApiResult<SpecialInstruction> {
    let scope = user.scope()?;
    Ok(ApiResponse::created(
        SpecialInstructionService::new(pool().await?).create(&scope, child_id, new).await?,
    ))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path((child_id, id)): Path<(Uuid, Uuid)>,
    Json(patch): Json<SpecialInstructionPatch>,
) -> ApiResult<SpecialInstruction> {
    let scope = user.scope()?;
    Ok(ApiResponse::success(
        SpecialInstructionService::new(pool().await?)
            .update(&scope, child_id, id, patch)
            .await?,
    ))
}

pub async fn delete(Extension(user): Extension<AuthUser>, Path((child_id, id)): Path<(Uuid, Uuid)>) -> ApiResult<()> {
    let scope = user.scope()?;
    SpecialInstructionService::new(pool().await?).delete(&scope, child_id, id).await?;
    Ok(ApiResponse::no_content())
}
