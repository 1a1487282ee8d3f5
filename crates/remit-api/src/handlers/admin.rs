//! Administrator handlers. Each route sits behind its own permission gate.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use remit_entity::user::UserStatus;

use crate::dto::request::UpdateStatusRequest;
use crate::dto::response::{
    RoleListResponse, RoleResponse, UserPermissionsResponse, UserResponse,
};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// PATCH /api/v1/users/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> ApiResult<Json<UserResponse>> {
    let status: UserStatus = req.status.parse()?;
    let user = state
        .admin
        .update_status(&auth, id, status, req.reason.as_deref())
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /api/v1/users/{id}/permissions
pub async fn user_permissions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let permissions = state.admin.user_permissions(id).await?;
    Ok(Json(UserPermissionsResponse {
        user_id: id,
        permissions: permissions.into_iter().collect(),
    }))
}

/// GET /api/v1/roles
pub async fn list_roles(State(state): State<AppState>) -> ApiResult<Json<RoleListResponse>> {
    let roles = state.admin.list_roles().await?;
    Ok(Json(RoleListResponse {
        roles: roles.into_iter().map(RoleResponse::from).collect(),
    }))
}
