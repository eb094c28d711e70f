// handlers/elevated/users.rs - user directory for election staff
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{AccountStatus, Identity, UserRecord};
use crate::database::Page;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: AccountStatus,
}

fn user_id(path: Result<Path<u64>, PathRejection>) -> Result<u64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// GET /api/users?limit&offset
pub async fn list_get(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<UserRecord>> {
    let Query(params) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let users = state
        .users
        .list_users(Page::new(params.limit, params.offset))
        .await?;
    Ok(ApiResponse::success(users))
}

/// GET /api/users/:id
pub async fn show_get(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> ApiResult<UserRecord> {
    let id = user_id(path)?;
    state
        .users
        .find_user(id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
}

/// PUT /api/users/:id/status
///
/// Takes effect on the target's next request, since the token gate reloads
/// the identity every time.
pub async fn status_put(
    State(state): State<AppState>,
    Extension(caller): Extension<Identity>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<UserRecord> {
    let id = user_id(path)?;
    let Json(update) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    if id == caller.id && update.status != AccountStatus::Active {
        return Err(ApiError::bad_request("Administrators cannot deactivate their own account"));
    }

    let record = state
        .users
        .set_status(id, update.status)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))?;

    tracing::info!(
        "User {} set status of user {} to {}",
        caller.id,
        id,
        update.status.as_str()
    );
    Ok(ApiResponse::success(record))
}
