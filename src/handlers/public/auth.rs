// handlers/public/auth.rs - POST /auth/login
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{password, AuthFailure};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - exchange email and password for a bearer token
///
/// Unknown email, wrong password, and a non-active account all answer with
/// the same `credentials_invalid` failure.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let email = request.email.trim().to_string();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let login = state.users.find_login(&email).await?;
    let stored_hash = login.as_ref().map(|l| l.password_hash.clone());
    let candidate = request.password;

    // Argon2 verification blocks for tens of milliseconds
    let password_ok = tokio::task::spawn_blocking(move || {
        password::verify_or_dummy(&candidate, stored_hash.as_deref())
    })
    .await
    .map_err(|e| {
        tracing::error!("Password verification task failed: {}", e);
        ApiError::internal_server_error("Failed to verify credentials")
    })?;

    let identity = match login {
        Some(login) if password_ok && login.identity.is_active() => login.identity,
        _ => {
            tracing::warn!("Login rejected for {}", email);
            return Err(ApiError::unauthorized(AuthFailure::InvalidCredentials));
        }
    };

    let issued = state.keys.issue(&identity).map_err(|e| {
        tracing::error!("Failed to sign token: {}", e);
        ApiError::internal_server_error("Failed to issue token")
    })?;

    tracing::info!("User {} ({}) logged in", identity.id, identity.role);

    Ok(ApiResponse::success(json!({
        "token": issued.token,
        "token_type": issued.token_type,
        "expires_at": issued.expires_at,
        "user": identity,
    })))
}
