use axum::Extension;

use crate::database::models::Identity;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/auth/whoami - the identity resolved for this request
pub async fn whoami_get(Extension(identity): Extension<Identity>) -> ApiResult<Identity> {
    Ok(ApiResponse::success(identity))
}
