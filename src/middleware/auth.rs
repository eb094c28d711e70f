use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use crate::auth::{AuthFailure, TokenKeys};
use crate::database::{models::Identity, StoreFault, UserStore};
use crate::error::ApiError;

/// Outcome of a gate that did not let the request through
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(AuthFailure),

    #[error("forbidden")]
    Forbidden,

    /// The store itself failed; not a statement about the caller
    #[error("store fault: {0}")]
    Store(#[from] StoreFault),
}

impl From<AuthFailure> for AuthError {
    fn from(failure: AuthFailure) -> Self {
        AuthError::Unauthenticated(failure)
    }
}

/// Verifies bearer tokens and resolves the active identity behind them.
pub struct TokenGate {
    keys: Arc<TokenKeys>,
    users: Arc<dyn UserStore>,
}

impl TokenGate {
    pub fn new(keys: Arc<TokenKeys>, users: Arc<dyn UserStore>) -> Self {
        Self { keys, users }
    }

    /// Header checks and token verification happen before the single store
    /// read. Missing and inactive accounts produce the same failure.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = extract_bearer(headers)?;
        let claims = self.keys.verify(token)?;
        let user_id = claims.subject_id()?;

        match self.users.find_identity(user_id).await? {
            Some(identity) if identity.is_active() => Ok(identity),
            _ => {
                tracing::debug!("Rejected token for unknown or inactive user {}", user_id);
                Err(AuthFailure::InvalidCredentials.into())
            }
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthFailure> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthFailure::MissingToken)?
        .to_str()
        .map_err(|_| AuthFailure::MalformedHeader)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthFailure::MalformedHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthFailure::MalformedHeader);
    }
    Ok(token)
}

/// JWT authentication middleware that validates tokens and attaches the
/// resolved [`Identity`] to the request
pub async fn jwt_auth_middleware(
    State(gate): State<Arc<TokenGate>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = gate.authenticate(request.headers()).await.map_err(|e| {
        if let AuthError::Unauthenticated(failure) = &e {
            tracing::warn!(
                reason = failure.code(),
                "Rejected {} {}",
                request.method(),
                request.uri().path()
            );
        }
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
