use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthError;
use crate::auth::AuthFailure;
use crate::database::models::Identity;
use crate::error::ApiError;

/// Allow-list check over an already resolved identity.
#[derive(Debug, Clone, Default)]
pub struct RoleGate {
    allowed: BTreeSet<String>,
}

impl RoleGate {
    pub fn new<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        Self {
            allowed: roles.into_iter().map(|r| r.as_ref().to_string()).collect(),
        }
    }

    /// Flatten nested role groupings into one allow-list
    pub fn from_groups<G, I, R>(groups: G) -> Self
    where
        G: IntoIterator<Item = I>,
        I: IntoIterator<Item = R>,
        R: AsRef<str>,
    {
        Self::new(groups.into_iter().flatten())
    }

    pub fn allows(&self, role: &str) -> bool {
        self.allowed.contains(role)
    }

    /// A missing identity means the token gate did not run first; that is
    /// reported as unauthenticated, never forbidden.
    pub fn check(&self, identity: Option<&Identity>) -> Result<(), AuthError> {
        let identity = identity.ok_or(AuthError::Unauthenticated(AuthFailure::MissingToken))?;
        if self.allows(&identity.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

pub async fn require_roles(
    State(gate): State<Arc<RoleGate>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(e) = gate.check(request.extensions().get::<Identity>()) {
        match &e {
            AuthError::Forbidden => tracing::warn!(
                "Role check failed for {} {}",
                request.method(),
                request.uri().path()
            ),
            _ => tracing::error!(
                "Role check reached without an identity on {}; token gate missing from the chain",
                request.uri().path()
            ),
        }
        return Err(e.into());
    }
    Ok(next.run(request).await)
}
