use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::Identity;

/// Why a request failed authentication. The `code` is the machine-readable
/// reason returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,

    /// Covers unknown and inactive accounts alike
    #[error("Invalid credentials")]
    InvalidCredentials,
}

impl AuthFailure {
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "token_missing",
            AuthFailure::MalformedHeader => "token_malformed",
            AuthFailure::InvalidSignature => "signature_invalid",
            AuthFailure::Expired => "token_expired",
            AuthFailure::InvalidToken => "token_invalid",
            AuthFailure::InvalidCredentials => "credentials_invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id, as a decimal string
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_identity(identity: &Identity, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: identity.id.to_string(),
            role: identity.role.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }

    pub fn subject_id(&self) -> Result<u64, AuthFailure> {
        self.sub.parse().map_err(|_| AuthFailure::InvalidToken)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// HS256 signing and verification with the one shared server secret
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims::for_identity(identity, now, self.ttl);
        let token = self.sign(&claims)?;
        Ok(IssuedToken {
            token,
            token_type: "Bearer",
            expires_at: now + self.ttl,
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
    }

    /// CPU-only: signature and expiry checks, no store access.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthFailure> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthFailure::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthFailure::Expired,
                _ => AuthFailure::InvalidToken,
            })
    }
}
