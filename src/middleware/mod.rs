pub mod auth;
pub mod response;
pub mod role;

pub use auth::{extract_bearer, jwt_auth_middleware, AuthError, TokenGate};
pub use response::{ApiResponse, ApiResult};
pub use role::{require_roles, RoleGate};
