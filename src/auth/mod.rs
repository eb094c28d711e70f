pub mod password;
pub mod roles;
pub mod token;

pub use token::{AuthFailure, Claims, IssuedToken, TokenKeys};
