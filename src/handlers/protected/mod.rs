// handlers/protected/mod.rs - endpoints behind the token gate only
pub mod auth;

pub use auth::whoami_get;
