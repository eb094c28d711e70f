// handlers/elevated/mod.rs - endpoints behind the token gate and a role gate
pub mod users;

pub use users::{list_get, show_get, status_put};
