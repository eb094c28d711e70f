pub mod user;

pub use user::{AccountStatus, Identity, UserLogin, UserRecord, ACTIVE_STATUS};
