//! Role labels stored on user rows. Matching is by exact string; there is
//! no ordering between roles.

pub const ADMIN: &str = "admin";
pub const OFFICER: &str = "officer";
pub const VOTER: &str = "voter";

/// Election staff: may read the user directory
pub const STAFF: &[&str] = &[ADMIN, OFFICER];

pub const ALL: &[&str] = &[ADMIN, OFFICER, VOTER];
