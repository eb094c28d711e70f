use std::io;

use serde::Serialize;
use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

/// Store failures, classified once at the driver boundary. Everything above
/// the database layer matches on these variants instead of inspecting
/// driver error codes.
#[derive(Debug, Clone, Error)]
pub enum StoreFault {
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("host unresolvable: {0}")]
    HostUnresolvable(String),

    #[error("timed out: {0}")]
    TimedOut(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Unknown(String),
}

/// Variant tag without the detail, for logs and health payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    ConnectionRefused,
    AccessDenied,
    HostUnresolvable,
    TimedOut,
    Configuration,
    Unknown,
}

// MySQL server error numbers that mean the credentials were rejected
const ER_DBACCESS_DENIED: u16 = 1044;
const ER_ACCESS_DENIED: u16 = 1045;
const ER_ACCESS_DENIED_NO_PASSWORD: u16 = 1698;
const SQLSTATE_INVALID_AUTHORIZATION: &str = "28000";

impl StoreFault {
    pub fn kind(&self) -> FaultKind {
        match self {
            StoreFault::ConnectionRefused(_) => FaultKind::ConnectionRefused,
            StoreFault::AccessDenied(_) => FaultKind::AccessDenied,
            StoreFault::HostUnresolvable(_) => FaultKind::HostUnresolvable,
            StoreFault::TimedOut(_) => FaultKind::TimedOut,
            StoreFault::Configuration(_) => FaultKind::Configuration,
            StoreFault::Unknown(_) => FaultKind::Unknown,
        }
    }

    /// Faults a retry may clear. Rejected credentials and bad configuration
    /// need an operator, so they are not in this set.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreFault::ConnectionRefused(_) | StoreFault::HostUnresolvable(_) | StoreFault::TimedOut(_)
        )
    }

    /// Operator-facing hint for the fault, given the `host:port/database` target.
    pub fn diagnostic(&self, target: &str) -> String {
        match self {
            StoreFault::ConnectionRefused(_) => format!(
                "Connection to {} was refused. Is the MySQL server running and listening on that port?",
                target
            ),
            StoreFault::AccessDenied(_) => format!(
                "MySQL rejected the credentials for {}. Check the user and password in DATABASE_URL and the user's grants.",
                target
            ),
            StoreFault::HostUnresolvable(_) => format!(
                "The host in {} could not be resolved. Check the hostname in DATABASE_URL and DNS reachability.",
                target
            ),
            StoreFault::TimedOut(_) => format!(
                "Timed out reaching {}. Check network access or raise DATABASE_CONNECTION_TIMEOUT.",
                target
            ),
            StoreFault::Configuration(detail) => format!(
                "Database configuration for {} is invalid: {}. Fix DATABASE_URL.",
                target, detail
            ),
            StoreFault::Unknown(detail) => {
                format!("Unexpected database failure for {}: {}", target, detail)
            }
        }
    }
}

impl From<sqlx::Error> for StoreFault {
    fn from(err: sqlx::Error) -> Self {
        let detail = err.to_string();
        match err {
            sqlx::Error::Io(ref io_err) => classify_io(io_err, detail),
            sqlx::Error::PoolTimedOut => StoreFault::TimedOut(detail),
            sqlx::Error::Configuration(_) => StoreFault::Configuration(detail),
            sqlx::Error::Database(ref db_err) => {
                let number = db_err
                    .try_downcast_ref::<MySqlDatabaseError>()
                    .map(|e| e.number());
                classify_database(db_err.code().as_deref(), number, detail)
            }
            _ => StoreFault::Unknown(detail),
        }
    }
}

fn classify_io(err: &io::Error, detail: String) -> StoreFault {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => StoreFault::ConnectionRefused(detail),
        io::ErrorKind::TimedOut => StoreFault::TimedOut(detail),
        _ if is_resolution_failure(&detail) => StoreFault::HostUnresolvable(detail),
        _ => StoreFault::Unknown(detail),
    }
}

// The resolver surfaces as a plain io::Error; its message is the only signal.
fn is_resolution_failure(message: &str) -> bool {
    const MARKERS: [&str; 5] = [
        "failed to lookup address",
        "Name or service not known",
        "nodename nor servname",
        "No such host is known",
        "Temporary failure in name resolution",
    ];
    MARKERS.iter().any(|m| message.contains(m))
}

fn classify_database(sqlstate: Option<&str>, number: Option<u16>, detail: String) -> StoreFault {
    let denied_number = matches!(
        number,
        Some(ER_DBACCESS_DENIED | ER_ACCESS_DENIED | ER_ACCESS_DENIED_NO_PASSWORD)
    );
    if denied_number || sqlstate == Some(SQLSTATE_INVALID_AUTHORIZATION) {
        StoreFault::AccessDenied(detail)
    } else {
        StoreFault::Unknown(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_connections_are_classified() {
        let fault = StoreFault::from(sqlx::Error::Io(io::Error::from(
            io::ErrorKind::ConnectionRefused,
        )));
        assert_eq!(fault.kind(), FaultKind::ConnectionRefused);
        assert!(fault.is_unavailable());
    }

    #[test]
    fn pool_timeouts_are_classified() {
        assert_eq!(
            StoreFault::from(sqlx::Error::PoolTimedOut).kind(),
            FaultKind::TimedOut
        );
        let io_timeout = sqlx::Error::Io(io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(StoreFault::from(io_timeout).kind(), FaultKind::TimedOut);
    }

    #[test]
    fn resolver_failures_are_classified() {
        let err = sqlx::Error::Io(io::Error::new(
            io::ErrorKind::Other,
            "failed to lookup address information: Name or service not known",
        ));
        assert_eq!(StoreFault::from(err).kind(), FaultKind::HostUnresolvable);
    }

    #[test]
    fn configuration_errors_are_classified() {
        let err = sqlx::Error::Configuration("bad ssl mode".into());
        let fault = StoreFault::from(err);
        assert_eq!(fault.kind(), FaultKind::Configuration);
        assert!(!fault.is_unavailable());
    }

    #[test]
    fn access_denied_by_number_or_sqlstate() {
        assert_eq!(
            classify_database(None, Some(1045), "denied".into()).kind(),
            FaultKind::AccessDenied
        );
        assert!(!classify_database(None, Some(1045), "denied".into()).is_unavailable());
        assert_eq!(
            classify_database(Some("28000"), None, "denied".into()).kind(),
            FaultKind::AccessDenied
        );
        assert_eq!(
            classify_database(Some("42S02"), Some(1146), "no table".into()).kind(),
            FaultKind::Unknown
        );
    }

    #[test]
    fn everything_else_is_unknown() {
        let fault = StoreFault::from(sqlx::Error::Protocol("garbled packet".into()));
        assert_eq!(fault.kind(), FaultKind::Unknown);
        assert!(!fault.is_unavailable());
    }

    #[test]
    fn diagnostics_name_the_target() {
        let fault = StoreFault::ConnectionRefused("os error 111".into());
        assert!(fault.diagnostic("db:3306/votes").contains("db:3306/votes"));
    }
}
