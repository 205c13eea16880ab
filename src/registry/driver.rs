//! Driver dispatch for the default-database bootstrap.
//!
//! The registry never dials the network itself. It renders a
//! connection string from a driver-name-keyed template table and hands it to
//! a caller-registered factory, which owns the actual dial (and any timeout
//! it wants to impose).

use std::fmt;
use std::sync::Arc;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Opaque database connection handle.
///
/// The registry only ever stores, hands out, and eventually closes these.
pub trait Connection: Send + Sync + fmt::Debug {
    fn close(&self) -> Result<(), BoxError>;
}

/// Factory that opens a connection from a rendered connection string.
pub type ConnectFn = Box<dyn Fn(&str) -> Result<Arc<dyn Connection>, BoxError> + Send + Sync>;

/// The one driver family this registry knows a connection-string shape for.
pub const DRIVER_POSTGRES: &str = "postgres";

/// Connection settings gathered from the `database_*` parameters.
#[derive(Debug, Clone)]
pub struct ConnectSettings {
    pub host: String,
    pub port: i64,
    pub username: String,
    pub password: String,
    pub database: String,
}

/// Renders the connection string for a recognized driver.
///
/// Extend this table to recognize additional driver families.
pub(crate) fn connection_string(driver: &str, settings: &ConnectSettings) -> Option<String> {
    match driver {
        DRIVER_POSTGRES => Some(format!(
            "host={} port={} user={} password={} dbname={} sslmode=disable",
            settings.host, settings.port, settings.username, settings.password, settings.database
        )),
        _ => None,
    }
}
