use thiserror::Error;

use super::driver::BoxError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("database connection '{0}' is not registered")]
    NotRegistered(String),

    #[error("database driver '{0}' is not supported")]
    UnsupportedDriver(String),

    #[error("failed to open '{driver}' connection: {source}")]
    Connect { driver: String, source: BoxError },
}
