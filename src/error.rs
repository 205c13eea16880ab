use crate::params::ParamError;
use crate::registry::RegistryError;
use thiserror::Error;

/// Top-level error type for the condi library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("parameter error: {0}")]
    Param(#[from] ParamError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
