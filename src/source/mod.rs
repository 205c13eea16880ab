//! Implicit configuration sources: secret files and environment variables.
//!
//! Secrets are consulted before the environment; operator-injected secret
//! mounts are more specific than ambient process configuration. Both sources
//! are soft: any I/O problem means "not configured here", never an error.

mod env;
mod secrets;

use std::path::{Path, PathBuf};

/// Default secrets mount point used by container orchestrators.
pub const DEFAULT_SECRETS_ROOT: &str = "/run/secrets";

/// Default prefix for environment variables picked up by the bulk scan.
pub const DEFAULT_ENV_PREFIX: &str = "CONDI_";

/// Read-through resolver over the implicit sources.
#[derive(Debug, Clone)]
pub struct Resolver {
    secrets_root: PathBuf,
    env_prefix: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_SECRETS_ROOT, DEFAULT_ENV_PREFIX)
    }
}

impl Resolver {
    pub fn new(secrets_root: impl AsRef<Path>, env_prefix: impl Into<String>) -> Self {
        Self {
            secrets_root: secrets_root.as_ref().to_path_buf(),
            env_prefix: env_prefix.into(),
        }
    }

    /// Resolves a single parameter: secret file first, then the environment
    /// variable named `UPPER(name)` (no prefix on direct lookups).
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.from_secrets(name).or_else(|| self.from_env(name))
    }

    /// Reads the secret file `<secrets-root>/<lower(name)>`, trailing
    /// whitespace trimmed. Any I/O problem means "not configured here".
    pub fn from_secrets(&self, name: &str) -> Option<String> {
        secrets::read(&self.secrets_root, name)
    }

    /// Reads the environment variable `UPPER(name)`.
    pub fn from_env(&self, name: &str) -> Option<String> {
        env::read(name)
    }

    /// Enumerates every regular file in the secrets root as a
    /// `(lowercased filename, trimmed content)` entry.
    ///
    /// Subdirectories are skipped with a warning. A missing or unreadable
    /// root yields no entries.
    pub fn scan_secrets(&self) -> Vec<(String, String)> {
        secrets::scan(&self.secrets_root)
    }

    /// Enumerates environment variables matching the configured prefix.
    ///
    /// The prefix is stripped and the remainder lowercased to form the
    /// parameter name; empty names are discarded.
    pub fn scan_env(&self) -> Vec<(String, String)> {
        env::scan(&self.env_prefix)
    }
}
