//! The process-wide container tying parameters and resources together.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error};

use crate::params::ParameterStore;
use crate::registry::{
    connection_string, BoxError, ConnectFn, ConnectSettings, Connection, RegistryError,
    ResourceRegistry,
};
use crate::source::{Resolver, DEFAULT_ENV_PREFIX, DEFAULT_SECRETS_ROOT};
use crate::Error;

/// Shared configuration and resource container.
///
/// Construct one at process start, call [`load()`](Self::load) to run the
/// bootstrap scans, and share it via `Arc`. All state sits behind read-write
/// locks, so getters, setters, and [`reload()`](Self::reload) may race freely.
///
/// ## Example
///
/// ```no_run
/// use condi::Container;
///
/// let container = Container::builder()
///     .with_env_prefix("MYAPP_")
///     .build();
/// container.load()?;
///
/// let listen_port = container.params().get_i64("listen_port")?;
/// # Ok::<(), condi::Error>(())
/// ```
pub struct Container {
    params: ParameterStore,
    registry: ResourceRegistry,
    drivers: HashMap<String, ConnectFn>,
}

impl Container {
    /// Creates a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    /// The parameter store.
    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// The database-connection registry.
    pub fn databases(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Runs the bootstrap sequence: rescans the secrets directory and the
    /// environment, then wires the default database from the `database_*`
    /// parameters.
    ///
    /// The scan results land in the store's implicit layer, which each run
    /// rebuilds, so repeated loads see changed source values. Explicit sets
    /// beat secrets, secrets beat environment. A failure in the
    /// default-database step is returned to the caller but never disturbs
    /// already-loaded parameters or other registered connections.
    pub fn load(&self) -> Result<(), Error> {
        debug!("loading configuration sources");

        self.params.rescan();

        if let Err(e) = self.load_default_database() {
            error!(error = %e, "failed to load default database");
            return Err(e);
        }

        Ok(())
    }

    /// Re-runs the bootstrap sequence.
    ///
    /// Intended as the body of an external reload trigger (e.g. a hang-up
    /// signal handler installed by the host binary). Safe to invoke while
    /// getters are in flight.
    pub fn reload(&self) -> Result<(), Error> {
        debug!("reloading configuration");
        self.load()
    }

    /// Closes every registered database connection, best-effort.
    pub fn close(&self) {
        self.registry.close_all();
    }

    /// Opens the default connection when a `database_host` parameter exists.
    ///
    /// No host means no default database, which is not an error. An
    /// unrecognized `database_driver` (or a factory failure) is.
    fn load_default_database(&self) -> Result<(), Error> {
        // Probe quietly: a database-less deployment is a normal state, not
        // worth a not-found warning on every bootstrap.
        let host = match self.params.find_string("database_host")? {
            Some(host) if !host.is_empty() => host,
            _ => {
                debug!("no database_host configured, skipping default database");
                return Ok(());
            }
        };

        let settings = ConnectSettings {
            host,
            port: self.params.get_i64("database_port")?,
            username: self.params.get_string("database_username")?,
            password: self.params.get_string("database_password")?,
            database: self.params.get_string("database_name")?,
        };
        let driver = self.params.get_string("database_driver")?;

        let rendered = connection_string(&driver, &settings)
            .ok_or_else(|| RegistryError::UnsupportedDriver(driver.clone()))?;
        let connect = self
            .drivers
            .get(&driver)
            .ok_or_else(|| RegistryError::UnsupportedDriver(driver.clone()))?;

        let database = connect(&rendered).map_err(|source| RegistryError::Connect {
            driver: driver.clone(),
            source,
        })?;
        self.registry.set_default_database(database);

        debug!(driver = %driver, "default database connected");
        Ok(())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let driver_names: Vec<&String> = self.drivers.keys().collect();
        f.debug_struct("Container")
            .field("params", &self.params)
            .field("registry", &self.registry)
            .field("drivers", &driver_names)
            .finish()
    }
}

/// Builder for a [`Container`].
///
/// Configures the secrets root, the environment prefix, and the driver
/// factories used by the default-database bootstrap. Building performs no
/// I/O; call [`Container::load`] afterwards.
#[must_use = "builders do nothing until .build() is called"]
pub struct ContainerBuilder {
    secrets_root: PathBuf,
    env_prefix: String,
    drivers: HashMap<String, ConnectFn>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self {
            secrets_root: PathBuf::from(DEFAULT_SECRETS_ROOT),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            drivers: HashMap::new(),
        }
    }
}

impl ContainerBuilder {
    /// Overrides the secrets directory (default `/run/secrets`).
    pub fn with_secrets_root(mut self, root: impl AsRef<Path>) -> Self {
        self.secrets_root = root.as_ref().to_path_buf();
        self
    }

    /// Overrides the environment-variable prefix used by the bulk scan.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Registers a connection factory for a driver name.
    ///
    /// The factory receives the rendered connection string and owns the
    /// actual dial, including any timeout.
    pub fn with_driver(
        mut self,
        name: impl Into<String>,
        connect: impl Fn(&str) -> Result<Arc<dyn Connection>, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.drivers.insert(name.into(), Box::new(connect));
        self
    }

    pub fn build(self) -> Container {
        Container {
            params: ParameterStore::new(Resolver::new(self.secrets_root, self.env_prefix)),
            registry: ResourceRegistry::new(),
            drivers: self.drivers,
        }
    }
}
