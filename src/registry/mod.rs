//! Named database-connection registry.

mod driver;
mod error;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

pub use driver::{BoxError, ConnectFn, ConnectSettings, Connection, DRIVER_POSTGRES};
pub use error::RegistryError;

pub(crate) use driver::connection_string;

/// Canonical name of the default connection.
pub const DEFAULT_CONNECTION: &str = "default";

/// Mapping from logical name to database handle.
///
/// A name maps to at most one handle; re-registering replaces the previous
/// handle without closing it. Closing is an explicit bulk operation over
/// every registered handle.
#[derive(Default)]
pub struct ResourceRegistry {
    databases: RwLock<HashMap<String, Arc<dyn Connection>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handle under `name`, replacing any previous one.
    pub fn set_database(&self, name: impl Into<String>, database: Arc<dyn Connection>) -> &Self {
        self.databases.write().insert(name.into(), database);
        self
    }

    /// Registers a handle under the canonical default name.
    pub fn set_default_database(&self, database: Arc<dyn Connection>) -> &Self {
        self.set_database(DEFAULT_CONNECTION, database)
    }

    /// Replaces the whole connection map.
    pub fn set_databases(&self, databases: HashMap<String, Arc<dyn Connection>>) -> &Self {
        *self.databases.write() = databases;
        self
    }

    /// Looks up a handle by name.
    pub fn database(&self, name: &str) -> Result<Arc<dyn Connection>, RegistryError> {
        self.databases
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }

    /// Looks up the default handle.
    pub fn default_database(&self) -> Result<Arc<dyn Connection>, RegistryError> {
        self.database(DEFAULT_CONNECTION)
    }

    /// All registered handles, in no particular order.
    pub fn databases(&self) -> Vec<Arc<dyn Connection>> {
        self.databases.read().values().cloned().collect()
    }

    /// Closes every registered handle, best-effort.
    ///
    /// A failing close is logged and the loop continues; teardown is never
    /// all-or-nothing.
    pub fn close_all(&self) {
        for (name, database) in self.databases.read().iter() {
            match database.close() {
                Ok(()) => debug!(name = %name, "closed database connection"),
                Err(e) => error!(name = %name, error = %e, "error closing database connection"),
            }
        }
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.databases.read().keys().cloned().collect();
        f.debug_struct("ResourceRegistry")
            .field("databases", &names)
            .finish()
    }
}
