//! Directory services backed by a fjall keyspace

use fjall::{Config, Keyspace, PersistMode};
use gatehouse_core::services::Services;
use gatehouse_core::*;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub mod ca;
pub mod keys;
pub mod locks;
pub mod presence;
pub mod provisioning;
pub mod table;
pub mod users;
pub mod web;

pub use ca::*;
pub use keys::*;
pub use locks::*;
pub use presence::*;
pub use provisioning::*;
pub use table::*;
pub use users::*;
pub use web::*;

/// Storage engine wrapping a fjall keyspace and the clock used for TTLs
#[derive(Clone)]
pub struct StorageEngine {
    keyspace: Arc<Keyspace>,
    clock: Arc<dyn Clock>,
    exclusive: Arc<Mutex<()>>,
}

impl StorageEngine {
    /// Open or create a storage engine at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::new(path);
        let keyspace = Arc::new(
            config
                .open()
                .map_err(|e| GatehouseError::Storage(e.to_string()))?,
        );

        Ok(StorageEngine {
            keyspace,
            clock: Arc::new(RealClock),
            exclusive: Arc::new(Mutex::new(())),
        })
    }

    /// Use `clock` for every expiry decision made by this engine
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create temporary storage engine for testing
    #[cfg(any(test, feature = "test-utils"))]
    pub fn temp() -> Result<(Self, tempfile::TempDir)> {
        let temp_dir = tempfile::tempdir()?;
        let engine = Self::new(temp_dir.path())?;
        Ok((engine, temp_dir))
    }

    /// Open the table (fjall partition) with the given name
    pub fn table(&self, name: &str) -> Result<Table> {
        Table::new(self.clone(), name)
    }

    /// All directory services over this keyspace
    pub fn services(&self) -> Result<Services> {
        Ok(Services {
            clock: self.clock.clone(),
            ca: Arc::new(CaStore::new(self)?),
            locks: Arc::new(LockStore::new(self)?),
            presence: Arc::new(PresenceStore::new(self)?),
            provisioning: Arc::new(ProvisioningStore::new(self)?),
            web: Arc::new(WebStore::new(self)?),
            users: Arc::new(UserStore::new(self)?),
            keys: Arc::new(KeyStore::new(self)?),
        })
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub(crate) fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Serialize read-modify-write sequences (claims, conditional deletes, locks)
    pub(crate) fn exclusive(&self) -> Result<MutexGuard<'_, ()>> {
        self.exclusive
            .lock()
            .map_err(|_| GatehouseError::Internal("storage guard poisoned".to_string()))
    }

    /// Persist all changes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(|e| GatehouseError::Storage(e.to_string()))
    }
}
