//! TTL-bound named locks

use crate::{StorageEngine, Table};
use gatehouse_core::services::LockService;
use gatehouse_core::*;
use std::time::Duration;

pub struct LockStore {
    table: Table,
}

impl LockStore {
    pub fn new(engine: &StorageEngine) -> Result<Self> {
        Ok(LockStore {
            table: engine.table("locks")?,
        })
    }
}

impl LockService for LockStore {
    fn acquire_lock(&self, name: &str, ttl: Duration) -> Result<()> {
        let _guard = self.table.engine().exclusive()?;

        if self.table.get::<String>(name)?.is_some() {
            return Err(GatehouseError::AlreadyExists(format!("lock '{}' is held", name)));
        }
        self.table.put(name, &name.to_string(), ttl)
    }

    fn release_lock(&self, name: &str) -> Result<()> {
        let _guard = self.table.engine().exclusive()?;

        if !self.table.remove(name)? {
            return Err(GatehouseError::NotFound(format!("lock '{}' is not held", name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    #[test]
    fn test_lock_is_exclusive() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let locks = LockStore::new(&engine).unwrap();

        locks.acquire_lock("init", Duration::from_secs(30)).unwrap();
        assert!(matches!(
            locks.acquire_lock("init", Duration::from_secs(30)).unwrap_err(),
            GatehouseError::AlreadyExists(_)
        ));
        locks.acquire_lock("other", Duration::from_secs(30)).unwrap();

        locks.release_lock("init").unwrap();
        locks.acquire_lock("init", Duration::from_secs(30)).unwrap();
    }

    #[test]
    fn test_lock_expires() {
        let clock = Arc::new(FakeClock::new(Utc::now()));
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let locks = LockStore::new(&engine.with_clock(clock.clone())).unwrap();

        locks.acquire_lock("init", Duration::from_secs(30)).unwrap();
        clock.advance(Duration::from_secs(31));
        locks.acquire_lock("init", Duration::from_secs(30)).unwrap();
    }

    #[test]
    fn test_release_unheld_lock() {
        let (engine, _temp) = StorageEngine::temp().unwrap();
        let locks = LockStore::new(&engine).unwrap();
        assert!(locks.release_lock("init").unwrap_err().is_not_found());
    }
}
