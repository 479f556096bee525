//! Node and authority server heartbeats

use crate::{StorageEngine, Table};
use gatehouse_core::services::PresenceService;
use gatehouse_core::*;
use std::time::Duration;

pub struct PresenceStore {
    table: Table,
}

impl PresenceStore {
    pub fn new(engine: &StorageEngine) -> Result<Self> {
        Ok(PresenceStore {
            table: engine.table("presence")?,
        })
    }

    fn upsert(&self, prefix: &str, server: Server, ttl: Duration) -> Result<()> {
        if server.id.is_empty() {
            return Err(GatehouseError::bad_parameter("id", "missing server id"));
        }
        self.table.put(&format!("{}{}", prefix, server.id), &server, ttl)
    }

    fn list(&self, prefix: &str) -> Result<Vec<Server>> {
        Ok(self
            .table
            .scan::<Server>(prefix)?
            .into_iter()
            .map(|(_, server)| server)
            .collect())
    }
}

impl PresenceService for PresenceStore {
    fn upsert_node(&self, server: Server, ttl: Duration) -> Result<()> {
        self.upsert("node/", server, ttl)
    }

    fn get_nodes(&self) -> Result<Vec<Server>> {
        self.list("node/")
    }

    fn upsert_auth_server(&self, server: Server, ttl: Duration) -> Result<()> {
        self.upsert("auth/", server, ttl)
    }

    fn get_auth_servers(&self) -> Result<Vec<Server>> {
        self.list("auth/")
    }
}
