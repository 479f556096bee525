//! Certificate authority store

use crate::{StorageEngine, Table};
use gatehouse_core::services::CaService;
use gatehouse_core::*;
use std::time::Duration;
use tracing::debug;

pub struct CaStore {
    table: Table,
}

impl CaStore {
    pub fn new(engine: &StorageEngine) -> Result<Self> {
        Ok(CaStore {
            table: engine.table("authorities")?,
        })
    }

    fn key(id: &CertAuthId) -> String {
        format!("{}/{}", id.kind, id.domain_name)
    }
}

impl CaService for CaStore {
    fn upsert_cert_authority(&self, ca: CertAuthority) -> Result<()> {
        if !is_valid_domain_name(&ca.id.domain_name) {
            return Err(GatehouseError::bad_parameter(
                "domain_name",
                format!("'{}' is not a valid dns name", ca.id.domain_name),
            ));
        }
        debug!("upserting {}", ca.id);
        self.table.put(&Self::key(&ca.id), &ca, Duration::ZERO)
    }

    fn get_cert_authority(&self, id: &CertAuthId, load_signing_keys: bool) -> Result<CertAuthority> {
        let ca: CertAuthority = self
            .table
            .get(&Self::key(id))?
            .ok_or_else(|| GatehouseError::NotFound(format!("no such CA: {}", id)))?;

        Ok(if load_signing_keys { ca } else { ca.without_secrets() })
    }

    fn get_cert_authorities(&self, kind: CertAuthType, load_signing_keys: bool) -> Result<Vec<CertAuthority>> {
        let authorities = self
            .table
            .scan::<CertAuthority>(&format!("{}/", kind))?
            .into_iter()
            .map(|(_, ca)| if load_signing_keys { ca } else { ca.without_secrets() })
            .collect();
        Ok(authorities)
    }

    fn delete_cert_authority(&self, id: &CertAuthId) -> Result<()> {
        if !self.table.remove(&Self::key(id))? {
            return Err(GatehouseError::NotFound(format!("no such CA: {}", id)));
        }
        Ok(())
    }
}
