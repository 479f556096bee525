//! Table abstraction over fjall partitions
//!
//! Values are stored as JSON records with an optional expiry. Expired records
//! read as absent and are removed lazily.

use crate::StorageEngine;
use chrono::{DateTime, Utc};
use fjall::{Partition, PartitionCreateOptions};
use gatehouse_core::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Serialize, Deserialize)]
struct Record<T> {
    value: T,
    expires: Option<DateTime<Utc>>,
}

/// Named partition holding TTL-aware JSON records
#[derive(Clone)]
pub struct Table {
    partition: Arc<Partition>,
    engine: StorageEngine,
}

impl Table {
    /// Create or open table
    pub(crate) fn new(engine: StorageEngine, name: &str) -> Result<Self> {
        let partition = Arc::new(
            engine
                .keyspace()
                .open_partition(name, PartitionCreateOptions::default())
                .map_err(|e| GatehouseError::Storage(e.to_string()))?,
        );

        Ok(Table {
            partition,
            engine,
        })
    }

    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    /// Store `value` under `key`; a zero `ttl` never expires
    pub fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let expires = expiry_after(self.engine.clock().now(), ttl)?;
        self.put_until(key, value, expires)
    }

    /// Store `value` under `key` with an absolute expiry
    pub fn put_until<T: Serialize>(&self, key: &str, value: &T, expires: Option<DateTime<Utc>>) -> Result<()> {
        let record = Record { value, expires };
        let bytes = serde_json::to_vec(&record)?;

        self.partition
            .insert(key, bytes)
            .map_err(|e| GatehouseError::Storage(e.to_string()))?;
        self.engine.persist()
    }

    /// Live value stored under `key`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        Ok(self.get_record(key)?.map(|(value, _)| value))
    }

    /// Live value stored under `key` together with its expiry
    pub fn get_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<(T, Option<DateTime<Utc>>)>> {
        let bytes = match self.partition.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(e) => return Err(GatehouseError::Storage(e.to_string())),
        };

        let record: Record<T> = serde_json::from_slice(&bytes)?;
        if self.is_expired(record.expires) {
            if let Err(e) = self.partition.remove(key) {
                warn!("failed to remove expired record {}: {}", key, e);
            }
            return Ok(None);
        }
        Ok(Some((record.value, record.expires)))
    }

    /// Remove `key`; returns whether a live value was there
    pub fn remove(&self, key: &str) -> Result<bool> {
        let live = match self.partition.get(key) {
            Ok(Some(bytes)) => {
                let record: Record<serde_json::Value> = serde_json::from_slice(&bytes)?;
                !self.is_expired(record.expires)
            }
            Ok(None) => false,
            Err(e) => return Err(GatehouseError::Storage(e.to_string())),
        };

        self.partition
            .remove(key)
            .map_err(|e| GatehouseError::Storage(e.to_string()))?;
        self.engine.persist()?;
        Ok(live)
    }

    /// Live values whose key starts with `prefix`, in key order
    pub fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<(String, T)>> {
        let mut values = Vec::new();

        for item in self.partition.prefix(prefix) {
            let (key, bytes) = item.map_err(|e| GatehouseError::Storage(format!("scan error: {}", e)))?;
            let record: Record<T> = serde_json::from_slice(&bytes)?;
            if self.is_expired(record.expires) {
                continue;
            }
            let key = String::from_utf8_lossy(&key).into_owned();
            values.push((key, record.value));
        }

        Ok(values)
    }

    fn is_expired(&self, expires: Option<DateTime<Utc>>) -> bool {
        expires.map_or(false, |expires| expires <= self.engine.clock().now())
    }
}
