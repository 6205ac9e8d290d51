//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `state` - Engine snapshots (key: snapshot name, e.g. `pool`)
//! - `audit` - Append-only audit log of committed mutations (key: event_id)
//!
//! A snapshot is written after every committed mutation; reopening restores
//! the last committed snapshot, so invariants hold across restarts.

use crate::{
    error::{Error, Result},
    types::AuditEvent,
    PoolConfig,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, DB};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Column family names
const CF_STATE: &str = "state";
const CF_AUDIT: &str = "audit";

/// Snapshot key for the pool engine
pub const SNAPSHOT_POOL: &str = "pool";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &PoolConfig) -> Result<Self> {
        let path = &config.data_dir;
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_STATE, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_AUDIT, Self::cf_options_audit()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // Snapshots are read on every open, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_audit() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("column family {} not found", name)))
    }

    // Snapshot operations

    /// Persist an engine snapshot under `name`.
    pub fn put_snapshot<T: Serialize>(&self, name: &str, snapshot: &T) -> Result<()> {
        let cf = self.cf_handle(CF_STATE)?;
        let value = bincode::serialize(snapshot)?;
        self.db.put_cf(cf, name.as_bytes(), &value)?;
        Ok(())
    }

    /// Load the snapshot stored under `name`, if any.
    pub fn load_snapshot<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let cf = self.cf_handle(CF_STATE)?;
        match self.db.get_cf(cf, name.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    // Audit operations

    /// Append a committed-mutation record.
    pub fn append_audit(&self, event: &AuditEvent) -> Result<()> {
        let cf = self.cf_handle(CF_AUDIT)?;
        let key = event.event_id.as_bytes();
        let value = bincode::serialize(event)?;
        self.db.put_cf(cf, key, &value)?;

        tracing::debug!(event_id = %event.event_id, kind = ?event.kind, "audit event appended");
        Ok(())
    }

    /// All audit events in key (time) order.
    pub fn audit_events(&self) -> Result<Vec<AuditEvent>> {
        let cf = self.cf_handle(CF_AUDIT)?;
        let mut events = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            events.push(bincode::deserialize(&value)?);
        }
        Ok(events)
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}
