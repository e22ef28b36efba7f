//! Embedded document engine boundary.
//!
//! Thin wrapper around redb providing exactly what the executors need:
//! primary-key CRUD per collection, predicate-filtered scans over a read
//! snapshot, and atomic write transactions. Readers observe a consistent
//! snapshot; writers are serialised by redb.

mod document;
mod tables;

pub use document::{StoreObject, StoredValue, canonical_cmp};
pub use tables::Tables;

use crate::{
    config::{Durability, StoreConfig},
    error::Error,
    serialize::{deserialize, serialize},
    value::ResourceId,
};
use redb::{Database, ReadTransaction, ReadableTable, TableError, WriteTransaction};
use thiserror::Error as ThisError;

///
/// EngineError
///

#[derive(Debug, ThisError)]
pub enum EngineError {
    #[error("failed to open database: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),
}

///
/// Engine
///

pub struct Engine {
    db: Database,
    durability: redb::Durability,
}

impl Engine {
    /// Open (or create) the database described by a validated config.
    pub fn open(config: &StoreConfig) -> Result<Self, Error> {
        config.validate()?;

        let mut builder = Database::builder();
        if let Some(bytes) = config.cache_size {
            builder.set_cache_size(bytes);
        }

        let db = match &config.path {
            Some(path) if !config.in_memory => builder.create(path),
            _ => builder.create_with_backend(redb::backends::InMemoryBackend::new()),
        }
        .map_err(EngineError::from)?;

        Ok(Self {
            db,
            durability: match config.durability {
                Durability::Immediate => redb::Durability::Immediate,
                Durability::Eventual => redb::Durability::Eventual,
                Durability::None => redb::Durability::None,
            },
        })
    }

    /// Create every collection table (and the metadata table) that does not
    /// exist yet, in one write transaction.
    pub fn ensure_collections<'a>(
        &self,
        collections: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), Error> {
        let txn = self.write()?;
        txn.txn
            .open_table(Tables::METADATA)
            .map_err(EngineError::from)?;
        for collection in collections {
            txn.txn
                .open_table(Tables::collection(collection))
                .map_err(EngineError::from)?;
        }

        txn.commit()
    }

    pub fn read(&self) -> Result<ReadSnapshot, Error> {
        let txn = self.db.begin_read().map_err(EngineError::from)?;

        Ok(ReadSnapshot { txn })
    }

    /// Begin the single write transaction of one logical save.
    /// Dropping the handle without `commit` aborts every change it made.
    pub fn write(&self) -> Result<WriteTxn, Error> {
        let mut txn = self.db.begin_write().map_err(EngineError::from)?;
        txn.set_durability(self.durability);

        Ok(WriteTxn { txn })
    }
}

///
/// ReadSnapshot
///

pub struct ReadSnapshot {
    txn: ReadTransaction,
}

impl ReadSnapshot {
    pub fn get(&self, collection: &str, key: &ResourceId) -> Result<Option<StoreObject>, Error> {
        let table = match self.txn.open_table(Tables::collection(collection)) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(EngineError::from(err).into()),
        };

        let found = table.get(key.as_str()).map_err(EngineError::from)?;
        let object = found.map(|bytes| deserialize(bytes.value())).transpose()?;

        Ok(object)
    }

    /// Scan one collection in primary-key order, keeping the objects the
    /// filter accepts.
    pub fn scan<F>(&self, collection: &str, mut filter: F) -> Result<Vec<StoreObject>, Error>
    where
        F: FnMut(&StoreObject) -> Result<bool, Error>,
    {
        let table = match self.txn.open_table(Tables::collection(collection)) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(err) => return Err(EngineError::from(err).into()),
        };

        let mut out = Vec::new();
        for entry in table.iter().map_err(EngineError::from)? {
            let (_, bytes) = entry.map_err(EngineError::from)?;
            let object: StoreObject = deserialize(bytes.value())?;
            if filter(&object)? {
                out.push(object);
            }
        }

        Ok(out)
    }

    /// Raw metadata record bytes, if one was ever written.
    pub fn metadata(&self) -> Result<Option<Vec<u8>>, Error> {
        let table = match self.txn.open_table(Tables::METADATA) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(EngineError::from(err).into()),
        };

        let found = table.get(Tables::METADATA_KEY).map_err(EngineError::from)?;
        let bytes = found.map(|bytes| bytes.value().to_vec());

        Ok(bytes)
    }
}

///
/// WriteTxn
///

pub struct WriteTxn {
    txn: WriteTransaction,
}

impl WriteTxn {
    pub fn get(&self, collection: &str, key: &ResourceId) -> Result<Option<StoreObject>, Error> {
        let table = self
            .txn
            .open_table(Tables::collection(collection))
            .map_err(EngineError::from)?;

        let found = table.get(key.as_str()).map_err(EngineError::from)?;
        let object = found.map(|bytes| deserialize(bytes.value())).transpose()?;

        Ok(object)
    }

    pub fn contains(&self, collection: &str, key: &ResourceId) -> Result<bool, Error> {
        let table = self
            .txn
            .open_table(Tables::collection(collection))
            .map_err(EngineError::from)?;

        let found = table.get(key.as_str()).map_err(EngineError::from)?;

        Ok(found.is_some())
    }

    /// Insert or overwrite one object under its resource id.
    pub fn put(&self, collection: &str, object: &StoreObject) -> Result<(), Error> {
        let bytes = serialize(object)?;
        let mut table = self
            .txn
            .open_table(Tables::collection(collection))
            .map_err(EngineError::from)?;
        table
            .insert(object.resource_id.as_str(), bytes.as_slice())
            .map_err(EngineError::from)?;

        Ok(())
    }

    /// Remove one object; returns whether it existed.
    pub fn remove(&self, collection: &str, key: &ResourceId) -> Result<bool, Error> {
        let mut table = self
            .txn
            .open_table(Tables::collection(collection))
            .map_err(EngineError::from)?;
        let existed = table
            .remove(key.as_str())
            .map_err(EngineError::from)?
            .is_some();

        Ok(existed)
    }

    pub fn metadata(&self) -> Result<Option<Vec<u8>>, Error> {
        let table = self
            .txn
            .open_table(Tables::METADATA)
            .map_err(EngineError::from)?;

        let found = table.get(Tables::METADATA_KEY).map_err(EngineError::from)?;
        let bytes = found.map(|bytes| bytes.value().to_vec());

        Ok(bytes)
    }

    pub fn put_metadata(&self, bytes: &[u8]) -> Result<(), Error> {
        let mut table = self
            .txn
            .open_table(Tables::METADATA)
            .map_err(EngineError::from)?;
        table
            .insert(Tables::METADATA_KEY, bytes)
            .map_err(EngineError::from)?;

        Ok(())
    }

    pub fn commit(self) -> Result<(), Error> {
        self.txn.commit().map_err(EngineError::from)?;

        Ok(())
    }

    /// Discard every change made in this transaction.
    pub fn abort(self) -> Result<(), Error> {
        self.txn.abort().map_err(EngineError::from)?;

        Ok(())
    }
}
