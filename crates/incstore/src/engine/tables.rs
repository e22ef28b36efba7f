//! Table definitions for redb storage.
//!
//! Collections use the resource id as key and a CBOR-encoded `StoreObject`
//! as value. The metadata record lives in its own table under a fixed
//! integer key, outside every collection's resource-id space.

use redb::TableDefinition;

/// Table definitions for store storage.
pub struct Tables;

impl Tables {
    /// Store metadata: fixed key → serialized metadata record.
    pub const METADATA: TableDefinition<'static, u64, &'static [u8]> =
        TableDefinition::new("__incstore_metadata");

    /// Primary key of the single metadata record.
    pub const METADATA_KEY: u64 = 1;

    /// Backing collection: resource id → serialized `StoreObject`.
    #[must_use]
    pub const fn collection(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
        TableDefinition::new(name)
    }
}
