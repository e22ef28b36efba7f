//! Persisted store identity and per-entity version hashes.
//!
//! One record under a fixed key in its own table. It is written once, when
//! the store is first created, and only read afterwards.

use crate::{
    STORE_TYPE,
    engine::Engine,
    error::Error,
    model::{ModelFingerprint, ObjectModel},
    serialize::{deserialize, serialize},
    value::ResourceId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// MetadataRecord
///
/// On-disk form. The version-hash table is nested as its own encoded blob so
/// a damaged table is reported separately from a damaged envelope.
///

#[derive(Debug, Deserialize, Serialize)]
struct MetadataRecord {
    store_id: String,
    #[serde(with = "serde_bytes")]
    version_hashes: Vec<u8>,
}

///
/// StoreMetadata
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreMetadata {
    /// Random UUID assigned when the store was first created.
    pub store_id: String,
    pub store_type: &'static str,
    pub version_hashes: BTreeMap<String, ModelFingerprint>,
}

impl StoreMetadata {
    fn new(store_id: String, version_hashes: BTreeMap<String, ModelFingerprint>) -> Self {
        Self {
            store_id,
            store_type: STORE_TYPE,
            version_hashes,
        }
    }

    /// Entities whose persisted fingerprint differs from `model`.
    #[must_use]
    pub fn drift(&self, model: &ObjectModel) -> SchemaDrift {
        let current = model.version_hashes();
        let mut drift = SchemaDrift::default();

        for (entity, fingerprint) in &current {
            match self.version_hashes.get(entity) {
                None => drift.added.push(entity.clone()),
                Some(stored) if stored != fingerprint => drift.changed.push(entity.clone()),
                Some(_) => {}
            }
        }
        drift.removed = self
            .version_hashes
            .keys()
            .filter(|entity| !current.contains_key(*entity))
            .cloned()
            .collect();

        drift
    }

    fn encode(&self) -> Result<Vec<u8>, Error> {
        let record = MetadataRecord {
            store_id: self.store_id.clone(),
            version_hashes: serialize(&self.version_hashes)?,
        };

        Ok(serialize(&record)?)
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let record: MetadataRecord = deserialize(bytes)
            .map_err(|err| Error::corrupted_metadata(format!("metadata record: {err}")))?;
        let version_hashes = deserialize(&record.version_hashes)
            .map_err(|err| Error::corrupted_metadata(format!("version hash table: {err}")))?;

        Ok(Self::new(record.store_id, version_hashes))
    }
}

///
/// SchemaDrift
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SchemaDrift {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl SchemaDrift {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

///
/// LoadedMetadata
///

#[derive(Clone, Debug)]
pub struct LoadedMetadata {
    pub metadata: StoreMetadata,
    /// Difference between the persisted table and the opening model.
    pub drift: SchemaDrift,
    pub created: bool,
}

/// Read the metadata record, creating it on first open.
///
/// An existing record is returned exactly as persisted. Drift against
/// `model` is reported alongside it and never written back.
pub fn load_or_init(engine: &Engine, model: &ObjectModel) -> Result<LoadedMetadata, Error> {
    let txn = engine.write()?;

    if let Some(bytes) = txn.metadata()? {
        txn.abort()?;

        let metadata = StoreMetadata::decode(&bytes)?;
        let drift = metadata.drift(model);

        return Ok(LoadedMetadata {
            metadata,
            drift,
            created: false,
        });
    }

    let metadata = StoreMetadata::new(ResourceId::generate().to_string(), model.version_hashes());
    txn.put_metadata(&metadata.encode()?)?;
    txn.commit()?;

    tracing::info!(
        store_id = %metadata.store_id,
        entities = model.len(),
        "store metadata initialised"
    );

    Ok(LoadedMetadata {
        metadata,
        drift: SchemaDrift::default(),
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::StoreConfig,
        model::{AttributeKind, AttributeModel, EntityModel},
        test_fixtures,
    };

    fn engine() -> Engine {
        let engine = Engine::open(&StoreConfig::in_memory()).unwrap();
        engine.ensure_collections([]).unwrap();
        engine
    }

    #[test]
    fn first_open_creates_identity_and_hashes() {
        let engine = engine();
        let model = test_fixtures::model();

        let loaded = load_or_init(&engine, &model).unwrap();

        assert!(loaded.created);
        assert_eq!(loaded.metadata.store_type, STORE_TYPE);
        assert_eq!(loaded.metadata.store_id.len(), 36);
        assert_eq!(loaded.metadata.version_hashes, model.version_hashes());
    }

    #[test]
    fn reopen_keeps_the_store_identity() {
        let engine = engine();
        let model = test_fixtures::model();

        let first = load_or_init(&engine, &model).unwrap();
        let second = load_or_init(&engine, &model).unwrap();

        assert!(!second.created);
        assert!(second.drift.is_empty());
        assert_eq!(first.metadata, second.metadata);
    }

    #[test]
    fn model_changes_are_reported_as_drift() {
        let engine = engine();
        load_or_init(&engine, &test_fixtures::model()).unwrap();

        let changed = ObjectModel::new([
            test_fixtures::person()
                .with_attribute(AttributeModel::new("email", AttributeKind::String)),
            EntityModel::new("Shelf"),
        ]);
        let loaded = load_or_init(&engine, &changed).unwrap();

        assert_eq!(loaded.drift.changed, vec!["Person".to_string()]);
        assert_eq!(loaded.drift.added, vec!["Shelf".to_string()]);
        assert_eq!(loaded.drift.removed, vec!["Book".to_string()]);
    }

    #[test]
    fn drift_leaves_the_persisted_hashes_untouched() {
        let engine = engine();
        let original = test_fixtures::model();
        let first = load_or_init(&engine, &original).unwrap();

        let changed = ObjectModel::new([
            test_fixtures::person()
                .with_attribute(AttributeModel::new("email", AttributeKind::String)),
            test_fixtures::book(),
        ]);
        let reopened = load_or_init(&engine, &changed).unwrap();
        let again = load_or_init(&engine, &changed).unwrap();

        assert_eq!(reopened.metadata, first.metadata);
        assert_eq!(reopened.metadata.version_hashes, original.version_hashes());
        assert_ne!(reopened.metadata.version_hashes, changed.version_hashes());
        assert_eq!(again.drift, reopened.drift);
        assert_eq!(again.drift.changed, vec!["Person".to_string()]);
        assert!(load_or_init(&engine, &original).unwrap().drift.is_empty());
    }

    #[test]
    fn undecodable_records_are_corrupted_metadata() {
        let engine = engine();
        let txn = engine.write().unwrap();
        txn.put_metadata(&[0xff, 0x00, 0x13]).unwrap();
        txn.commit().unwrap();

        let err = load_or_init(&engine, &test_fixtures::model()).unwrap_err();

        assert!(matches!(err, Error::CorruptedMetadata { .. }));
    }

    #[test]
    fn undecodable_hash_tables_are_corrupted_metadata() {
        let engine = engine();
        let record = MetadataRecord {
            store_id: "S".into(),
            version_hashes: vec![0xff, 0xff],
        };
        let txn = engine.write().unwrap();
        txn.put_metadata(&serialize(&record).unwrap()).unwrap();
        txn.commit().unwrap();

        let err = load_or_init(&engine, &test_fixtures::model()).unwrap_err();

        assert!(err.to_string().contains("version hash table"), "{err}");
    }
}
