use crate::{
    error::Error,
    model::{EntityModel, ModelFingerprint, ObjectModel},
    obs::{MetricsEvent, MetricsSink},
    schema::{BackingSchema, translate},
};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

type SchemaKey = (String, ModelFingerprint);

///
/// SchemaRegistry
///
/// Cache of translated backing schemas keyed by (entity, fingerprint).
///
/// Lookups of cached schemas share the read lock. A miss takes the
/// upgradable read lock, which admits at most one builder at a time while
/// readers keep going; the finished schema is inserted under the write lock
/// so it is only ever published whole.
///

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<SchemaKey, Arc<BackingSchema>>>,
    builds: AtomicUsize,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached schema for one entity, translating it on first use.
    pub fn schema_for(
        &self,
        entity: &EntityModel,
        sink: &dyn MetricsSink,
    ) -> Result<Arc<BackingSchema>, Error> {
        let key = (entity.name.clone(), entity.fingerprint());

        if let Some(schema) = self.schemas.read().get(&key) {
            return Ok(Arc::clone(schema));
        }

        let guard = self.schemas.upgradable_read();
        // another builder may have filled the slot while we waited
        if let Some(schema) = guard.get(&key) {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(translate(entity)?);
        self.builds.fetch_add(1, Ordering::Relaxed);
        sink.record(MetricsEvent::SchemaBuilt {
            entity: &entity.name,
        });
        tracing::debug!(
            entity = %entity.name,
            fingerprint = %key.1.short_hex(),
            fields = schema.fields.len(),
            references = schema.references.len(),
            "backing schema built"
        );

        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        guard.insert(key, Arc::clone(&schema));

        Ok(schema)
    }

    /// Schemas for every entity of a model.
    ///
    /// Also checks that every relationship destination names an entity of
    /// the same model.
    pub fn schemas_for(
        &self,
        model: &ObjectModel,
        sink: &dyn MetricsSink,
    ) -> Result<SchemaSet, Error> {
        let mut schemas = BTreeMap::new();
        for entity in model.entities() {
            for relationship in &entity.relationships {
                if model.entity(&relationship.destination).is_none() {
                    return Err(Error::RelationshipDestinationUnknown {
                        entity: entity.name.clone(),
                        relationship: relationship.name.clone(),
                        destination: relationship.destination.clone(),
                    });
                }
            }

            schemas.insert(entity.name.clone(), self.schema_for(entity, sink)?);
        }

        Ok(SchemaSet { schemas })
    }

    /// Number of translations performed since creation.
    #[must_use]
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }

    pub fn clear(&self) {
        self.schemas.write().clear();
    }
}

///
/// SchemaSet
///
/// Resolved schemas for one opened model, by entity name.
///

#[derive(Clone, Debug, Default)]
pub struct SchemaSet {
    schemas: BTreeMap<String, Arc<BackingSchema>>,
}

impl SchemaSet {
    pub fn get(&self, entity: &str) -> Result<&Arc<BackingSchema>, Error> {
        self.schemas
            .get(entity)
            .ok_or_else(|| Error::UnknownEntity(entity.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BackingSchema>> {
        self.schemas.values()
    }

    /// Engine collection names of every schema in the set.
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.schemas.values().map(|schema| schema.collection.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
