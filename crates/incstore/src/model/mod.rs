//! Caller-supplied object model.
//!
//! Types in `model` describe *what the object graph looks like*; the `schema`
//! module derives *how it is stored*. Models are immutable once loaded.

mod attribute;
mod entity;
mod fingerprint;
mod relationship;

pub use attribute::{AttributeKind, AttributeModel};
pub use entity::EntityModel;
pub use fingerprint::ModelFingerprint;
pub use relationship::RelationshipModel;

use crate::error::Error;
use std::collections::BTreeMap;

///
/// ObjectModel
///
/// Full set of entities known to one store, keyed by entity name.
///

#[derive(Clone, Debug, Default)]
pub struct ObjectModel {
    entities: BTreeMap<String, EntityModel>,
}

impl ObjectModel {
    #[must_use]
    pub fn new(entities: impl IntoIterator<Item = EntityModel>) -> Self {
        Self {
            entities: entities
                .into_iter()
                .map(|entity| (entity.name.clone(), entity))
                .collect(),
        }
    }

    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityModel> {
        self.entities.get(name)
    }

    /// Look up an entity, failing with `UnknownEntity`.
    pub fn try_entity(&self, name: &str) -> Result<&EntityModel, Error> {
        self.entity(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityModel> {
        self.entities.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Per-entity version-hash table persisted in the store metadata.
    #[must_use]
    pub fn version_hashes(&self) -> BTreeMap<String, ModelFingerprint> {
        self.entities
            .iter()
            .map(|(name, entity)| (name.clone(), entity.fingerprint()))
            .collect()
    }
}
