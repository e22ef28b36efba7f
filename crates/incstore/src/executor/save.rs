use crate::{
    engine::{StoreObject, StoredValue, WriteTxn},
    error::Error,
    executor::{
        ExecContext, ManagedObject, RelationshipValue, SaveChangesRequest, SaveOutcome,
        require_resource_id,
    },
    model::{EntityModel, RelationshipModel},
    obs::{ExecKind, Span},
    schema::{BackingSchema, Cardinality},
    value::{ObjectId, ObjectRef, ResourceId},
};
use std::collections::{BTreeMap, BTreeSet};
use ulid::Ulid;

///
/// SaveExecutor
///
/// Applies one save request inside exactly one write transaction.
/// Inserts run first, then updates, then deletes; the first failure drops
/// the transaction and nothing is committed.
///

pub(crate) struct SaveExecutor<'a> {
    ctx: ExecContext<'a>,
}

impl<'a> SaveExecutor<'a> {
    pub(crate) const fn new(ctx: ExecContext<'a>) -> Self {
        Self { ctx }
    }

    pub(crate) fn execute(&self, request: &SaveChangesRequest) -> Result<SaveOutcome, Error> {
        let mut span = Span::new(self.ctx.sink, ExecKind::Save, None);
        let txn = self.ctx.engine.write()?;

        let mut versions = BTreeMap::new();
        for object in &request.inserted {
            let (object_ref, version) = self.insert(&txn, object)?;
            versions.insert(object_ref, version);
        }
        for object in &request.updated {
            let (object_ref, version) = self.update(&txn, object)?;
            versions.insert(object_ref, version);
        }
        let mut deleted = Vec::with_capacity(request.deleted.len());
        for id in &request.deleted {
            deleted.push(self.delete(&txn, id)?);
        }

        txn.commit()?;

        let commit_id = Ulid::new();
        let rows = request.inserted.len() + request.updated.len() + request.deleted.len();
        span.set_rows(u64::try_from(rows).unwrap_or(u64::MAX));
        tracing::debug!(
            %commit_id,
            inserted = request.inserted.len(),
            updated = request.updated.len(),
            deleted = request.deleted.len(),
            "save committed"
        );

        Ok(SaveOutcome {
            commit_id,
            versions,
            deleted,
        })
    }

    fn insert(&self, txn: &WriteTxn, object: &ManagedObject) -> Result<(ObjectRef, u64), Error> {
        let resource_id = require_resource_id(&object.id)?;
        let (entity, schema) = self.resolve(&object.id)?;

        if txn.contains(&schema.collection, resource_id)? {
            return Err(Error::DuplicateResourceId(object_ref(&object.id, resource_id)));
        }

        let mut fields = schema.initial_fields();
        self.write_object(entity, schema, object, &mut fields)?;

        let record = StoreObject::new(resource_id.clone(), fields);
        txn.put(&schema.collection, &record)?;

        Ok((object_ref(&object.id, resource_id), record.version))
    }

    fn update(&self, txn: &WriteTxn, object: &ManagedObject) -> Result<(ObjectRef, u64), Error> {
        let resource_id = require_resource_id(&object.id)?;
        let (entity, schema) = self.resolve(&object.id)?;
        let target = object_ref(&object.id, resource_id);

        let mut record = txn
            .get(&schema.collection, resource_id)?
            .ok_or_else(|| Error::ObjectNotFound(target.clone()))?;

        if let Some(expected) = object.expected_version
            && expected != record.version
        {
            return Err(Error::VersionConflict {
                object: target,
                expected,
                found: record.version,
            });
        }

        self.write_object(entity, schema, object, &mut record.fields)?;
        record.version = next_version(record.version, &target)?;
        txn.put(&schema.collection, &record)?;

        Ok((target, record.version))
    }

    fn delete(&self, txn: &WriteTxn, id: &ObjectId) -> Result<ObjectRef, Error> {
        let resource_id = require_resource_id(id)?;
        let (_, schema) = self.resolve(id)?;
        let target = object_ref(id, resource_id);

        if !txn.remove(&schema.collection, resource_id)? {
            return Err(Error::ObjectNotFound(target));
        }

        Ok(target)
    }

    fn resolve(&self, id: &ObjectId) -> Result<(&'a EntityModel, &'a BackingSchema), Error> {
        let entity = self.ctx.model.try_entity(id.entity())?;
        let schema = self.ctx.schemas.get(id.entity())?;

        Ok((entity, schema.as_ref()))
    }

    // Encode values and relationships onto `fields`, then check that every
    // required attribute ends up non-null.
    fn write_object(
        &self,
        entity: &EntityModel,
        schema: &BackingSchema,
        object: &ManagedObject,
        fields: &mut BTreeMap<String, StoredValue>,
    ) -> Result<(), Error> {
        for (name, value) in &object.values {
            let Some(field) = schema.field(name) else {
                if entity.attribute(name).is_some_and(|a| a.transient) {
                    continue;
                }
                return Err(Error::unknown_property(&entity.name, name));
            };
            let Some(codec) = field.codec() else {
                return Err(Error::ReservedPropertyName {
                    entity: entity.name.clone(),
                    property: name.clone(),
                });
            };

            let stored = codec
                .encode(value)
                .map_err(|err| err.into_error(&entity.name, name))?;
            fields.insert(name.clone(), stored);
        }

        for (name, value) in &object.relationships {
            let stored = self.encode_relationship(entity, schema, name, value)?;
            fields.insert(name.clone(), stored);
        }

        for (field, codec) in schema.attribute_fields() {
            let missing = fields.get(&field.name).is_none_or(StoredValue::is_null);
            if !field.optional && missing {
                return Err(Error::type_mismatch(
                    &entity.name,
                    &field.name,
                    codec.value_label(),
                    "null",
                ));
            }
        }

        Ok(())
    }

    fn encode_relationship(
        &self,
        entity: &EntityModel,
        schema: &BackingSchema,
        name: &str,
        value: &RelationshipValue,
    ) -> Result<StoredValue, Error> {
        let (Some(relationship), Some(layout)) = (entity.relationship(name), schema.reference(name))
        else {
            return Err(Error::unknown_property(&entity.name, name));
        };
        let destination = self.ctx.model.entity(&relationship.destination).ok_or_else(|| {
            Error::RelationshipDestinationUnknown {
                entity: entity.name.clone(),
                relationship: relationship.name.clone(),
                destination: relationship.destination.clone(),
            }
        })?;
        if is_many_to_many(relationship, destination) {
            return Err(Error::RelationshipWriteUnsupported {
                entity: entity.name.clone(),
                relationship: relationship.name.clone(),
                reason: "many-to-many relationships are not persisted",
            });
        }

        let target_id = |id: &ObjectId| -> Result<ResourceId, Error> {
            if id.entity() != relationship.destination {
                return Err(Error::type_mismatch(
                    &entity.name,
                    name,
                    &relationship.destination,
                    id.entity(),
                ));
            }
            Ok(require_resource_id(id)?.clone())
        };

        let stored = match (layout.cardinality, value) {
            (Cardinality::Single, RelationshipValue::ToOne(None)) => StoredValue::Null,
            (Cardinality::Single, RelationshipValue::ToOne(Some(id))) => {
                StoredValue::Ref(target_id(id)?)
            }
            (Cardinality::Ordered, RelationshipValue::ToMany(ids)) => {
                let mut seen = BTreeSet::new();
                let mut refs = Vec::with_capacity(ids.len());
                for id in ids {
                    let resource_id = target_id(id)?;
                    if seen.insert(resource_id.clone()) {
                        refs.push(resource_id);
                    }
                }
                StoredValue::Refs(refs)
            }
            (Cardinality::Unordered, RelationshipValue::ToMany(ids)) => {
                let refs = ids
                    .iter()
                    .map(target_id)
                    .collect::<Result<BTreeSet<_>, _>>()?;
                StoredValue::Refs(refs.into_iter().collect())
            }
            (Cardinality::Single, RelationshipValue::ToMany(_)) => {
                return Err(Error::type_mismatch(&entity.name, name, "to-one", "to-many"));
            }
            (Cardinality::Ordered | Cardinality::Unordered, RelationshipValue::ToOne(_)) => {
                return Err(Error::type_mismatch(&entity.name, name, "to-many", "to-one"));
            }
        };

        Ok(stored)
    }
}

fn is_many_to_many(relationship: &RelationshipModel, destination: &EntityModel) -> bool {
    relationship.to_many
        && relationship
            .inverse
            .as_deref()
            .and_then(|inverse| destination.relationship(inverse))
            .is_some_and(|inverse| inverse.to_many)
}

fn object_ref(id: &ObjectId, resource_id: &ResourceId) -> ObjectRef {
    ObjectRef::new(id.entity(), resource_id.clone())
}

fn next_version(version: u64, object: &ObjectRef) -> Result<u64, Error> {
    version
        .checked_add(1)
        .ok_or_else(|| Error::VersionExhausted(object.clone()))
}
