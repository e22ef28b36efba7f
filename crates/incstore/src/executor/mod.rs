//! Executors: fetch, save, relationship resolution and identity assignment
//! against an opened engine and its resolved schema set.

mod fetch;
mod identity;
mod relationship;
mod request;
mod save;

#[cfg(test)]
mod tests;

pub(crate) use fetch::FetchExecutor;
pub(crate) use identity::assign_permanent_ids;
pub(crate) use relationship::RelationshipExecutor;
pub(crate) use save::SaveExecutor;

pub use request::{
    FetchRequest, FetchResult, ManagedObject, RelationshipValue, RequestResult,
    ResolvedRelationship, ResultType, SaveChangesRequest, SaveOutcome, SortDescriptor, StoreNode,
    StoreRequest,
};

use crate::{
    engine::{Engine, StoreObject},
    error::Error,
    model::ObjectModel,
    obs::MetricsSink,
    schema::{BackingSchema, SchemaSet},
    serialize::SerializeError,
    value::{ObjectId, ResourceId, Value},
};
use std::collections::BTreeMap;

///
/// ExecContext
///
/// Everything an executor borrows from an open store.
///

#[derive(Clone, Copy)]
pub(crate) struct ExecContext<'a> {
    pub(crate) engine: &'a Engine,
    pub(crate) model: &'a ObjectModel,
    pub(crate) schemas: &'a SchemaSet,
    pub(crate) sink: &'a dyn MetricsSink,
}

/// Permanent resource id of `id`, failing for temporary ids.
pub(crate) fn require_resource_id(id: &ObjectId) -> Result<&ResourceId, Error> {
    id.resource_id()
        .ok_or_else(|| Error::TemporaryObjectId(id.clone()))
}

/// Decode every non-null attribute of a stored record.
pub(crate) fn decode_values(
    schema: &BackingSchema,
    object: &StoreObject,
) -> Result<BTreeMap<String, Value>, Error> {
    let mut values = BTreeMap::new();
    for (field, codec) in schema.attribute_fields() {
        let Some(stored) = object.field(&field.name) else {
            continue;
        };

        let value = codec.decode(stored).map_err(|err| {
            SerializeError::Deserialize(format!(
                "{}/{} field '{}': {err}",
                schema.entity, object.resource_id, field.name
            ))
        })?;
        if !value.is_null() {
            values.insert(field.name.clone(), value);
        }
    }

    Ok(values)
}

pub(crate) fn decode_node(
    schema: &BackingSchema,
    object: &StoreObject,
) -> Result<StoreNode, Error> {
    Ok(StoreNode {
        id: ObjectId::permanent(schema.entity.clone(), object.resource_id.clone()),
        values: decode_values(schema, object)?,
        version: object.version,
    })
}
