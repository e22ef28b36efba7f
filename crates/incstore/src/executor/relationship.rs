use crate::{
    engine::StoredValue,
    error::Error,
    executor::{ExecContext, ResolvedRelationship, require_resource_id},
    obs::{ExecKind, Span},
    schema::Cardinality,
    value::{ObjectId, ObjectRef, ResourceId},
};

///
/// RelationshipExecutor
///
/// Reads a relationship's reference field and turns the stored resource ids
/// back into object ids of the destination entity.
///

pub(crate) struct RelationshipExecutor<'a> {
    ctx: ExecContext<'a>,
}

impl<'a> RelationshipExecutor<'a> {
    pub(crate) const fn new(ctx: ExecContext<'a>) -> Self {
        Self { ctx }
    }

    pub(crate) fn resolve(
        &self,
        id: &ObjectId,
        relationship: &str,
    ) -> Result<ResolvedRelationship, Error> {
        let mut span = Span::new(self.ctx.sink, ExecKind::Resolve, Some(id.entity()));

        let entity = self.ctx.model.try_entity(id.entity())?;
        let model = entity
            .relationship(relationship)
            .ok_or_else(|| Error::unknown_property(&entity.name, relationship))?;
        if self.ctx.model.entity(&model.destination).is_none() {
            return Err(Error::RelationshipDestinationUnknown {
                entity: entity.name.clone(),
                relationship: model.name.clone(),
                destination: model.destination.clone(),
            });
        }

        let resource_id = require_resource_id(id)?;
        let schema = self.ctx.schemas.get(&entity.name)?;
        let layout = schema
            .reference(relationship)
            .ok_or_else(|| Error::unknown_property(&entity.name, relationship))?;

        let object = self
            .ctx
            .engine
            .read()?
            .get(&schema.collection, resource_id)?
            .ok_or_else(|| {
                Error::ObjectNotFound(ObjectRef::new(id.entity(), resource_id.clone()))
            })?;

        let to_id = |rid: ResourceId| ObjectId::permanent(layout.destination.clone(), rid);
        let stored = object
            .field(relationship)
            .cloned()
            .unwrap_or_else(|| layout.empty_value());

        let resolved = match (layout.cardinality, stored) {
            (Cardinality::Single, StoredValue::Ref(rid)) => {
                ResolvedRelationship::ToOne(Some(to_id(rid)))
            }
            (Cardinality::Single, StoredValue::Null) => ResolvedRelationship::ToOne(None),
            (cardinality, StoredValue::Refs(rids)) if cardinality.is_many() => {
                ResolvedRelationship::ToMany {
                    ids: rids.into_iter().map(to_id).collect(),
                    ordered: cardinality == Cardinality::Ordered,
                }
            }
            (_, other) => {
                return Err(Error::type_mismatch(
                    &entity.name,
                    relationship,
                    "reference",
                    other.label(),
                ));
            }
        };
        span.set_rows(u64::try_from(resolved.ids().len()).unwrap_or(u64::MAX));

        Ok(resolved)
    }
}
