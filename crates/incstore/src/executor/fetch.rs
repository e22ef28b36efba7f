use crate::{
    RESOURCE_ID_FIELD, VERSION_FIELD,
    engine::{StoreObject, StoredValue, canonical_cmp},
    error::Error,
    executor::{
        ExecContext, FetchRequest, FetchResult, ResultType, SortDescriptor, StoreNode,
        decode_node, decode_values, require_resource_id,
    },
    obs::{ExecKind, MetricsEvent, Span},
    predicate::{self, Predicate},
    schema::{BackingSchema, Cardinality},
    value::{ObjectId, Value},
};
use std::{cmp::Ordering, collections::BTreeMap};

///
/// FetchExecutor
///
/// Read-only: every fetch runs against one engine snapshot and never opens
/// a write transaction.
///

pub(crate) struct FetchExecutor<'a> {
    ctx: ExecContext<'a>,
}

impl<'a> FetchExecutor<'a> {
    pub(crate) const fn new(ctx: ExecContext<'a>) -> Self {
        Self { ctx }
    }

    pub(crate) fn execute(&self, request: &FetchRequest) -> Result<FetchResult, Error> {
        let mut span = Span::new(self.ctx.sink, ExecKind::Fetch, Some(request.entity.as_str()));
        let schema = self.ctx.schemas.get(&request.entity)?;

        let filter = request
            .predicate
            .as_ref()
            .map_or(Predicate::True, predicate::rewrite);
        predicate::check(&filter, schema)?;
        for descriptor in &request.sort {
            check_sort_key(schema, &descriptor.key)?;
        }
        if request.result_type == ResultType::Dictionaries {
            projection(schema, &request.properties_to_fetch)?;
        }

        let snapshot = self.ctx.engine.read()?;
        let mut scanned = 0_u64;
        let mut objects = snapshot.scan(&schema.collection, |object| {
            scanned += 1;
            predicate::evaluate(&filter, object, schema)
        })?;
        self.ctx.sink.record(MetricsEvent::RowsScanned {
            entity: &schema.entity,
            rows_scanned: scanned,
        });

        if !request.sort.is_empty() {
            objects.sort_by(|a, b| compare_objects(&request.sort, a, b));
        }
        let objects: Vec<StoreObject> = objects
            .into_iter()
            .skip(request.fetch_offset)
            .take(request.fetch_limit.unwrap_or(usize::MAX))
            .collect();
        span.set_rows(u64::try_from(objects.len()).unwrap_or(u64::MAX));

        tracing::debug!(
            entity = %schema.entity,
            scanned,
            matched = objects.len(),
            result_type = ?request.result_type,
            "fetch executed"
        );

        let result = match request.result_type {
            ResultType::Count => FetchResult::Count(objects.len()),
            ResultType::ObjectIds => FetchResult::ObjectIds(
                objects
                    .iter()
                    .map(|o| ObjectId::permanent(schema.entity.clone(), o.resource_id.clone()))
                    .collect(),
            ),
            ResultType::Objects => FetchResult::Objects(
                objects
                    .iter()
                    .map(|o| decode_node(schema, o))
                    .collect::<Result<_, _>>()?,
            ),
            ResultType::Dictionaries => {
                let names = projection(schema, &request.properties_to_fetch)?;
                FetchResult::Dictionaries(
                    objects
                        .iter()
                        .map(|o| project(schema, o, &names))
                        .collect::<Result<_, _>>()?,
                )
            }
        };

        Ok(result)
    }

    /// Load one record by object id.
    pub(crate) fn materialize(&self, id: &ObjectId) -> Result<StoreNode, Error> {
        let resource_id = require_resource_id(id)?;
        let schema = self.ctx.schemas.get(id.entity())?;

        let object = self
            .ctx
            .engine
            .read()?
            .get(&schema.collection, resource_id)?
            .ok_or_else(|| not_found(id))?;

        decode_node(schema, &object)
    }
}

fn not_found(id: &ObjectId) -> Error {
    id.to_ref()
        .map_or_else(|| Error::TemporaryObjectId(id.clone()), Error::ObjectNotFound)
}

fn check_sort_key(schema: &BackingSchema, key: &str) -> Result<(), Error> {
    let sortable = key == RESOURCE_ID_FIELD
        || key == VERSION_FIELD
        || schema.field(key).is_some()
        || schema
            .reference(key)
            .is_some_and(|r| r.cardinality == Cardinality::Single);

    if sortable {
        Ok(())
    } else {
        Err(Error::unknown_property(&schema.entity, key))
    }
}

fn sort_value(object: &StoreObject, key: &str) -> StoredValue {
    match key {
        RESOURCE_ID_FIELD => StoredValue::Text(object.resource_id.to_string()),
        VERSION_FIELD => StoredValue::Int(i64::try_from(object.version).unwrap_or(i64::MAX)),
        _ => object.field(key).cloned().unwrap_or(StoredValue::Null),
    }
}

fn compare_objects(sort: &[SortDescriptor], a: &StoreObject, b: &StoreObject) -> Ordering {
    for descriptor in sort {
        let (left, right) = (sort_value(a, &descriptor.key), sort_value(b, &descriptor.key));
        let ordering = match (&left, &right) {
            (StoredValue::Text(l), StoredValue::Text(r)) if descriptor.case_insensitive => {
                l.to_lowercase().cmp(&r.to_lowercase())
            }
            _ => canonical_cmp(&left, &right),
        };
        let ordering = if descriptor.ascending {
            ordering
        } else {
            ordering.reverse()
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

// Projected property names; attributes plus the two mandatory fields.
fn projection(schema: &BackingSchema, requested: &[String]) -> Result<Vec<String>, Error> {
    if requested.is_empty() {
        return Ok(schema
            .attribute_fields()
            .map(|(field, _)| field.name.clone())
            .collect());
    }

    for name in requested {
        if schema.field(name).is_none() {
            return Err(Error::unknown_property(&schema.entity, name));
        }
    }

    Ok(requested.to_vec())
}

fn project(
    schema: &BackingSchema,
    object: &StoreObject,
    names: &[String],
) -> Result<BTreeMap<String, Value>, Error> {
    let mut values = decode_values(schema, object)?;
    let mut row = BTreeMap::new();

    for name in names {
        let value = match name.as_str() {
            RESOURCE_ID_FIELD => Value::Text(object.resource_id.to_string()),
            VERSION_FIELD => Value::Int(i64::try_from(object.version).unwrap_or(i64::MAX)),
            _ => values.remove(name).unwrap_or(Value::Null),
        };
        row.insert(name.clone(), value);
    }

    Ok(row)
}
