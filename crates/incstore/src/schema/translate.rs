use crate::{
    RESOURCE_ID_FIELD, VERSION_FIELD,
    error::Error,
    model::{AttributeModel, EntityModel, RelationshipModel},
    schema::{AttributeCodec, BackingSchema, Cardinality, FieldLayout, FieldRole, ReferenceLayout},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// Translate one entity into its backing schema.
///
/// - transient attributes get no field and no default entry
/// - integers of every width widen to `int64`
/// - defaults are pre-encoded with the attribute's codec
/// - any unstorable attribute kind fails the whole entity
///
pub fn translate(entity: &EntityModel) -> Result<BackingSchema, Error> {
    let fingerprint = entity.fingerprint();
    let mut names = BTreeSet::new();

    let mut fields = vec![FieldLayout::resource_id(), FieldLayout::version()];
    let mut defaults = BTreeMap::new();

    for attribute in entity.attributes.iter().filter(|a| !a.transient) {
        claim_name(entity, &attribute.name, &mut names)?;

        let codec = attribute_codec(entity, attribute)?;
        if let Some(default) = &attribute.default {
            let stored = codec
                .encode(default)
                .map_err(|err| err.into_error(&entity.name, &attribute.name))?;
            defaults.insert(attribute.name.clone(), stored);
        }

        fields.push(FieldLayout {
            name: attribute.name.clone(),
            storage: codec.storage_type(),
            role: FieldRole::Attribute(codec),
            indexed: attribute.indexed,
            optional: attribute.optional,
            primary: false,
        });
    }

    let mut references = Vec::with_capacity(entity.relationships.len());
    for relationship in &entity.relationships {
        claim_name(entity, &relationship.name, &mut names)?;
        references.push(reference_layout(relationship));
    }

    Ok(BackingSchema {
        entity: entity.name.clone(),
        collection: BackingSchema::collection_name(&entity.name, &fingerprint),
        fingerprint,
        fields,
        references,
        defaults,
    })
}

fn attribute_codec(
    entity: &EntityModel,
    attribute: &AttributeModel,
) -> Result<AttributeCodec, Error> {
    AttributeCodec::for_kind(attribute.kind).ok_or_else(|| Error::UnsupportedAttributeType {
        entity: entity.name.clone(),
        attribute: attribute.name.clone(),
        kind: attribute.kind,
    })
}

fn reference_layout(relationship: &RelationshipModel) -> ReferenceLayout {
    let cardinality = match (relationship.to_many, relationship.ordered) {
        (false, _) => Cardinality::Single,
        (true, true) => Cardinality::Ordered,
        (true, false) => Cardinality::Unordered,
    };

    ReferenceLayout {
        name: relationship.name.clone(),
        destination: relationship.destination.clone(),
        cardinality,
    }
}

// Property names share one namespace with the mandatory fields.
fn claim_name(entity: &EntityModel, name: &str, names: &mut BTreeSet<String>) -> Result<(), Error> {
    if name == RESOURCE_ID_FIELD || name == VERSION_FIELD || !names.insert(name.to_string()) {
        return Err(Error::ReservedPropertyName {
            entity: entity.name.clone(),
            property: name.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::StoredValue,
        model::AttributeKind,
        schema::StorageType,
        test_fixtures,
        value::Value,
    };
    use chrono::{TimeZone, Utc};

    #[test]
    fn mandatory_fields_come_first() {
        let schema = translate(&test_fixtures::person()).unwrap();

        assert_eq!(schema.fields[0].name, RESOURCE_ID_FIELD);
        assert_eq!(schema.fields[1].name, VERSION_FIELD);
        assert_eq!(schema.field("name").unwrap().storage, StorageType::String);
        assert_eq!(schema.field("age").unwrap().storage, StorageType::Int64);
    }

    #[test]
    fn transient_attributes_are_skipped() {
        let entity = EntityModel::new("Note")
            .with_attribute(AttributeModel::new("body", AttributeKind::String))
            .with_attribute(
                AttributeModel::new("draft", AttributeKind::String)
                    .transient()
                    .with_default("x"),
            );

        let schema = translate(&entity).unwrap();

        assert!(schema.field("draft").is_none());
        assert!(!schema.defaults.contains_key("draft"));
        assert_eq!(schema.fields.len(), 3);
    }

    #[test]
    fn unsupported_kinds_fail_the_entity() {
        for kind in [
            AttributeKind::Decimal,
            AttributeKind::Transformable,
            AttributeKind::ObjectId,
            AttributeKind::Undefined,
        ] {
            let entity = EntityModel::new("Invoice")
                .with_attribute(AttributeModel::new("total", kind));

            let err = translate(&entity).unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedAttributeType { kind: k, .. } if k == kind),
                "{err}"
            );
        }
    }

    #[test]
    fn date_defaults_are_pre_encoded() {
        let epoch_plus_day = Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap();
        let entity = EntityModel::new("Event").with_attribute(
            AttributeModel::new("at", AttributeKind::Date).with_default(epoch_plus_day),
        );

        let schema = translate(&entity).unwrap();

        assert_eq!(schema.defaults.get("at"), Some(&StoredValue::Double(86_400.0)));
        assert_eq!(schema.field("at").unwrap().storage, StorageType::Float64);
    }

    #[test]
    fn mistyped_defaults_are_rejected() {
        let entity = EntityModel::new("Event").with_attribute(
            AttributeModel::new("count", AttributeKind::Integer32).with_default("many"),
        );

        assert!(matches!(
            translate(&entity),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn reserved_names_are_rejected() {
        let entity = EntityModel::new("Thing")
            .with_attribute(AttributeModel::new(VERSION_FIELD, AttributeKind::Integer64));

        assert!(matches!(
            translate(&entity),
            Err(Error::ReservedPropertyName { .. })
        ));
    }

    #[test]
    fn relationship_cardinality_follows_the_model() {
        let schema = translate(&test_fixtures::person()).unwrap();

        assert_eq!(schema.reference("spouse").unwrap().cardinality, Cardinality::Single);
        assert_eq!(schema.reference("books").unwrap().cardinality, Cardinality::Unordered);
        assert_eq!(
            schema.reference("favourites").unwrap().cardinality,
            Cardinality::Ordered
        );
        assert_eq!(
            schema.initial_fields().get("books"),
            Some(&StoredValue::Refs(Vec::new()))
        );
    }

    #[test]
    fn translation_is_deterministic() {
        let a = translate(&test_fixtures::person()).unwrap();
        let b = translate(&test_fixtures::person()).unwrap();

        assert_eq!(a, b);
        assert!(a.collection.starts_with("Person_"));
        assert_eq!(a.collection.len(), "Person_".len() + 16);
    }

    #[test]
    fn defaults_keep_attribute_values() {
        let entity = EntityModel::new("Flag").with_attribute(
            AttributeModel::new("on", AttributeKind::Boolean).with_default(Value::Bool(true)),
        );

        let schema = translate(&entity).unwrap();

        assert_eq!(schema.defaults.get("on"), Some(&StoredValue::Bool(true)));
    }
}
