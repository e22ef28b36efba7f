use crate::{
    model::{AttributeModel, EntityModel, RelationshipModel},
    value::Value,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Write as _};

///
/// ModelFingerprint
///
/// SHA-256 over a tagged, length-prefixed canonical stream of one entity's
/// structure. Members are hashed in name order, so declaration order does
/// not change the fingerprint; any structural change does.
///

#[derive(Clone, Copy, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ModelFingerprint([u8; 32]);

impl ModelFingerprint {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
    }

    /// First 16 hex characters; used in collection names.
    #[must_use]
    pub fn short_hex(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(16);
        hex
    }

    pub(crate) fn of_entity(entity: &EntityModel) -> Self {
        let mut hasher = Sha256::new();
        write_tag(&mut hasher, 0x01);
        write_str(&mut hasher, &entity.name);

        let mut attributes: Vec<&AttributeModel> = entity.attributes.iter().collect();
        attributes.sort_by(|a, b| a.name.cmp(&b.name));
        write_len_u32(&mut hasher, attributes.len());
        for attribute in attributes {
            hash_attribute(&mut hasher, attribute);
        }

        let mut relationships: Vec<&RelationshipModel> = entity.relationships.iter().collect();
        relationships.sort_by(|a, b| a.name.cmp(&b.name));
        write_len_u32(&mut hasher, relationships.len());
        for relationship in relationships {
            hash_relationship(&mut hasher, relationship);
        }

        Self(hasher.finalize().into())
    }
}

impl fmt::Debug for ModelFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelFingerprint({})", self.short_hex())
    }
}

impl fmt::Display for ModelFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn hash_attribute(hasher: &mut Sha256, attribute: &AttributeModel) {
    write_tag(hasher, 0x02);
    write_str(hasher, &attribute.name);
    write_tag(hasher, attribute.kind.tag());
    write_bool(hasher, attribute.indexed);
    write_bool(hasher, attribute.transient);
    write_bool(hasher, attribute.optional);
    match &attribute.default {
        Some(value) => {
            write_tag(hasher, 0x01);
            hash_value(hasher, value);
        }
        None => write_tag(hasher, 0x00),
    }
}

fn hash_relationship(hasher: &mut Sha256, relationship: &RelationshipModel) {
    write_tag(hasher, 0x03);
    write_str(hasher, &relationship.name);
    write_str(hasher, &relationship.destination);
    write_bool(hasher, relationship.to_many);
    write_bool(hasher, relationship.ordered);
    match &relationship.inverse {
        Some(inverse) => {
            write_tag(hasher, 0x01);
            write_str(hasher, inverse);
        }
        None => write_tag(hasher, 0x00),
    }
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => write_tag(hasher, 0x10),
        Value::Bool(v) => {
            write_tag(hasher, 0x11);
            write_bool(hasher, *v);
        }
        Value::Int(v) => {
            write_tag(hasher, 0x12);
            hasher.update(v.to_be_bytes());
        }
        Value::Float(v) => {
            write_tag(hasher, 0x13);
            hasher.update(v.to_bits().to_be_bytes());
        }
        Value::Double(v) => {
            write_tag(hasher, 0x14);
            hasher.update(v.to_bits().to_be_bytes());
        }
        Value::Text(v) => {
            write_tag(hasher, 0x15);
            write_str(hasher, v);
        }
        Value::Blob(v) => {
            write_tag(hasher, 0x16);
            write_len_u32(hasher, v.len());
            hasher.update(v);
        }
        Value::Date(v) => {
            write_tag(hasher, 0x17);
            hasher.update(v.timestamp().to_be_bytes());
            hasher.update(v.timestamp_subsec_nanos().to_be_bytes());
        }
        Value::List(items) => {
            write_tag(hasher, 0x18);
            write_len_u32(hasher, items.len());
            for item in items {
                hash_value(hasher, item);
            }
        }
    }
}

fn write_str(hasher: &mut Sha256, value: &str) {
    write_len_u32(hasher, value.len());
    hasher.update(value.as_bytes());
}

/// Encode a platform-sized length as u32 with deterministic saturation.
fn write_len_u32(hasher: &mut Sha256, len: usize) {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    hasher.update(len.to_be_bytes());
}

fn write_bool(hasher: &mut Sha256, value: bool) {
    write_tag(hasher, u8::from(value));
}

fn write_tag(hasher: &mut Sha256, tag: u8) {
    hasher.update([tag]);
}

#[cfg(test)]
mod tests {
    use crate::model::{AttributeKind, AttributeModel, EntityModel, RelationshipModel};
    use proptest::prelude::*;

    fn person() -> EntityModel {
        EntityModel::new("Person")
            .with_attribute(AttributeModel::new("name", AttributeKind::String))
            .with_attribute(AttributeModel::new("age", AttributeKind::Integer32))
            .with_relationship(RelationshipModel::to_many("friends", "Person"))
    }

    #[test]
    fn identical_structure_yields_identical_fingerprint() {
        assert_eq!(person().fingerprint(), person().fingerprint());
    }

    #[test]
    fn declaration_order_does_not_matter() {
        let reordered = EntityModel::new("Person")
            .with_relationship(RelationshipModel::to_many("friends", "Person"))
            .with_attribute(AttributeModel::new("age", AttributeKind::Integer32))
            .with_attribute(AttributeModel::new("name", AttributeKind::String));

        assert_eq!(person().fingerprint(), reordered.fingerprint());
    }

    #[test]
    fn structural_changes_change_the_fingerprint() {
        let base = person().fingerprint();

        let retyped = person().with_attribute(AttributeModel::new("age", AttributeKind::Integer64));
        let indexed = person().with_attribute(
            AttributeModel::new("name", AttributeKind::String).indexed(),
        );
        let defaulted = person()
            .with_attribute(AttributeModel::new("age", AttributeKind::Integer32).with_default(1));
        let ordered = person()
            .with_relationship(RelationshipModel::to_many("friends", "Person").ordered());
        let renamed = EntityModel {
            name: "People".into(),
            ..person()
        };

        for changed in [retyped, indexed, defaulted, ordered, renamed] {
            assert_ne!(base, changed.fingerprint());
        }
    }

    #[test]
    fn hex_forms_are_consistent() {
        let fp = person().fingerprint();

        assert_eq!(fp.to_hex().len(), 64);
        assert!(fp.to_hex().starts_with(&fp.short_hex()));
        assert_eq!(fp.short_hex().len(), 16);
    }

    proptest! {
        #[test]
        fn attribute_name_sets_are_distinguished(
            names in proptest::collection::btree_set("[a-z]{1,8}", 1..6),
            extra in "[A-Z]{1,8}",
        ) {
            let base = names.iter().fold(EntityModel::new("E"), |entity, name| {
                entity.with_attribute(AttributeModel::new(name.clone(), AttributeKind::String))
            });
            let grown = base
                .clone()
                .with_attribute(AttributeModel::new(extra, AttributeKind::String));

            prop_assert_eq!(base.fingerprint(), base.clone().fingerprint());
            prop_assert_ne!(base.fingerprint(), grown.fingerprint());
        }
    }
}
