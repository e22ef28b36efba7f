use crate::{
    RESOURCE_ID_FIELD, VERSION_FIELD,
    engine::StoredValue,
    model::ModelFingerprint,
    schema::AttributeCodec,
};
use std::{collections::BTreeMap, fmt};

///
/// StorageType
///
/// Engine-level type of one stored field.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StorageType {
    Bool,
    Int64,
    Float32,
    Float64,
    String,
    Bytes,
}

impl StorageType {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

///
/// FieldRole
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldRole {
    ResourceId,
    Version,
    Attribute(AttributeCodec),
}

///
/// FieldLayout
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldLayout {
    pub name: String,
    pub storage: StorageType,
    pub role: FieldRole,
    pub indexed: bool,
    pub optional: bool,
    pub primary: bool,
}

impl FieldLayout {
    pub(crate) fn resource_id() -> Self {
        Self {
            name: RESOURCE_ID_FIELD.to_string(),
            storage: StorageType::String,
            role: FieldRole::ResourceId,
            indexed: true,
            optional: false,
            primary: true,
        }
    }

    pub(crate) fn version() -> Self {
        Self {
            name: VERSION_FIELD.to_string(),
            storage: StorageType::Int64,
            role: FieldRole::Version,
            indexed: false,
            optional: false,
            primary: false,
        }
    }

    /// Codec for attribute fields; `None` for the two mandatory fields.
    #[must_use]
    pub const fn codec(&self) -> Option<AttributeCodec> {
        match self.role {
            FieldRole::Attribute(codec) => Some(codec),
            FieldRole::ResourceId | FieldRole::Version => None,
        }
    }
}

///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    /// Nullable single reference.
    Single,
    /// Reference collection keeping caller order.
    Ordered,
    /// Reference collection stored sorted and deduplicated.
    Unordered,
}

impl Cardinality {
    #[must_use]
    pub const fn is_many(self) -> bool {
        !matches!(self, Self::Single)
    }
}

///
/// ReferenceLayout
///
/// Storage field for one relationship. Collections are never null: an
/// absent field reads as the empty collection.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferenceLayout {
    pub name: String,
    pub destination: String,
    pub cardinality: Cardinality,
}

impl ReferenceLayout {
    /// Value read for a record that has never written this field.
    #[must_use]
    pub const fn empty_value(&self) -> StoredValue {
        match self.cardinality {
            Cardinality::Single => StoredValue::Null,
            Cardinality::Ordered | Cardinality::Unordered => StoredValue::Refs(Vec::new()),
        }
    }
}

///
/// BackingSchema
///
/// Storage layout for one entity at one fingerprint. Built once by the
/// translator and shared immutably through the registry.
///

#[derive(Clone, Debug, PartialEq)]
pub struct BackingSchema {
    pub entity: String,
    pub fingerprint: ModelFingerprint,
    /// Engine collection holding this entity's records.
    pub collection: String,
    /// `resourceID` and `version` first, then attributes in model order.
    pub fields: Vec<FieldLayout>,
    pub references: Vec<ReferenceLayout>,
    /// Pre-encoded default values by field name.
    pub defaults: BTreeMap<String, StoredValue>,
}

impl BackingSchema {
    #[must_use]
    pub fn collection_name(entity: &str, fingerprint: &ModelFingerprint) -> String {
        format!("{entity}_{}", fingerprint.short_hex())
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn reference(&self, name: &str) -> Option<&ReferenceLayout> {
        self.references.iter().find(|r| r.name == name)
    }

    /// Attribute fields only, in model order.
    pub fn attribute_fields(&self) -> impl Iterator<Item = (&FieldLayout, AttributeCodec)> {
        self.fields
            .iter()
            .filter_map(|field| field.codec().map(|codec| (field, codec)))
    }

    /// Fresh field map for a new record: defaults, then empty reference
    /// collections.
    #[must_use]
    pub fn initial_fields(&self) -> BTreeMap<String, StoredValue> {
        let mut fields = self.defaults.clone();
        for reference in &self.references {
            fields
                .entry(reference.name.clone())
                .or_insert_with(|| reference.empty_value());
        }

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandatory_fields_are_typed() {
        let rid = FieldLayout::resource_id();
        let version = FieldLayout::version();

        assert!(rid.primary && rid.indexed && !rid.optional);
        assert_eq!(rid.storage, StorageType::String);
        assert_eq!(version.storage, StorageType::Int64);
        assert!(rid.codec().is_none() && version.codec().is_none());
    }

    #[test]
    fn to_many_references_read_as_empty_collections() {
        let layout = ReferenceLayout {
            name: "books".into(),
            destination: "Book".into(),
            cardinality: Cardinality::Unordered,
        };

        assert_eq!(layout.empty_value(), StoredValue::Refs(Vec::new()));
    }
}
