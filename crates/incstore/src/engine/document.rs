use crate::value::ResourceId;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeMap};

///
/// StoredValue
///
/// Storage-level field value. Attribute values reach this form through the
/// schema codecs; reference fields hold destination resource ids.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum StoredValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    Ref(ResourceId),
    Refs(Vec<ResourceId>),
}

impl StoredValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int64",
            Self::Float(_) => "float32",
            Self::Double(_) => "float64",
            Self::Text(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Ref(_) => "reference",
            Self::Refs(_) => "reference collection",
        }
    }

    /// Numeric view used for cross-width comparisons.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) | Self::Double(_) => 2,
            Self::Text(_) => 3,
            Self::Bytes(_) => 4,
            Self::Ref(_) => 5,
            Self::Refs(_) => 6,
        }
    }
}

/// Total order across stored values, used for sorting fetch results.
///
/// Values of different families order by family rank (null first); numbers
/// compare by magnitude regardless of width; NaN sorts after every number.
#[must_use]
pub fn canonical_cmp(left: &StoredValue, right: &StoredValue) -> Ordering {
    let by_rank = left.rank().cmp(&right.rank());
    if by_rank != Ordering::Equal {
        return by_rank;
    }

    match (left, right) {
        (StoredValue::Bool(a), StoredValue::Bool(b)) => a.cmp(b),
        (StoredValue::Text(a), StoredValue::Text(b)) => a.cmp(b),
        (StoredValue::Bytes(a), StoredValue::Bytes(b)) => a.cmp(b),
        (StoredValue::Ref(a), StoredValue::Ref(b)) => a.cmp(b),
        (StoredValue::Refs(a), StoredValue::Refs(b)) => a.cmp(b),
        (StoredValue::Int(a), StoredValue::Int(b)) => a.cmp(b),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            _ => Ordering::Equal,
        },
    }
}

///
/// StoreObject
///
/// One persisted record. `fields` holds attribute and reference values by
/// storage field name; absent fields read as null (or empty collection).
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StoreObject {
    pub resource_id: ResourceId,
    pub version: u64,
    pub fields: BTreeMap<String, StoredValue>,
}

impl StoreObject {
    #[must_use]
    pub const fn new(resource_id: ResourceId, fields: BTreeMap<String, StoredValue>) -> Self {
        Self {
            resource_id,
            version: 1,
            fields,
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&StoredValue> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_widths() {
        assert_eq!(
            canonical_cmp(&StoredValue::Int(2), &StoredValue::Double(2.5)),
            Ordering::Less
        );
        assert_eq!(
            canonical_cmp(&StoredValue::Float(3.0), &StoredValue::Int(3)),
            Ordering::Equal
        );
    }

    #[test]
    fn null_sorts_first() {
        assert_eq!(
            canonical_cmp(&StoredValue::Null, &StoredValue::Text(String::new())),
            Ordering::Less
        );
    }

    #[test]
    fn new_objects_start_at_version_one() {
        let object = StoreObject::new(ResourceId::new("p1"), BTreeMap::new());

        assert_eq!(object.version, 1);
    }
}
