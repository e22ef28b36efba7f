use chrono::{DateTime, Utc};
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;
use uuid::Uuid;

///
/// ResourceId
///
/// Store-level primary key of one record inside its entity's collection.
///

#[derive(
    Clone, Debug, Deref, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, globally-unique resource id (upper-case UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string().to_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

///
/// ObjectKey
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ObjectKey {
    /// Framework-assigned placeholder for an object that has never been saved.
    Temporary(Ulid),
    Permanent(ResourceId),
}

///
/// ObjectId
///
/// Framework-managed object identifier: the entity plus either a temporary
/// key or the permanent resource id it maps to in the store.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId {
    entity: String,
    key: ObjectKey,
}

impl ObjectId {
    #[must_use]
    pub fn temporary(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            key: ObjectKey::Temporary(Ulid::new()),
        }
    }

    #[must_use]
    pub fn permanent(entity: impl Into<String>, resource_id: impl Into<ResourceId>) -> Self {
        Self {
            entity: entity.into(),
            key: ObjectKey::Permanent(resource_id.into()),
        }
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub const fn key(&self) -> &ObjectKey {
        &self.key
    }

    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self.key, ObjectKey::Temporary(_))
    }

    /// Resource id accessor; `None` while the id is still temporary.
    #[must_use]
    pub const fn resource_id(&self) -> Option<&ResourceId> {
        match &self.key {
            ObjectKey::Permanent(id) => Some(id),
            ObjectKey::Temporary(_) => None,
        }
    }

    #[must_use]
    pub fn to_ref(&self) -> Option<ObjectRef> {
        self.resource_id()
            .map(|id| ObjectRef::new(self.entity.clone(), id.clone()))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            ObjectKey::Temporary(ulid) => write!(f, "{}/~{ulid}", self.entity),
            ObjectKey::Permanent(id) => write!(f, "{}/{id}", self.entity),
        }
    }
}

///
/// ObjectRef
///
/// Opaque (entity, resourceID) pair standing in for an object pointer
/// whenever a record, a query constant, or a caller refers to another record.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectRef {
    pub entity: String,
    pub resource_id: ResourceId,
}

impl ObjectRef {
    #[must_use]
    pub fn new(entity: impl Into<String>, resource_id: impl Into<ResourceId>) -> Self {
        Self {
            entity: entity.into(),
            resource_id: resource_id.into(),
        }
    }

    #[must_use]
    pub fn to_object_id(&self) -> ObjectId {
        ObjectId::permanent(self.entity.clone(), self.resource_id.clone())
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity, self.resource_id)
    }
}

///
/// Value
///
/// Caller-facing attribute value. `List` only appears as a query literal
/// (`IN`, `BETWEEN`); it is never a storable attribute value.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(DateTime<Utc>),
    List(Vec<Self>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short label used in diagnostics and type-mismatch errors.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Date(_) => "date",
            Self::List(_) => "list",
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_resource_ids_are_upper_case_uuids() {
        let id = ResourceId::generate();

        assert_eq!(id.len(), 36);
        assert_eq!(id.as_str(), id.to_uppercase());
        assert!(Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(id, ResourceId::generate());
    }

    #[test]
    fn temporary_ids_have_no_resource_id() {
        let id = ObjectId::temporary("Person");

        assert!(id.is_temporary());
        assert!(id.resource_id().is_none());
        assert!(id.to_ref().is_none());
        assert!(id.to_string().starts_with("Person/~"));
    }

    #[test]
    fn permanent_ids_round_trip_through_refs() {
        let id = ObjectId::permanent("Person", "p1");
        let object_ref = id.to_ref().unwrap();

        assert_eq!(object_ref.to_string(), "Person/p1");
        assert_eq!(object_ref.to_object_id(), id);
    }

    #[test]
    fn optional_values_map_none_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }
}
