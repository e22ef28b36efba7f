use crate::{
    error::{Error, UnsupportedRequest},
    predicate::Predicate,
    value::{ObjectId, ObjectRef, Value},
};
use std::collections::BTreeMap;
use ulid::Ulid;

///
/// SortDescriptor
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SortDescriptor {
    pub key: String,
    pub ascending: bool,
    pub case_insensitive: bool,
}

impl SortDescriptor {
    #[must_use]
    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ascending: true,
            case_insensitive: false,
        }
    }

    #[must_use]
    pub fn descending(key: impl Into<String>) -> Self {
        Self {
            ascending: false,
            ..Self::ascending(key)
        }
    }

    #[must_use]
    pub const fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
}

///
/// ResultType
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ResultType {
    #[default]
    Objects,
    ObjectIds,
    Dictionaries,
    Count,
}

impl ResultType {
    /// Map a raw framework result-type code.
    pub const fn from_code(code: u8) -> Result<Self, Error> {
        match code {
            0 => Ok(Self::Objects),
            1 => Ok(Self::ObjectIds),
            2 => Ok(Self::Dictionaries),
            4 => Ok(Self::Count),
            other => Err(Error::UnsupportedRequest(UnsupportedRequest::ResultType(
                other,
            ))),
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Objects => 0,
            Self::ObjectIds => 1,
            Self::Dictionaries => 2,
            Self::Count => 4,
        }
    }
}

///
/// FetchRequest
///

#[derive(Clone, Debug, PartialEq)]
pub struct FetchRequest {
    pub entity: String,
    /// `None` fetches every record.
    pub predicate: Option<Predicate>,
    pub sort: Vec<SortDescriptor>,
    pub result_type: ResultType,
    /// Dictionary projection; empty means every attribute.
    pub properties_to_fetch: Vec<String>,
    pub fetch_limit: Option<usize>,
    pub fetch_offset: usize,
}

impl FetchRequest {
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            predicate: None,
            sort: Vec::new(),
            result_type: ResultType::Objects,
            properties_to_fetch: Vec::new(),
            fetch_limit: None,
            fetch_offset: 0,
        }
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn sort_by(mut self, descriptor: SortDescriptor) -> Self {
        self.sort.push(descriptor);
        self
    }

    #[must_use]
    pub const fn result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = result_type;
        self
    }

    #[must_use]
    pub fn properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties_to_fetch = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.fetch_limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.fetch_offset = offset;
        self
    }
}

///
/// StoreNode
///
/// Materialised record: non-null attribute values plus the version counter.
///

#[derive(Clone, Debug, PartialEq)]
pub struct StoreNode {
    pub id: ObjectId,
    pub values: BTreeMap<String, Value>,
    pub version: u64,
}

impl StoreNode {
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

///
/// FetchResult
///

#[derive(Clone, Debug, PartialEq)]
pub enum FetchResult {
    Objects(Vec<StoreNode>),
    ObjectIds(Vec<ObjectId>),
    Dictionaries(Vec<BTreeMap<String, Value>>),
    Count(usize),
}

impl FetchResult {
    /// Number of results, whatever their shape.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Objects(nodes) => nodes.len(),
            Self::ObjectIds(ids) => ids.len(),
            Self::Dictionaries(rows) => rows.len(),
            Self::Count(count) => *count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

///
/// RelationshipValue
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RelationshipValue {
    ToOne(Option<ObjectId>),
    ToMany(Vec<ObjectId>),
}

///
/// ManagedObject
///
/// One object of a save request. Only the values and relationships present
/// are written; on update everything else keeps its stored value.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ManagedObject {
    pub id: ObjectId,
    pub values: BTreeMap<String, Value>,
    pub relationships: BTreeMap<String, RelationshipValue>,
    /// Optimistic-versioning guard for updates.
    pub expected_version: Option<u64>,
}

impl ManagedObject {
    #[must_use]
    pub const fn new(id: ObjectId) -> Self {
        Self {
            id,
            values: BTreeMap::new(),
            relationships: BTreeMap::new(),
            expected_version: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_to_one(mut self, name: impl Into<String>, target: Option<ObjectId>) -> Self {
        self.relationships
            .insert(name.into(), RelationshipValue::ToOne(target));
        self
    }

    #[must_use]
    pub fn with_to_many(
        mut self,
        name: impl Into<String>,
        targets: impl IntoIterator<Item = ObjectId>,
    ) -> Self {
        self.relationships.insert(
            name.into(),
            RelationshipValue::ToMany(targets.into_iter().collect()),
        );
        self
    }

    #[must_use]
    pub const fn expecting_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

///
/// SaveChangesRequest
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SaveChangesRequest {
    pub inserted: Vec<ManagedObject>,
    pub updated: Vec<ManagedObject>,
    pub deleted: Vec<ObjectId>,
}

impl SaveChangesRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn insert(mut self, object: ManagedObject) -> Self {
        self.inserted.push(object);
        self
    }

    #[must_use]
    pub fn update(mut self, object: ManagedObject) -> Self {
        self.updated.push(object);
        self
    }

    #[must_use]
    pub fn delete(mut self, id: ObjectId) -> Self {
        self.deleted.push(id);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

///
/// SaveOutcome
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaveOutcome {
    /// Identifies the write transaction that committed this save.
    pub commit_id: Ulid,
    /// New version of every inserted or updated object.
    pub versions: BTreeMap<ObjectRef, u64>,
    pub deleted: Vec<ObjectRef>,
}

///
/// ResolvedRelationship
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResolvedRelationship {
    ToOne(Option<ObjectId>),
    ToMany { ids: Vec<ObjectId>, ordered: bool },
}

impl ResolvedRelationship {
    /// Every referenced id, in stored order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        match self {
            Self::ToOne(id) => id.iter().cloned().collect(),
            Self::ToMany { ids, .. } => ids.clone(),
        }
    }
}

///
/// StoreRequest
///

#[derive(Clone, Debug, PartialEq)]
pub enum StoreRequest {
    Fetch(FetchRequest),
    Save(SaveChangesRequest),
    BatchUpdate,
    BatchDelete,
}

///
/// RequestResult
///

#[derive(Clone, Debug, PartialEq)]
pub enum RequestResult {
    Fetch(FetchResult),
    Save(SaveOutcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_type_codes() {
        for code in [0, 1, 2, 4] {
            assert_eq!(ResultType::from_code(code).unwrap().code(), code);
        }

        assert!(matches!(
            ResultType::from_code(3),
            Err(Error::UnsupportedRequest(UnsupportedRequest::ResultType(3)))
        ));
    }

    #[test]
    fn managed_object_builders_collect_values() {
        let object = ManagedObject::new(ObjectId::permanent("Person", "p1"))
            .with_value("name", "Alice")
            .with_value("age", 30)
            .with_to_one("spouse", None)
            .expecting_version(2);

        assert_eq!(object.values.len(), 2);
        assert_eq!(
            object.relationships.get("spouse"),
            Some(&RelationshipValue::ToOne(None))
        );
        assert_eq!(object.expected_version, Some(2));
    }
}
