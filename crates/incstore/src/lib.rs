//! Core runtime for incstore: entity models, backing schemas, predicate
//! rewriting, and the executors that persist an object graph inside an
//! embedded document store.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod model;
pub mod obs;
pub mod predicate;
pub mod schema;
pub mod serialize;
pub mod store;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Store type tag reported by `open()`.
pub const STORE_TYPE: &str = "IncrementalStore";

/// Mandatory primary-key field present on every backing schema.
pub const RESOURCE_ID_FIELD: &str = "resourceID";

/// Mandatory optimistic-versioning counter present on every backing schema.
pub const VERSION_FIELD: &str = "version";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No executors, engines, or serializers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        error::Error,
        executor::{
            FetchRequest, FetchResult, ManagedObject, RelationshipValue, ResolvedRelationship,
            ResultType, SaveChangesRequest, SortDescriptor, StoreRequest,
        },
        model::{AttributeKind, AttributeModel, EntityModel, ObjectModel, RelationshipModel},
        predicate::{CompareOp, Expression, Predicate, QueryOperand, Reference},
        store::IncrementalStore,
        value::{ObjectId, ObjectRef, ResourceId, Value},
    };
}
