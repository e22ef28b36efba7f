//! Backing schemas: the storage layout derived from an entity model.
//!
//! `translate` turns one `EntityModel` into a `BackingSchema`; the
//! `SchemaRegistry` caches the result per model fingerprint. Schemas are
//! plain descriptors read by the generic codecs in `codec`.

mod codec;
mod registry;
mod translate;
mod types;

pub use codec::{AttributeCodec, CodecError, decode_date, encode_date, lower_literal};
pub use registry::{SchemaRegistry, SchemaSet};
pub use translate::translate;
pub use types::{
    BackingSchema, Cardinality, FieldLayout, FieldRole, ReferenceLayout, StorageType,
};
