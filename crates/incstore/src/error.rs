use crate::{
    config::ConfigError,
    engine::EngineError,
    model::AttributeKind,
    serialize::SerializeError,
    store::StoreState,
    value::{ObjectId, ObjectRef},
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Typed failure surfaced by every store operation.
/// Schema-build variants are model misconfiguration and abort the affected
/// operation; runtime variants are returned to the caller as-is.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("corrupted metadata: {message}")]
    CorruptedMetadata { message: String },

    #[error("unsupported attribute type {kind} on '{entity}.{attribute}'")]
    UnsupportedAttributeType {
        entity: String,
        attribute: String,
        kind: AttributeKind,
    },

    #[error("property name '{entity}.{property}' is reserved or already in use")]
    ReservedPropertyName { entity: String, property: String },

    #[error("unsupported request: {0}")]
    UnsupportedRequest(UnsupportedRequest),

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectRef),

    #[error("relationship '{entity}.{relationship}' points at unknown entity '{destination}'")]
    RelationshipDestinationUnknown {
        entity: String,
        relationship: String,
        destination: String,
    },

    #[error("relationship '{entity}.{relationship}' cannot be written: {reason}")]
    RelationshipWriteUnsupported {
        entity: String,
        relationship: String,
        reason: &'static str,
    },

    #[error("version conflict on {object}: expected {expected}, found {found}")]
    VersionConflict {
        object: ObjectRef,
        expected: u64,
        found: u64,
    },

    #[error("resource id already exists: {0}")]
    DuplicateResourceId(ObjectRef),

    #[error("version counter exhausted on {0}")]
    VersionExhausted(ObjectRef),

    #[error("object id has no permanent resource id: {0}")]
    TemporaryObjectId(ObjectId),

    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("unknown property '{entity}.{property}'")]
    UnknownProperty { entity: String, property: String },

    #[error("type mismatch on '{entity}.{property}': expected {expected}, found {found}")]
    TypeMismatch {
        entity: String,
        property: String,
        expected: String,
        found: String,
    },

    #[error("store is {found}, expected {expected}")]
    InvalidState {
        expected: StoreState,
        found: StoreState,
    },

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Serialize(#[from] SerializeError),
}

impl Error {
    pub(crate) fn corrupted_metadata(message: impl Into<String>) -> Self {
        Self::CorruptedMetadata {
            message: message.into(),
        }
    }

    pub(crate) fn unknown_property(entity: &str, property: &str) -> Self {
        Self::UnknownProperty {
            entity: entity.to_string(),
            property: property.to_string(),
        }
    }

    pub(crate) fn type_mismatch(
        entity: &str,
        property: &str,
        expected: impl fmt::Display,
        found: impl fmt::Display,
    ) -> Self {
        Self::TypeMismatch {
            entity: entity.to_string(),
            property: property.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::CorruptedMetadata { .. } => ErrorClass::Corruption,
            Self::ObjectNotFound(_) => ErrorClass::NotFound,
            Self::VersionConflict { .. } | Self::DuplicateResourceId(_) => ErrorClass::Conflict,
            Self::UnsupportedAttributeType { .. }
            | Self::UnsupportedRequest(_)
            | Self::RelationshipWriteUnsupported { .. } => ErrorClass::Unsupported,
            Self::Configuration(_)
            | Self::ReservedPropertyName { .. }
            | Self::RelationshipDestinationUnknown { .. }
            | Self::TemporaryObjectId(_)
            | Self::UnknownEntity(_)
            | Self::UnknownProperty { .. }
            | Self::TypeMismatch { .. }
            | Self::VersionExhausted(_)
            | Self::InvalidState { .. } => ErrorClass::InvariantViolation,
            Self::Engine(_) => ErrorClass::Internal,
            Self::Serialize(err) => err.class(),
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Configuration(_) => ErrorOrigin::Config,
            Self::CorruptedMetadata { .. } => ErrorOrigin::Metadata,
            Self::UnsupportedAttributeType { .. } | Self::ReservedPropertyName { .. } => {
                ErrorOrigin::Schema
            }
            Self::RelationshipDestinationUnknown { .. } | Self::UnknownEntity(_) => {
                ErrorOrigin::Model
            }
            Self::UnsupportedRequest(_) => ErrorOrigin::Query,
            Self::ObjectNotFound(_)
            | Self::RelationshipWriteUnsupported { .. }
            | Self::VersionConflict { .. }
            | Self::DuplicateResourceId(_)
            | Self::TemporaryObjectId(_)
            | Self::UnknownProperty { .. }
            | Self::TypeMismatch { .. }
            | Self::VersionExhausted(_)
            | Self::InvalidState { .. } => ErrorOrigin::Executor,
            Self::Engine(_) => ErrorOrigin::Store,
            Self::Serialize(_) => ErrorOrigin::Serialize,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound(_))
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin(), self.class(), self)
    }
}

///
/// UnsupportedRequest
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum UnsupportedRequest {
    #[error("batch update requests are not supported")]
    BatchUpdate,

    #[error("batch delete requests are not supported")]
    BatchDelete,

    #[error("unknown fetch result type code {0}")]
    ResultType(u8),

    #[error("custom comparison operator '{0}' cannot be evaluated by the store")]
    CustomOperator(String),
}

impl From<UnsupportedRequest> for Error {
    fn from(err: UnsupportedRequest) -> Self {
        Self::UnsupportedRequest(err)
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Corruption,
    NotFound,
    Internal,
    Conflict,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Corruption => "corruption",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Conflict => "conflict",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Config,
    Model,
    Schema,
    Query,
    Executor,
    Metadata,
    Store,
    Serialize,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Model => "model",
            Self::Schema => "schema",
            Self::Query => "query",
            Self::Executor => "executor",
            Self::Metadata => "metadata",
            Self::Store => "store",
            Self::Serialize => "serialize",
        };
        write!(f, "{label}")
    }
}
