use crate::{
    engine::StoredValue,
    error::Error,
    model::AttributeKind,
    schema::StorageType,
    value::Value,
};
use chrono::{DateTime, Utc};
use thiserror::Error as ThisError;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

///
/// CodecError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CodecError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("value {value} does not fit in {bits} bits")]
    OutOfRange { bits: u8, value: i64 },

    #[error("stored date {0} is outside the representable range")]
    DateOutOfRange(String),
}

impl CodecError {
    /// Attach the failing property and surface as a type mismatch.
    pub(crate) fn into_error(self, entity: &str, property: &str) -> Error {
        match self {
            Self::Mismatch { expected, found } => {
                Error::type_mismatch(entity, property, expected, found)
            }
            Self::OutOfRange { bits, value } => {
                Error::type_mismatch(entity, property, format_args!("int{bits}"), value)
            }
            Self::DateOutOfRange(secs) => Error::type_mismatch(entity, property, "date", secs),
        }
    }
}

///
/// AttributeCodec
///
/// Pure encode/decode pair for one storable attribute kind. Dispatch is by
/// variant; every codec maps `Value::Null` to `StoredValue::Null` and back.
///
/// Dates are stored as `float64` seconds since the Unix epoch.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttributeCodec {
    Bool,
    Integer { bits: u8 },
    Float,
    Double,
    Text,
    Binary,
    Date,
}

impl AttributeCodec {
    /// Codec for a semantic kind; `None` when the kind has no storage form.
    #[must_use]
    pub const fn for_kind(kind: AttributeKind) -> Option<Self> {
        match kind {
            AttributeKind::Boolean => Some(Self::Bool),
            AttributeKind::Integer16 => Some(Self::Integer { bits: 16 }),
            AttributeKind::Integer32 => Some(Self::Integer { bits: 32 }),
            AttributeKind::Integer64 => Some(Self::Integer { bits: 64 }),
            AttributeKind::Float => Some(Self::Float),
            AttributeKind::Double => Some(Self::Double),
            AttributeKind::String => Some(Self::Text),
            AttributeKind::Binary => Some(Self::Binary),
            AttributeKind::Date => Some(Self::Date),
            AttributeKind::Decimal
            | AttributeKind::Transformable
            | AttributeKind::ObjectId
            | AttributeKind::Undefined => None,
        }
    }

    #[must_use]
    pub const fn storage_type(self) -> StorageType {
        match self {
            Self::Bool => StorageType::Bool,
            Self::Integer { .. } => StorageType::Int64,
            Self::Float => StorageType::Float32,
            Self::Double | Self::Date => StorageType::Float64,
            Self::Text => StorageType::String,
            Self::Binary => StorageType::Bytes,
        }
    }

    #[must_use]
    pub const fn value_label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer { .. } => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::Text => "text",
            Self::Binary => "blob",
            Self::Date => "date",
        }
    }

    #[expect(clippy::cast_possible_truncation)]
    pub fn encode(self, value: &Value) -> Result<StoredValue, CodecError> {
        let stored = match (self, value) {
            (_, Value::Null) => StoredValue::Null,
            (Self::Bool, Value::Bool(v)) => StoredValue::Bool(*v),
            (Self::Integer { bits }, Value::Int(v)) => {
                if !fits_bits(*v, bits) {
                    return Err(CodecError::OutOfRange { bits, value: *v });
                }
                StoredValue::Int(*v)
            }
            (Self::Float, Value::Float(v)) => StoredValue::Float(*v),
            (Self::Float, Value::Double(v)) => StoredValue::Float(*v as f32),
            (Self::Double, Value::Double(v)) => StoredValue::Double(*v),
            (Self::Double, Value::Float(v)) => StoredValue::Double(f64::from(*v)),
            (Self::Text, Value::Text(v)) => StoredValue::Text(v.clone()),
            (Self::Binary, Value::Blob(v)) => StoredValue::Bytes(v.clone()),
            (Self::Date, Value::Date(v)) => StoredValue::Double(encode_date(v)),
            (codec, other) => {
                return Err(CodecError::Mismatch {
                    expected: codec.value_label(),
                    found: other.label(),
                });
            }
        };

        Ok(stored)
    }

    /// Storage form of a query literal compared with this attribute.
    ///
    /// Literals the codec rejects (an integer against a double field, an
    /// out-of-range integer) keep their schema-free form and still compare
    /// numerically.
    #[must_use]
    pub fn lower(self, value: &Value) -> StoredValue {
        self.encode(value).unwrap_or_else(|_| lower_literal(value))
    }

    pub fn decode(self, stored: &StoredValue) -> Result<Value, CodecError> {
        let value = match (self, stored) {
            (_, StoredValue::Null) => Value::Null,
            (Self::Bool, StoredValue::Bool(v)) => Value::Bool(*v),
            (Self::Integer { .. }, StoredValue::Int(v)) => Value::Int(*v),
            (Self::Float, StoredValue::Float(v)) => Value::Float(*v),
            (Self::Double, StoredValue::Double(v)) => Value::Double(*v),
            (Self::Text, StoredValue::Text(v)) => Value::Text(v.clone()),
            (Self::Binary, StoredValue::Bytes(v)) => Value::Blob(v.clone()),
            (Self::Date, StoredValue::Double(secs)) => Value::Date(decode_date(*secs)?),
            (codec, other) => {
                return Err(CodecError::Mismatch {
                    expected: codec.storage_type().label(),
                    found: other.label(),
                });
            }
        };

        Ok(value)
    }
}

/// Lower a query literal to its storage form without a schema.
///
/// Uses the same fixed encodings as the attribute codecs (dates become
/// epoch seconds), so literals compare against stored fields directly.
#[must_use]
pub fn lower_literal(value: &Value) -> StoredValue {
    match value {
        Value::Null | Value::List(_) => StoredValue::Null,
        Value::Bool(v) => StoredValue::Bool(*v),
        Value::Int(v) => StoredValue::Int(*v),
        Value::Float(v) => StoredValue::Float(*v),
        Value::Double(v) => StoredValue::Double(*v),
        Value::Text(v) => StoredValue::Text(v.clone()),
        Value::Blob(v) => StoredValue::Bytes(v.clone()),
        Value::Date(v) => StoredValue::Double(encode_date(v)),
    }
}

#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn encode_date(date: &DateTime<Utc>) -> f64 {
    date.timestamp() as f64 + f64::from(date.timestamp_subsec_nanos()) / NANOS_PER_SEC
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn decode_date(secs: f64) -> Result<DateTime<Utc>, CodecError> {
    if !secs.is_finite() || secs.abs() > i64::MAX as f64 {
        return Err(CodecError::DateOutOfRange(secs.to_string()));
    }

    let whole = secs.floor();
    let mut whole_secs = whole as i64;
    let mut nanos = ((secs - whole) * NANOS_PER_SEC).round() as u32;
    if nanos >= 1_000_000_000 {
        whole_secs = whole_secs.saturating_add(1);
        nanos = 0;
    }

    DateTime::from_timestamp(whole_secs, nanos)
        .ok_or_else(|| CodecError::DateOutOfRange(secs.to_string()))
}

const fn fits_bits(value: i64, bits: u8) -> bool {
    match bits {
        16 => value >= i16::MIN as i64 && value <= i16::MAX as i64,
        32 => value >= i32::MIN as i64 && value <= i32::MAX as i64,
        _ => true,
    }
}
