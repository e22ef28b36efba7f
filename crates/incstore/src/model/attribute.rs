use crate::value::Value;
use std::fmt;

///
/// AttributeKind
///
/// Semantic attribute type as declared by the object model.
/// Not every kind is storable; see `schema::AttributeCodec::for_kind`.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum AttributeKind {
    Boolean = 0x01,
    Integer16 = 0x02,
    Integer32 = 0x03,
    Integer64 = 0x04,
    Float = 0x05,
    Double = 0x06,
    String = 0x07,
    Binary = 0x08,
    Date = 0x09,
    Decimal = 0x0a,
    Transformable = 0x0b,
    ObjectId = 0x0c,
    Undefined = 0x0d,
}

impl AttributeKind {
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer16 => "integer16",
            Self::Integer32 => "integer32",
            Self::Integer64 => "integer64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Date => "date",
            Self::Decimal => "decimal",
            Self::Transformable => "transformable",
            Self::ObjectId => "object-id",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

///
/// AttributeModel
///

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeModel {
    pub name: String,
    pub kind: AttributeKind,
    pub indexed: bool,
    /// Transient attributes live only in memory and get no storage field.
    pub transient: bool,
    pub optional: bool,
    pub default: Option<Value>,
}

impl AttributeModel {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            indexed: false,
            transient: false,
            optional: true,
            default: None,
        }
    }

    #[must_use]
    pub const fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    #[must_use]
    pub const fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}
