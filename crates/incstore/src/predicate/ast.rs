use crate::value::{ObjectId, ObjectRef, Value};
use std::ops::{BitAnd, BitOr, Not};

///
/// CompareOp
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Contains,
    BeginsWith,
    EndsWith,
    Like,
    Between,
    /// Opaque caller-defined operator; never rewritten, never evaluated.
    Custom(String),
}

impl CompareOp {
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

///
/// Modifier
///
/// How a comparison applies to a to-many key path.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Modifier {
    #[default]
    Direct,
    Any,
    All,
}

///
/// CompareOptions
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct CompareOptions {
    pub case_insensitive: bool,
}

///
/// Reference
///
/// Object reference used as a query constant. `Object` is the graph-level
/// form supplied by callers; `Stored` is what the engine compares against.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Reference {
    Object(ObjectId),
    Stored(ObjectRef),
}

impl From<ObjectId> for Reference {
    fn from(id: ObjectId) -> Self {
        Self::Object(id)
    }
}

impl From<ObjectRef> for Reference {
    fn from(object_ref: ObjectRef) -> Self {
        Self::Stored(object_ref)
    }
}

///
/// QueryOperand
///

#[derive(Clone, Debug, PartialEq)]
pub enum QueryOperand {
    Literal(Value),
    SingleReference(Reference),
    /// A set (`ordered = false`) or an ordered list of references.
    ReferenceList { refs: Vec<Reference>, ordered: bool },
}

///
/// Expression
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    KeyPath(String),
    Constant(QueryOperand),
}

impl Expression {
    #[must_use]
    pub fn key(path: impl Into<String>) -> Self {
        Self::KeyPath(path.into())
    }

    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Constant(QueryOperand::Literal(value.into()))
    }

    #[must_use]
    pub fn reference(reference: impl Into<Reference>) -> Self {
        Self::Constant(QueryOperand::SingleReference(reference.into()))
    }

    #[must_use]
    pub fn references(refs: impl IntoIterator<Item = Reference>, ordered: bool) -> Self {
        Self::Constant(QueryOperand::ReferenceList {
            refs: refs.into_iter().collect(),
            ordered,
        })
    }
}

///
/// ComparePredicate
///

#[derive(Clone, Debug, PartialEq)]
pub struct ComparePredicate {
    pub left: Expression,
    pub op: CompareOp,
    pub right: Expression,
    pub modifier: Modifier,
    pub options: CompareOptions,
}

impl ComparePredicate {
    #[must_use]
    pub fn new(left: Expression, op: CompareOp, right: Expression) -> Self {
        Self {
            left,
            op,
            right,
            modifier: Modifier::Direct,
            options: CompareOptions::default(),
        }
    }

    #[must_use]
    pub const fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = modifier;
        self
    }

    #[must_use]
    pub const fn case_insensitive(mut self) -> Self {
        self.options.case_insensitive = true;
        self
    }
}

///
/// Predicate
///

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    True,
    False,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare(ComparePredicate),
}

impl Predicate {
    #[must_use]
    pub const fn and(preds: Vec<Self>) -> Self {
        Self::And(preds)
    }

    #[must_use]
    pub const fn or(preds: Vec<Self>) -> Self {
        Self::Or(preds)
    }

    #[must_use]
    #[expect(clippy::should_implement_trait)]
    pub fn not(pred: Self) -> Self {
        Self::Not(Box::new(pred))
    }

    /// `key <op> literal`, the common leaf shape.
    #[must_use]
    pub fn compare(key: &str, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate::new(
            Expression::key(key),
            op,
            Expression::literal(value),
        ))
    }

    #[must_use]
    pub fn eq(key: &str, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn gt(key: &str, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn lt(key: &str, value: impl Into<Value>) -> Self {
        Self::compare(key, CompareOp::Lt, value)
    }

    /// `key == <object>`, comparing a reference field to one object.
    #[must_use]
    pub fn refers_to(key: &str, reference: impl Into<Reference>) -> Self {
        Self::Compare(ComparePredicate::new(
            Expression::key(key),
            CompareOp::Eq,
            Expression::reference(reference),
        ))
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitAnd for &Predicate {
    type Output = Predicate;

    fn bitand(self, rhs: Self) -> Self::Output {
        Predicate::And(vec![self.clone(), rhs.clone()])
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

impl BitOr for &Predicate {
    type Output = Predicate;

    fn bitor(self, rhs: Self) -> Self::Output {
        Predicate::Or(vec![self.clone(), rhs.clone()])
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}
