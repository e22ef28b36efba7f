//! Predicate evaluation over decoded store records.
//!
//! Runs after `rewrite`: reference constants are expected in stored form,
//! and literals compared with an attribute are lowered through that
//! attribute's codec, so a date literal compares against stored epoch
//! seconds and a double literal against a float32 field is narrowed first.

use crate::{
    RESOURCE_ID_FIELD, VERSION_FIELD,
    engine::{StoreObject, StoredValue, canonical_cmp},
    error::{Error, UnsupportedRequest},
    predicate::{
        CompareOp, CompareOptions, ComparePredicate, Expression, Modifier, Predicate,
        QueryOperand, Reference,
    },
    schema::{AttributeCodec, BackingSchema, FieldLayout, lower_literal},
    value::{ObjectRef, Value},
};
use std::cmp::Ordering;

///
/// Term
///
/// One resolved side of a comparison.
///

#[derive(Clone, Debug, PartialEq)]
enum Term {
    Scalar(StoredValue),
    List(Vec<StoredValue>),
    /// Reference with no stored counterpart; matches nothing.
    Unresolved,
}

/// Evaluate `predicate` against one record of `schema`'s collection.
pub fn evaluate(
    predicate: &Predicate,
    object: &StoreObject,
    schema: &BackingSchema,
) -> Result<bool, Error> {
    match predicate {
        Predicate::True => Ok(true),
        Predicate::False => Ok(false),
        Predicate::And(children) => {
            for child in children {
                if !evaluate(child, object, schema)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Predicate::Or(children) => {
            for child in children {
                if evaluate(child, object, schema)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Predicate::Not(inner) => Ok(!evaluate(inner, object, schema)?),
        Predicate::Compare(cmp) => evaluate_compare(cmp, object, schema),
    }
}

/// Reject predicates the store cannot evaluate, before any record is read.
pub fn check(predicate: &Predicate, schema: &BackingSchema) -> Result<(), Error> {
    match predicate {
        Predicate::True | Predicate::False => Ok(()),
        Predicate::And(children) | Predicate::Or(children) => {
            children.iter().try_for_each(|child| check(child, schema))
        }
        Predicate::Not(inner) => check(inner, schema),
        Predicate::Compare(cmp) => {
            if let CompareOp::Custom(name) = &cmp.op {
                return Err(UnsupportedRequest::CustomOperator(name.clone()).into());
            }
            for expr in [&cmp.left, &cmp.right] {
                if let Expression::KeyPath(path) = expr {
                    destination_of(path, schema)?;
                }
            }
            Ok(())
        }
    }
}

fn evaluate_compare(
    cmp: &ComparePredicate,
    object: &StoreObject,
    schema: &BackingSchema,
) -> Result<bool, Error> {
    if let CompareOp::Custom(name) = &cmp.op {
        return Err(UnsupportedRequest::CustomOperator(name.clone()).into());
    }

    // constants take the compared field's storage form: reference constants
    // only match records of its destination, literals go through its codec
    let (target, codec) = match (&cmp.left, &cmp.right) {
        (Expression::KeyPath(path), _) | (_, Expression::KeyPath(path)) => (
            destination_of(path, schema)?,
            schema.field(path).and_then(FieldLayout::codec),
        ),
        _ => (None, None),
    };

    let left = resolve(&cmp.left, object, schema, target, codec)?;
    let right = resolve(&cmp.right, object, schema, target, codec)?;

    compare_terms(&cmp.op, cmp.modifier, cmp.options, &left, &right)
}

///
/// RefTarget
///
/// What a reference constant is compared against: the primary key of
/// `entity` itself, or a reference field pointing at `entity`.
///

#[derive(Clone, Copy, Debug)]
struct RefTarget<'a> {
    entity: &'a str,
    primary_key: bool,
}

fn destination_of<'a>(
    path: &str,
    schema: &'a BackingSchema,
) -> Result<Option<RefTarget<'a>>, Error> {
    if path == RESOURCE_ID_FIELD {
        return Ok(Some(RefTarget {
            entity: &schema.entity,
            primary_key: true,
        }));
    }
    if let Some(reference) = schema.reference(path) {
        return Ok(Some(RefTarget {
            entity: &reference.destination,
            primary_key: false,
        }));
    }
    if path == VERSION_FIELD || schema.field(path).is_some() {
        return Ok(None);
    }

    Err(Error::unknown_property(&schema.entity, path))
}

fn resolve(
    expr: &Expression,
    object: &StoreObject,
    schema: &BackingSchema,
    target: Option<RefTarget<'_>>,
    codec: Option<AttributeCodec>,
) -> Result<Term, Error> {
    let lower = |value: &Value| codec.map_or_else(|| lower_literal(value), |c| c.lower(value));

    match expr {
        Expression::KeyPath(path) => resolve_key(path, object, schema),
        Expression::Constant(QueryOperand::Literal(Value::List(values))) => {
            Ok(Term::List(values.iter().map(lower).collect()))
        }
        Expression::Constant(QueryOperand::Literal(value)) => Ok(Term::Scalar(lower(value))),
        Expression::Constant(QueryOperand::SingleReference(reference)) => {
            Ok(stored_reference(reference, target).map_or(Term::Unresolved, Term::Scalar))
        }
        Expression::Constant(QueryOperand::ReferenceList { refs, .. }) => Ok(Term::List(
            refs.iter()
                .filter_map(|r| stored_reference(r, target))
                .collect(),
        )),
    }
}

fn resolve_key(path: &str, object: &StoreObject, schema: &BackingSchema) -> Result<Term, Error> {
    if path == RESOURCE_ID_FIELD {
        return Ok(Term::Scalar(StoredValue::Text(object.resource_id.to_string())));
    }
    if path == VERSION_FIELD {
        let version = i64::try_from(object.version).unwrap_or(i64::MAX);
        return Ok(Term::Scalar(StoredValue::Int(version)));
    }

    if let Some(reference) = schema.reference(path) {
        let stored = object
            .field(path)
            .cloned()
            .unwrap_or_else(|| reference.empty_value());

        return Ok(match stored {
            StoredValue::Refs(ids) => Term::List(ids.into_iter().map(StoredValue::Ref).collect()),
            other => Term::Scalar(other),
        });
    }

    if schema.field(path).is_some() {
        let stored = object.field(path).cloned().unwrap_or(StoredValue::Null);
        return Ok(Term::Scalar(stored));
    }

    Err(Error::unknown_property(&schema.entity, path))
}

// Primary-key comparisons see the resource id as text; reference fields
// compare against `StoredValue::Ref`.
fn stored_reference(reference: &Reference, target: Option<RefTarget<'_>>) -> Option<StoredValue> {
    let object_ref: ObjectRef = match reference {
        Reference::Stored(object_ref) => object_ref.clone(),
        Reference::Object(id) => id.to_ref()?,
    };

    match target {
        Some(target) if target.entity != object_ref.entity => None,
        Some(target) if target.primary_key => {
            Some(StoredValue::Text(object_ref.resource_id.to_string()))
        }
        _ => Some(StoredValue::Ref(object_ref.resource_id)),
    }
}

fn compare_terms(
    op: &CompareOp,
    modifier: Modifier,
    options: CompareOptions,
    left: &Term,
    right: &Term,
) -> Result<bool, Error> {
    if matches!(left, Term::Unresolved) || matches!(right, Term::Unresolved) {
        return Ok(false);
    }

    match (modifier, left) {
        (Modifier::Any, Term::List(items)) => {
            for item in items {
                if compare_scalar(op, options, item, right)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        (Modifier::All, Term::List(items)) => {
            for item in items {
                if !compare_scalar(op, options, item, right)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (_, Term::Scalar(value)) => compare_scalar(op, options, value, right),
        (Modifier::Direct, Term::List(items)) => compare_collection(op, options, items, right),
        (_, Term::Unresolved) => Ok(false),
    }
}

// Direct comparison with a collection on the left.
fn compare_collection(
    op: &CompareOp,
    options: CompareOptions,
    items: &[StoredValue],
    right: &Term,
) -> Result<bool, Error> {
    match (op, right) {
        (CompareOp::Contains, Term::Scalar(needle)) => {
            Ok(items.iter().any(|item| values_eq(item, needle, options)))
        }
        (CompareOp::Contains, Term::List(needles)) => Ok(needles
            .iter()
            .all(|needle| items.iter().any(|item| values_eq(item, needle, options)))),
        (CompareOp::Eq | CompareOp::Ne, Term::List(other)) => {
            let equal = same_members(items, other, options);
            Ok(equal == matches!(op, CompareOp::Eq))
        }
        (CompareOp::In, Term::List(_)) => {
            for item in items {
                if compare_scalar(op, options, item, right)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Ok(false),
    }
}

fn compare_scalar(
    op: &CompareOp,
    options: CompareOptions,
    left: &StoredValue,
    right: &Term,
) -> Result<bool, Error> {
    let matched = match (op, right) {
        (CompareOp::Custom(name), _) => {
            return Err(UnsupportedRequest::CustomOperator(name.clone()).into());
        }
        (CompareOp::In, Term::List(items)) => {
            items.iter().any(|item| values_eq(left, item, options))
        }
        (CompareOp::In, Term::Scalar(value)) => values_eq(left, value, options),
        (CompareOp::Between, Term::List(bounds)) => match bounds.as_slice() {
            [low, high] => {
                matches!(order(left, low, options), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(order(left, high, options), Some(Ordering::Less | Ordering::Equal))
            }
            _ => false,
        },
        (_, Term::List(_) | Term::Unresolved) => false,
        (CompareOp::Eq, Term::Scalar(value)) => values_eq(left, value, options),
        (CompareOp::Ne, Term::Scalar(value)) => !values_eq(left, value, options),
        (CompareOp::Lt, Term::Scalar(value)) => order(left, value, options) == Some(Ordering::Less),
        (CompareOp::Lte, Term::Scalar(value)) => matches!(
            order(left, value, options),
            Some(Ordering::Less | Ordering::Equal)
        ),
        (CompareOp::Gt, Term::Scalar(value)) => {
            order(left, value, options) == Some(Ordering::Greater)
        }
        (CompareOp::Gte, Term::Scalar(value)) => matches!(
            order(left, value, options),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        (CompareOp::Between, Term::Scalar(_)) => false,
        (CompareOp::Contains, Term::Scalar(value)) => {
            text_op(left, value, options, |h, n| h.contains(n))
        }
        (CompareOp::BeginsWith, Term::Scalar(value)) => {
            text_op(left, value, options, |h, n| h.starts_with(n))
        }
        (CompareOp::EndsWith, Term::Scalar(value)) => {
            text_op(left, value, options, |h, n| h.ends_with(n))
        }
        (CompareOp::Like, Term::Scalar(value)) => text_op(left, value, options, like),
    };

    Ok(matched)
}

fn values_eq(left: &StoredValue, right: &StoredValue, options: CompareOptions) -> bool {
    match (left, right) {
        (StoredValue::Text(a), StoredValue::Text(b)) if options.case_insensitive => {
            a.to_lowercase() == b.to_lowercase()
        }
        (StoredValue::Null, StoredValue::Null) => true,
        (StoredValue::Null, _) | (_, StoredValue::Null) => false,
        _ => order(left, right, options) == Some(Ordering::Equal),
    }
}

// Ordering between comparable values; `None` across families or with null.
fn order(left: &StoredValue, right: &StoredValue, options: CompareOptions) -> Option<Ordering> {
    match (left, right) {
        (StoredValue::Null, _) | (_, StoredValue::Null) => None,
        (StoredValue::Text(a), StoredValue::Text(b)) if options.case_insensitive => {
            Some(a.to_lowercase().cmp(&b.to_lowercase()))
        }
        (StoredValue::Int(a), StoredValue::Int(b)) => Some(a.cmp(b)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            (None, None) if std::mem::discriminant(left) == std::mem::discriminant(right) => {
                Some(canonical_cmp(left, right))
            }
            _ => None,
        },
    }
}

fn same_members(left: &[StoredValue], right: &[StoredValue], options: CompareOptions) -> bool {
    if left.len() != right.len() {
        return false;
    }

    let mut left = left.to_vec();
    let mut right = right.to_vec();
    left.sort_by(canonical_cmp);
    right.sort_by(canonical_cmp);

    left.iter()
        .zip(&right)
        .all(|(a, b)| values_eq(a, b, options))
}

fn text_op(
    left: &StoredValue,
    right: &StoredValue,
    options: CompareOptions,
    f: impl Fn(&str, &str) -> bool,
) -> bool {
    match (left, right) {
        (StoredValue::Text(haystack), StoredValue::Text(needle)) => {
            if options.case_insensitive {
                f(&haystack.to_lowercase(), &needle.to_lowercase())
            } else {
                f(haystack, needle)
            }
        }
        _ => false,
    }
}

/// Wildcard match: `*` is any run of characters, `?` exactly one.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
