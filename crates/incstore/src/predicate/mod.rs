//! Query predicates: the filter tree, its store-level rewrite, and
//! evaluation against stored records.

mod ast;
mod eval;
mod rewrite;

pub use ast::{
    CompareOp, CompareOptions, ComparePredicate, Expression, Modifier, Predicate, QueryOperand,
    Reference,
};
pub use eval::{check, evaluate};
pub use rewrite::rewrite;
