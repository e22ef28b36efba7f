use crate::predicate::{ComparePredicate, Expression, Predicate, QueryOperand, Reference};

///
/// Rewrite a predicate into its store-level form.
///
/// Rewriting guarantees:
/// - every object reference with a permanent id becomes a stored reference
/// - literals and key paths pass through unchanged
/// - compound structure, operator, modifier and options are preserved
/// - comparisons with a custom operator are returned untouched
/// - rewriting a rewritten predicate is a no-op
///
/// Temporary object ids have no resource id yet; they stay graph-level and
/// match no stored record.
///
#[must_use]
pub fn rewrite(predicate: &Predicate) -> Predicate {
    match predicate {
        Predicate::True => Predicate::True,
        Predicate::False => Predicate::False,
        Predicate::And(children) => Predicate::And(children.iter().map(rewrite).collect()),
        Predicate::Or(children) => Predicate::Or(children.iter().map(rewrite).collect()),
        Predicate::Not(inner) => Predicate::Not(Box::new(rewrite(inner))),
        Predicate::Compare(cmp) => Predicate::Compare(rewrite_compare(cmp)),
    }
}

fn rewrite_compare(cmp: &ComparePredicate) -> ComparePredicate {
    if cmp.op.is_custom() {
        return cmp.clone();
    }

    ComparePredicate {
        left: rewrite_expression(&cmp.left),
        op: cmp.op.clone(),
        right: rewrite_expression(&cmp.right),
        modifier: cmp.modifier,
        options: cmp.options,
    }
}

fn rewrite_expression(expr: &Expression) -> Expression {
    match expr {
        Expression::KeyPath(path) => Expression::KeyPath(path.clone()),
        Expression::Constant(operand) => Expression::Constant(rewrite_operand(operand)),
    }
}

fn rewrite_operand(operand: &QueryOperand) -> QueryOperand {
    match operand {
        QueryOperand::Literal(value) => QueryOperand::Literal(value.clone()),
        QueryOperand::SingleReference(reference) => {
            QueryOperand::SingleReference(rewrite_reference(reference))
        }
        QueryOperand::ReferenceList { refs, ordered } => QueryOperand::ReferenceList {
            refs: refs.iter().map(rewrite_reference).collect(),
            ordered: *ordered,
        },
    }
}

fn rewrite_reference(reference: &Reference) -> Reference {
    match reference {
        Reference::Object(id) => id
            .to_ref()
            .map_or_else(|| reference.clone(), Reference::Stored),
        Reference::Stored(_) => reference.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        predicate::{CompareOp, Modifier},
        value::{ObjectId, ObjectRef, Value},
    };
    use proptest::prelude::*;

    fn person(rid: &str) -> Reference {
        Reference::Object(ObjectId::permanent("Person", rid))
    }

    #[test]
    fn reference_operands_become_stored_references() {
        let predicate = Predicate::gt("age", 25) & Predicate::refers_to("spouse", person("p1"));

        let rewritten = rewrite(&predicate);

        let expected = Predicate::gt("age", 25)
            & Predicate::refers_to("spouse", ObjectRef::new("Person", "p1"));
        assert_eq!(rewritten, expected);
    }

    #[test]
    fn reference_lists_keep_order_and_kind() {
        let cmp = ComparePredicate::new(
            Expression::key("books"),
            CompareOp::In,
            Expression::references([person("b2"), person("b1")], true),
        )
        .with_modifier(Modifier::Any)
        .case_insensitive();

        let Predicate::Compare(out) = rewrite(&Predicate::Compare(cmp.clone())) else {
            panic!("compare must stay a compare");
        };

        assert_eq!(out.modifier, Modifier::Any);
        assert!(out.options.case_insensitive);
        assert_eq!(
            out.right,
            Expression::references(
                [
                    Reference::Stored(ObjectRef::new("Person", "b2")),
                    Reference::Stored(ObjectRef::new("Person", "b1")),
                ],
                true
            )
        );
    }

    #[test]
    fn custom_operators_pass_through() {
        let cmp = ComparePredicate::new(
            Expression::key("spouse"),
            CompareOp::Custom("isSimilarTo:".into()),
            Expression::reference(person("p1")),
        );
        let predicate = Predicate::Compare(cmp);

        assert_eq!(rewrite(&predicate), predicate);
    }

    #[test]
    fn temporary_ids_stay_graph_level() {
        let temp = Reference::Object(ObjectId::temporary("Person"));
        let predicate = Predicate::refers_to("spouse", temp);

        assert_eq!(rewrite(&predicate), predicate);
    }

    fn arb_reference() -> impl Strategy<Value = Reference> {
        prop_oneof![
            "[a-z0-9]{1,6}".prop_map(|rid| Reference::Object(ObjectId::permanent("Person", rid))),
            "[a-z0-9]{1,6}".prop_map(|rid| Reference::Stored(ObjectRef::new("Book", rid))),
            Just(()).prop_map(|()| Reference::Object(ObjectId::temporary("Person"))),
        ]
    }

    fn arb_operand() -> impl Strategy<Value = QueryOperand> {
        prop_oneof![
            any::<i64>().prop_map(|v| QueryOperand::Literal(Value::Int(v))),
            "[a-z]{0,8}".prop_map(|s| QueryOperand::Literal(Value::Text(s))),
            arb_reference().prop_map(QueryOperand::SingleReference),
            (prop::collection::vec(arb_reference(), 0..4), any::<bool>())
                .prop_map(|(refs, ordered)| QueryOperand::ReferenceList { refs, ordered }),
        ]
    }

    fn arb_op() -> impl Strategy<Value = CompareOp> {
        prop_oneof![
            Just(CompareOp::Eq),
            Just(CompareOp::Ne),
            Just(CompareOp::Gt),
            Just(CompareOp::In),
            Just(CompareOp::Custom("fn:".into())),
        ]
    }

    fn arb_predicate() -> impl Strategy<Value = Predicate> {
        let leaf = prop_oneof![
            Just(Predicate::True),
            Just(Predicate::False),
            ("[a-z]{1,5}", arb_op(), arb_operand()).prop_map(|(key, op, operand)| {
                Predicate::Compare(ComparePredicate::new(
                    Expression::KeyPath(key),
                    op,
                    Expression::Constant(operand),
                ))
            }),
        ];

        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Predicate::And),
                prop::collection::vec(inner.clone(), 0..4).prop_map(Predicate::Or),
                inner.prop_map(|p| Predicate::Not(Box::new(p))),
            ]
        })
    }

    proptest! {
        #[test]
        fn rewriting_is_idempotent(predicate in arb_predicate()) {
            let once = rewrite(&predicate);
            let twice = rewrite(&once);

            prop_assert_eq!(once, twice);
        }
    }
}
