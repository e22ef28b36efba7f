use super::*;
use crate::{
    error::{Error, UnsupportedRequest},
    executor::{FetchRequest, FetchResult, ResultType, SortDescriptor},
    predicate::{CompareOp, ComparePredicate, Expression, Predicate},
    schema::SchemaRegistry,
    value::Value,
};
use chrono::{TimeZone, Utc};
use std::{sync::Arc, thread};

// Names of the fetched people, in result order.
fn names(store: &IncrementalStore, request: &FetchRequest) -> Vec<String> {
    let FetchResult::Objects(nodes) = store.fetch(request).unwrap() else {
        panic!("expected objects");
    };

    nodes
        .iter()
        .filter_map(|node| node.value("name").and_then(Value::as_text))
        .map(str::to_string)
        .collect()
}

fn by_age() -> FetchRequest {
    FetchRequest::new("Person").sort_by(SortDescriptor::ascending("age"))
}

#[test]
fn filters_on_attribute_comparisons() {
    let store = open_store();
    seed_people(&store);

    assert_eq!(
        names(&store, &by_age().filter(Predicate::gt("age", 28))),
        ["Alice", "Carol"]
    );
    assert_eq!(
        names(&store, &by_age().filter(Predicate::eq("name", "bob") | Predicate::lt("age", 0))),
        ["bob"]
    );
    assert_eq!(
        names(
            &store,
            &by_age().filter(Predicate::compare(
                "age",
                CompareOp::In,
                Value::List(vec![25.into(), 41.into()])
            ))
        ),
        ["bob", "Carol"]
    );
    assert_eq!(
        names(
            &store,
            &by_age().filter(Predicate::compare(
                "age",
                CompareOp::Between,
                Value::List(vec![26.into(), 40.into()])
            ))
        ),
        ["Alice"]
    );
    assert_eq!(names(&store, &by_age().filter(Predicate::eq("version", 1))).len(), 3);
}

#[test]
fn text_operators_and_case_folding() {
    let store = open_store();
    seed_people(&store);

    let folded = Predicate::Compare(
        ComparePredicate::new(
            Expression::key("name"),
            CompareOp::Eq,
            Expression::literal("ALICE"),
        )
        .case_insensitive(),
    );
    assert_eq!(names(&store, &by_age().filter(folded)), ["Alice"]);
    assert!(names(&store, &by_age().filter(Predicate::eq("name", "ALICE"))).is_empty());

    assert_eq!(
        names(&store, &by_age().filter(Predicate::compare("name", CompareOp::Like, "?o*"))),
        ["bob"]
    );
    assert_eq!(
        names(&store, &by_age().filter(Predicate::compare("name", CompareOp::BeginsWith, "Ca"))),
        ["Carol"]
    );
}

#[test]
fn date_literals_compare_against_stored_dates() {
    let store = open_store();
    seed_people(&store);
    store
        .save(
            &SaveChangesRequest::new()
                .update(
                    ManagedObject::new(person("p1"))
                        .with_value("born", Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap()),
                )
                .update(
                    ManagedObject::new(person("p3"))
                        .with_value("born", Utc.with_ymd_and_hms(1970, 6, 1, 0, 0, 0).unwrap()),
                ),
        )
        .unwrap();

    let cutoff = Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap();

    assert_eq!(names(&store, &by_age().filter(Predicate::gt("born", cutoff))), ["Alice"]);
    assert_eq!(names(&store, &by_age().filter(Predicate::lt("born", cutoff))), ["Carol"]);
}

#[test]
fn float_fields_match_the_literals_they_were_saved_from() {
    let store = open_store();
    store
        .save(
            &SaveChangesRequest::new()
                .insert(
                    ManagedObject::new(book("b1"))
                        .with_value("title", "Dune")
                        .with_value("rating", 0.1_f64),
                )
                .insert(
                    ManagedObject::new(book("b2"))
                        .with_value("title", "Emma")
                        .with_value("rating", 4.7_f64),
                )
                .insert(ManagedObject::new(book("b3")).with_value("title", "Ulysses")),
        )
        .unwrap();

    let titles = |request: FetchRequest| -> Vec<String> {
        let FetchResult::Objects(nodes) = store.fetch(&request).unwrap() else {
            panic!("expected objects");
        };
        nodes
            .iter()
            .filter_map(|node| node.value("title").and_then(Value::as_text))
            .map(str::to_string)
            .collect()
    };
    let by_rating = || FetchRequest::new("Book").sort_by(SortDescriptor::ascending("rating"));

    assert_eq!(titles(by_rating().filter(Predicate::eq("rating", 0.1_f64))), ["Dune"]);
    assert_eq!(titles(by_rating().filter(Predicate::eq("rating", 0.1_f32))), ["Dune"]);
    assert_eq!(titles(by_rating().filter(Predicate::gt("rating", 0.1_f64))), ["Emma"]);
    assert_eq!(titles(by_rating().filter(Predicate::lt("rating", 1))), ["Dune"]);
    assert_eq!(
        titles(by_rating().filter(Predicate::compare(
            "rating",
            CompareOp::In,
            Value::List(vec![0.1_f64.into(), 4.7_f64.into()])
        ))),
        ["Dune", "Emma"]
    );
    assert_eq!(titles(by_rating()), ["Ulysses", "Dune", "Emma"]);
}

#[test]
fn sorts_then_pages() {
    let store = open_store();
    seed_people(&store);

    let descending = FetchRequest::new("Person").sort_by(SortDescriptor::descending("age"));
    assert_eq!(names(&store, &descending), ["Carol", "Alice", "bob"]);
    assert_eq!(names(&store, &descending.clone().offset(1).limit(1)), ["Alice"]);
    assert!(names(&store, &descending.clone().offset(5)).is_empty());

    let by_name = FetchRequest::new("Person").sort_by(SortDescriptor::ascending("name"));
    assert_eq!(names(&store, &by_name), ["Alice", "Carol", "bob"]);

    let folded = FetchRequest::new("Person")
        .sort_by(SortDescriptor::ascending("name").case_insensitive());
    assert_eq!(names(&store, &folded), ["Alice", "bob", "Carol"]);

    let count = store
        .fetch(&descending.result_type(ResultType::Count).limit(2))
        .unwrap();
    assert_eq!(count, FetchResult::Count(2));
}

#[test]
fn sort_keys_must_be_scalar() {
    let store = open_store();
    seed_people(&store);

    let by_spouse = FetchRequest::new("Person")
        .sort_by(SortDescriptor::ascending("spouse"))
        .sort_by(SortDescriptor::ascending("resourceID"));
    assert_eq!(names(&store, &by_spouse).len(), 3);

    for key in ["books", "height"] {
        let err = store
            .fetch(&FetchRequest::new("Person").sort_by(SortDescriptor::ascending(key)))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { ref property, .. } if property == key));
    }
}

#[test]
fn object_ids_come_back_permanent() {
    let store = open_store();
    seed_people(&store);

    let result = store
        .fetch(
            &FetchRequest::new("Person")
                .sort_by(SortDescriptor::ascending("resourceID"))
                .result_type(ResultType::ObjectIds),
        )
        .unwrap();

    assert_eq!(
        result,
        FetchResult::ObjectIds(vec![person("p1"), person("p2"), person("p3")])
    );
}

#[test]
fn dictionaries_project_requested_properties() {
    let store = open_store();
    seed_people(&store);

    let result = store
        .fetch(
            &by_age()
                .result_type(ResultType::Dictionaries)
                .properties(["name", "nickname", "resourceID", "version"]),
        )
        .unwrap();
    let FetchResult::Dictionaries(rows) = result else {
        panic!("expected dictionaries");
    };

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("name"), Some(&Value::Text("bob".into())));
    assert_eq!(rows[0].get("nickname"), Some(&Value::Text("Bobby".into())));
    assert_eq!(rows[0].get("resourceID"), Some(&Value::Text("p2".into())));
    assert_eq!(rows[0].get("version"), Some(&Value::Int(1)));
    assert_eq!(rows[1].get("nickname"), Some(&Value::Null));
    assert!(rows.iter().all(|row| row.len() == 4));
}

#[test]
fn empty_projection_means_every_attribute() {
    let store = open_store();
    seed_people(&store);

    let FetchResult::Dictionaries(rows) = store
        .fetch(&by_age().result_type(ResultType::Dictionaries).limit(1))
        .unwrap()
    else {
        panic!("expected dictionaries");
    };

    let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["active", "age", "born", "name", "nickname", "photo", "score"]
    );
}

#[test]
fn projection_rejects_unknown_and_relationship_names() {
    let store = open_store();

    for name in ["spouse", "height"] {
        let err = store
            .fetch(
                &FetchRequest::new("Person")
                    .result_type(ResultType::Dictionaries)
                    .properties([name]),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { .. }));
    }
}

#[test]
fn invalid_requests_fail_before_scanning() {
    let store = open_store();
    seed_people(&store);

    let custom = Predicate::Compare(ComparePredicate::new(
        Expression::key("name"),
        CompareOp::Custom("soundsLike".into()),
        Expression::literal("Alyce"),
    ));
    let err = store
        .fetch(&FetchRequest::new("Person").filter(Predicate::True & custom))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedRequest(UnsupportedRequest::CustomOperator(ref name)) if name == "soundsLike"
    ));

    let err = store
        .fetch(&FetchRequest::new("Person").filter(Predicate::eq("height", 180)))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownProperty { .. }));

    let err = store.fetch(&FetchRequest::new("Dog")).unwrap_err();
    assert!(matches!(err, Error::UnknownEntity(_)));

    assert_eq!(store.metrics().rows_scanned, 0);
}

#[test]
fn materialize_unknown_object_is_not_found() {
    let store = open_store();

    assert!(store.materialize(&person("nobody")).unwrap_err().is_not_found());
    assert!(matches!(
        store.materialize(&ObjectId::temporary("Person")),
        Err(Error::TemporaryObjectId(_))
    ));
}

#[test]
fn fetches_record_scan_metrics() {
    let store = open_store();
    seed_people(&store);

    store
        .fetch(&FetchRequest::new("Person").filter(Predicate::gt("age", 28)))
        .unwrap();
    let report = store.metrics();

    assert_eq!(report.fetch_calls, 1);
    assert_eq!(report.rows_scanned, 3);
    assert_eq!(report.rows_loaded, 2);
    assert_eq!(report.entities["Person"].rows_scanned, 3);
}

#[test]
fn concurrent_fetches_share_one_store() {
    let store = open_store();
    seed_people(&store);

    let shared = &store;
    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(move || {
                    shared
                        .fetch(&FetchRequest::new("Person").result_type(ResultType::Count))
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), FetchResult::Count(3));
        }
    });

    assert_eq!(store.metrics().fetch_calls, 8);
}

#[test]
fn stores_sharing_a_registry_build_each_schema_once() {
    let registry = Arc::new(SchemaRegistry::new());
    let mut first = IncrementalStore::new(StoreConfig::in_memory(), test_fixtures::model())
        .with_registry(Arc::clone(&registry));
    let mut second = IncrementalStore::new(StoreConfig::in_memory(), test_fixtures::model())
        .with_registry(Arc::clone(&registry));

    first.open().unwrap();
    second.open().unwrap();

    assert_eq!(registry.builds(), 2);
    assert_eq!(registry.len(), 2);
    assert_eq!(first.metrics().schemas_built, 2);
    assert_eq!(second.metrics().schemas_built, 0);
}
