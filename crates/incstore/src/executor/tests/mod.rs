mod fetch;

use crate::{
    config::StoreConfig,
    executor::{ManagedObject, SaveChangesRequest},
    store::IncrementalStore,
    test_fixtures,
    value::ObjectId,
};

fn open_store() -> IncrementalStore {
    let mut store = IncrementalStore::new(StoreConfig::in_memory(), test_fixtures::model());
    store.open().unwrap();
    store
}

fn person(id: &str) -> ObjectId {
    ObjectId::permanent("Person", id)
}

fn book(id: &str) -> ObjectId {
    ObjectId::permanent("Book", id)
}

// Alice (30), bob (25) and Carol (41); bob is lower-case on purpose.
fn seed_people(store: &IncrementalStore) {
    let request = SaveChangesRequest::new()
        .insert(
            ManagedObject::new(person("p1"))
                .with_value("name", "Alice")
                .with_value("age", 30)
                .with_to_one("spouse", Some(person("p2"))),
        )
        .insert(
            ManagedObject::new(person("p2"))
                .with_value("name", "bob")
                .with_value("age", 25)
                .with_value("nickname", "Bobby"),
        )
        .insert(
            ManagedObject::new(person("p3"))
                .with_value("name", "Carol")
                .with_value("age", 41)
                .with_to_many("books", [book("b1"), book("b2")]),
        );

    store.save(&request).unwrap();
}
