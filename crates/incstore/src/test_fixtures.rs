use crate::model::{AttributeKind, AttributeModel, EntityModel, ObjectModel, RelationshipModel};

pub(crate) fn person() -> EntityModel {
    EntityModel::new("Person")
        .with_attribute(AttributeModel::new("name", AttributeKind::String).indexed())
        .with_attribute(AttributeModel::new("age", AttributeKind::Integer32))
        .with_attribute(AttributeModel::new("nickname", AttributeKind::String))
        .with_attribute(AttributeModel::new("born", AttributeKind::Date))
        .with_attribute(AttributeModel::new("score", AttributeKind::Double))
        .with_attribute(AttributeModel::new("active", AttributeKind::Boolean).with_default(true))
        .with_attribute(AttributeModel::new("photo", AttributeKind::Binary))
        .with_attribute(AttributeModel::new("scratch", AttributeKind::String).transient())
        .with_relationship(RelationshipModel::to_one("spouse", "Person").with_inverse("spouse"))
        .with_relationship(RelationshipModel::to_many("books", "Book").with_inverse("owner"))
        .with_relationship(RelationshipModel::to_many("favourites", "Book").ordered())
        .with_relationship(RelationshipModel::to_many("reading", "Book").with_inverse("readers"))
}

pub(crate) fn book() -> EntityModel {
    EntityModel::new("Book")
        .with_attribute(AttributeModel::new("title", AttributeKind::String).required())
        .with_attribute(AttributeModel::new("published", AttributeKind::Date))
        .with_attribute(AttributeModel::new("pages", AttributeKind::Integer16))
        .with_attribute(AttributeModel::new("rating", AttributeKind::Float))
        .with_relationship(RelationshipModel::to_one("owner", "Person").with_inverse("books"))
        .with_relationship(RelationshipModel::to_many("readers", "Person").with_inverse("reading"))
}

pub(crate) fn model() -> ObjectModel {
    ObjectModel::new([person(), book()])
}
