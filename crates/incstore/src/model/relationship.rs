///
/// RelationshipModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationshipModel {
    pub name: String,
    /// Destination entity name; resolved lazily against the `ObjectModel`.
    pub destination: String,
    pub to_many: bool,
    /// Only meaningful for to-many relationships.
    pub ordered: bool,
    pub inverse: Option<String>,
}

impl RelationshipModel {
    #[must_use]
    pub fn to_one(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
            to_many: false,
            ordered: false,
            inverse: None,
        }
    }

    #[must_use]
    pub fn to_many(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            to_many: true,
            ..Self::to_one(name, destination)
        }
    }

    #[must_use]
    pub const fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    #[must_use]
    pub fn with_inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }
}
