use crate::model::{AttributeModel, ModelFingerprint, RelationshipModel};

///
/// EntityModel
///
/// One entity of the object model: ordered attributes plus relationships.
///

#[derive(Clone, Debug, PartialEq)]
pub struct EntityModel {
    pub name: String,
    /// Declaration order is preserved into the backing schema layout.
    pub attributes: Vec<AttributeModel>,
    pub relationships: Vec<RelationshipModel>,
}

impl EntityModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Add or replace an attribute, keeping the original position on replace.
    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeModel) -> Self {
        match self.attributes.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
        self
    }

    /// Add or replace a relationship.
    #[must_use]
    pub fn with_relationship(mut self, relationship: RelationshipModel) -> Self {
        match self
            .relationships
            .iter_mut()
            .find(|r| r.name == relationship.name)
        {
            Some(existing) => *existing = relationship,
            None => self.relationships.push(relationship),
        }
        self
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeModel> {
        self.attributes.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&RelationshipModel> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Structural version hash of this entity.
    #[must_use]
    pub fn fingerprint(&self) -> ModelFingerprint {
        ModelFingerprint::of_entity(self)
    }
}
