use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::names::{Annotation, Name};

/// A field record of an entity or component
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    /// Declared type, or the element type for collection fields
    pub type_name: String,
    pub is_collection: bool,
    /// True when the field denotes a relation to another entity
    pub is_reference: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_entity_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub annotations: BTreeSet<Annotation>,
}

impl Field {
    /// Creates a plain scalar field
    pub fn scalar(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_collection: false,
            is_reference: false,
            referenced_entity_name: None,
            annotations: BTreeSet::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    /// Folds another record of the same field into this one
    fn absorb(&mut self, other: Field) {
        if self.type_name != other.type_name {
            tracing::debug!(
                "Field {} recorded as {} and {}, keeping {}",
                self.name,
                self.type_name,
                other.type_name,
                self.type_name
            );
        }
        self.annotations.extend(other.annotations);
        self.is_collection |= other.is_collection;
        self.is_reference |= other.is_reference;
        if self.referenced_entity_name.is_none() {
            self.referenced_entity_name = other.referenced_entity_name;
        }
    }
}

/// A persistent entity. Identity is the qualified name, not the field set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub name: Name,
    /// Fields, unique by name and kept sorted by name
    pub fields: Vec<Field>,
}

impl Entity {
    pub fn new(name: Name, fields: impl IntoIterator<Item = Field>) -> Self {
        let mut entity = Self {
            name,
            fields: Vec::new(),
        };
        for field in fields {
            entity.insert_field(field);
        }
        entity
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .binary_search_by(|f| f.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.fields[idx])
    }

    /// Merges another extraction of the same declaration into this entity
    pub fn merge(&mut self, other: Entity) {
        for field in other.fields {
            self.insert_field(field);
        }
    }

    fn insert_field(&mut self, field: Field) {
        match self
            .fields
            .binary_search_by(|f| f.name.as_str().cmp(field.name.as_str()))
        {
            Ok(idx) => self.fields[idx].absorb(field),
            Err(idx) => self.fields.insert(idx, field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_unions_fields_by_name() {
        let mut first = Entity::new(
            Name::qualified("com.acme.Order"),
            vec![Field::scalar("id", "Long").with_annotations([Annotation::new("Id")])],
        );
        let second = Entity::new(
            Name::qualified("com.acme.Order"),
            vec![
                Field::scalar("id", "Long").with_annotations([Annotation::new("Column")]),
                Field::scalar("total", "BigDecimal"),
            ],
        );

        first.merge(second);

        assert_eq!(first.fields.len(), 2);
        let id = first.field("id").unwrap();
        assert_eq!(id.annotations.len(), 2);
        assert!(first.field("total").is_some());
    }

    #[test]
    fn test_merge_keeps_first_type_on_divergence() {
        let mut first = Entity::new(
            Name::qualified("com.acme.Order"),
            vec![Field::scalar("total", "BigDecimal")],
        );
        let mut relation = Field::scalar("total", "Money");
        relation.is_reference = true;
        relation.referenced_entity_name = Some("Money".to_string());

        first.merge(Entity::new(Name::qualified("com.acme.Order"), vec![relation]));

        let total = first.field("total").unwrap();
        assert_eq!(total.type_name, "BigDecimal");
        assert!(total.is_reference);
        assert_eq!(total.referenced_entity_name.as_deref(), Some("Money"));
    }

    #[test]
    fn test_fields_sorted_by_name() {
        let entity = Entity::new(
            Name::new("Order"),
            vec![Field::scalar("z", "String"), Field::scalar("a", "String")],
        );
        let names: Vec<_> = entity.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "z"]);
    }
}
