//! Entity and field records for entity-classified declarations.

use std::collections::BTreeSet;

use crate::catalog::{Declaration, FieldDecl};
use crate::config::ExtractionSettings;
use crate::model::{simple_type_name, Entity, Field};

/// Element type recorded when a collection's type argument cannot be determined
pub const UNKNOWN_ELEMENT_TYPE: &str = "Unknown";

pub struct EntityModelBuilder<'a> {
    settings: &'a ExtractionSettings,
}

impl<'a> EntityModelBuilder<'a> {
    pub fn new(settings: &'a ExtractionSettings) -> Self {
        Self { settings }
    }

    /// Builds exactly one entity with one field per declared field
    pub fn build(&self, declaration: &Declaration, fields: &[FieldDecl]) -> Entity {
        let records: Vec<Field> = fields
            .iter()
            .map(|f| self.build_field(declaration, f))
            .collect();
        Entity::new(declaration.name.clone(), records)
    }

    fn build_field(&self, declaration: &Declaration, decl: &FieldDecl) -> Field {
        let declared = simple_type_name(&decl.type_name);
        let is_collection = self.is_collection(declared);

        let type_name = if is_collection {
            match decl.type_arguments.as_slice() {
                [element] => Some(simple_type_name(element).to_string()),
                _ => {
                    tracing::warn!(
                        "Collection field {}.{} has {} type arguments, element type unknown",
                        declaration.name,
                        decl.name,
                        decl.type_arguments.len()
                    );
                    None
                }
            }
        } else {
            Some(declared.to_string())
        };

        let is_reference = decl.annotations.iter().any(|a| {
            self.settings
                .relation_markers
                .iter()
                .any(|m| m == a.simple_name())
        });

        Field {
            name: decl.name.clone(),
            referenced_entity_name: if is_reference {
                type_name.clone()
            } else {
                None
            },
            type_name: type_name.unwrap_or_else(|| UNKNOWN_ELEMENT_TYPE.to_string()),
            is_collection,
            is_reference,
            annotations: decl.annotations.iter().cloned().collect::<BTreeSet<_>>(),
        }
    }

    fn is_collection(&self, simple_type: &str) -> bool {
        self.settings
            .collection_types
            .iter()
            .any(|c| c == simple_type)
    }
}
