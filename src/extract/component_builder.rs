//! Service and controller records, plus controller endpoints.

use crate::catalog::{Annotated, Declaration, FieldDecl, MethodDecl};
use crate::config::ExtractionSettings;
use crate::model::{simple_type_name, Component, Endpoint, Field, MethodSignature};

pub struct ComponentCatalogBuilder<'a> {
    settings: &'a ExtractionSettings,
}

impl<'a> ComponentCatalogBuilder<'a> {
    pub fn new(settings: &'a ExtractionSettings) -> Self {
        Self { settings }
    }

    /// Projects declared fields and method signatures; method bodies are not inspected
    pub fn build(
        &self,
        declaration: &Declaration,
        fields: &[FieldDecl],
        methods: &[MethodDecl],
    ) -> Component {
        let mut fields: Vec<Field> = fields
            .iter()
            .map(|f| {
                Field::scalar(f.name.clone(), simple_type_name(&f.type_name))
                    .with_annotations(f.annotations.iter().cloned())
            })
            .collect();
        fields.sort();

        let mut methods: Vec<MethodSignature> = methods
            .iter()
            .map(|m| MethodSignature::new(m.name.clone(), m.parameter_types.clone()))
            .collect();
        methods.sort();
        methods.dedup();

        Component {
            name: declaration.name.clone(),
            fields,
            methods,
        }
    }

    /// Endpoints exposed by a controller's methods
    pub fn endpoints(&self, declaration: &Declaration, methods: &[MethodDecl]) -> Vec<Endpoint> {
        let prefix = declaration
            .annotations()
            .iter()
            .filter(|a| self.settings.endpoint_markers.contains_key(a.simple_name()))
            .find_map(|a| a.payload());

        let mut endpoints = Vec::new();
        for method in methods {
            for annotation in method.annotations() {
                let Some(verb) = self.settings.endpoint_markers.get(annotation.simple_name()) else {
                    continue;
                };
                endpoints.push(Endpoint {
                    verb: verb.clone(),
                    path: join_paths(prefix, annotation.payload()),
                    controller: declaration.name.key().to_string(),
                    handler: method.name.clone(),
                });
            }
        }
        endpoints
    }
}

/// Joins a class-level prefix and a method path with single `/` separators
fn join_paths(prefix: Option<&str>, path: Option<&str>) -> String {
    let segments: Vec<&str> = [prefix, path]
        .into_iter()
        .flatten()
        .flat_map(|p| p.split('/'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}
