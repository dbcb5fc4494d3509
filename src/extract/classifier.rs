//! Maps a declaration's tags to an architectural role.

use serde::{Deserialize, Serialize};

use crate::catalog::{Annotated, Declaration, FieldDecl, MethodDecl};
use crate::config::ExtractionSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Entity,
    Service,
    Controller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Entity => "entity",
            Role::Service => "service",
            Role::Controller => "controller",
        }
    }
}

pub struct RoleClassifier<'a> {
    settings: &'a ExtractionSettings,
}

impl<'a> RoleClassifier<'a> {
    pub fn new(settings: &'a ExtractionSettings) -> Self {
        Self { settings }
    }

    /// Classifies a declaration. First matching rule wins:
    /// interface, controller marker, service marker, entity marker,
    /// then the accessor/mutator heuristic.
    pub fn classify(
        &self,
        declaration: &Declaration,
        fields: &[FieldDecl],
        methods: &[MethodDecl],
    ) -> Option<Role> {
        if declaration.is_interface {
            return None;
        }

        let tag_names: Vec<&str> = declaration
            .annotations()
            .iter()
            .map(|a| a.name().trim_start_matches('@'))
            .collect();

        let controller_marker = self.settings.controller_marker.to_lowercase();
        if !controller_marker.is_empty()
            && tag_names
                .iter()
                .any(|t| t.to_lowercase().contains(&controller_marker))
        {
            return Some(Role::Controller);
        }

        let service_marker = self.settings.service_marker.as_str();
        if !service_marker.is_empty() && tag_names.iter().any(|t| t.contains(service_marker)) {
            return Some(Role::Service);
        }

        let entity_marker = self.settings.entity_marker.as_str();
        if !entity_marker.is_empty() && tag_names.iter().any(|t| t.starts_with(entity_marker)) {
            return Some(Role::Entity);
        }

        if has_synthesized_accessors(fields, methods) {
            return Some(Role::Entity);
        }

        None
    }
}

/// True when every field has both an accessor and a mutator.
///
/// Accessors match `get<field>`, `is<field>` or `<field>`; mutators match
/// `set<field>`, or `set<rest>` for a boolean field named `is<rest>`.
/// Matching is case-insensitive. A declaration without fields never matches.
fn has_synthesized_accessors(fields: &[FieldDecl], methods: &[MethodDecl]) -> bool {
    if fields.is_empty() {
        return false;
    }

    let method_names: Vec<String> = methods.iter().map(|m| m.name.to_lowercase()).collect();
    let has = |candidate: &str| method_names.iter().any(|m| m == candidate);

    fields.iter().all(|field| {
        let name = field.name.to_lowercase();
        let getter = has(&format!("get{}", name)) || has(&format!("is{}", name)) || has(&name);
        let setter = has(&format!("set{}", name))
            || name
                .strip_prefix("is")
                .is_some_and(|rest| !rest.is_empty() && has(&format!("set{}", rest)));
        getter && setter
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, Name};

    fn declaration(tags: &[&str]) -> Declaration {
        Declaration {
            name: Name::qualified("com.acme.Thing"),
            is_interface: false,
            annotations: tags.iter().map(|t| Annotation::new(*t)).collect(),
        }
    }

    fn method(name: &str) -> MethodDecl {
        MethodDecl {
            declaring_type: "com.acme.Thing".to_string(),
            name: name.to_string(),
            parameter_types: Vec::new(),
            annotations: Vec::new(),
        }
    }

    #[test]
    fn test_controller_marker_case_insensitive() {
        let settings = ExtractionSettings::default();
        let classifier = RoleClassifier::new(&settings);
        let decl = declaration(&["org.springframework.web.bind.annotation.RestController"]);
        assert_eq!(classifier.classify(&decl, &[], &[]), Some(Role::Controller));
    }

    #[test]
    fn test_controller_wins_over_service_and_entity() {
        let settings = ExtractionSettings::default();
        let classifier = RoleClassifier::new(&settings);
        let decl = declaration(&[
            "javax.persistence.Entity",
            "org.springframework.stereotype.Service",
            "org.springframework.stereotype.Controller",
        ]);
        assert_eq!(classifier.classify(&decl, &[], &[]), Some(Role::Controller));

        let decl = declaration(&[
            "javax.persistence.Entity",
            "org.springframework.stereotype.Service",
        ]);
        assert_eq!(classifier.classify(&decl, &[], &[]), Some(Role::Service));
    }

    #[test]
    fn test_entity_marker_prefix() {
        let settings = ExtractionSettings::default();
        let classifier = RoleClassifier::new(&settings);
        let decl = declaration(&["@javax.persistence.Entity"]);
        assert_eq!(classifier.classify(&decl, &[], &[]), Some(Role::Entity));

        let decl = declaration(&["com.acme.javax.persistence.Entity"]);
        assert_eq!(classifier.classify(&decl, &[], &[]), None);
    }

    #[test]
    fn test_interface_never_classified() {
        let settings = ExtractionSettings::default();
        let classifier = RoleClassifier::new(&settings);
        let mut decl = declaration(&["org.springframework.stereotype.Controller"]);
        decl.is_interface = true;
        assert_eq!(classifier.classify(&decl, &[], &[]), None);
    }

    #[test]
    fn test_accessor_heuristic() {
        let settings = ExtractionSettings::default();
        let classifier = RoleClassifier::new(&settings);
        let decl = declaration(&[]);
        let fields = vec![
            FieldDecl::new("name", "java.lang.String"),
            FieldDecl::new("isActive", "boolean"),
        ];
        let methods = vec![
            method("getName"),
            method("setName"),
            method("isActive"),
            method("setActive"),
        ];
        assert_eq!(classifier.classify(&decl, &fields, &methods), Some(Role::Entity));

        let missing_setter = vec![method("getName"), method("isActive"), method("setActive")];
        assert_eq!(classifier.classify(&decl, &fields, &missing_setter), None);
    }

    #[test]
    fn test_unmarked_declaration_without_fields() {
        let settings = ExtractionSettings::default();
        let classifier = RoleClassifier::new(&settings);
        let decl = declaration(&["java.lang.Deprecated"]);
        assert_eq!(classifier.classify(&decl, &[], &[method("run")]), None);
    }

    #[test]
    fn test_custom_markers() {
        let settings = ExtractionSettings {
            controller_marker: "Resource".to_string(),
            service_marker: "ApplicationScoped".to_string(),
            entity_marker: "jakarta.persistence.Entity".to_string(),
            ..Default::default()
        };
        let classifier = RoleClassifier::new(&settings);

        assert_eq!(
            classifier.classify(&declaration(&["jakarta.ws.rs.Resource"]), &[], &[]),
            Some(Role::Controller)
        );
        assert_eq!(
            classifier.classify(&declaration(&["jakarta.enterprise.context.ApplicationScoped"]), &[], &[]),
            Some(Role::Service)
        );
        assert_eq!(
            classifier.classify(&declaration(&["jakarta.persistence.Entity"]), &[], &[]),
            Some(Role::Entity)
        );
    }
}
