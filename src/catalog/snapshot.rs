//! In-memory catalog loaded from a serialized analysis snapshot.
//!
//! Format (YAML shown, JSON and TOML are accepted as well):
//! ```yaml
//! declarations:
//!   - name: com.acme.orders.OrderClient
//!     annotations:
//!       - name: org.springframework.stereotype.Service
//!     fields:
//!       - name: baseUrl
//!         typeName: java.lang.String
//!         annotations:
//!           - name: org.springframework.beans.factory.annotation.Value
//!             payload: "${orders.url}"
//!     methods:
//!       - name: fetch
//!         parameterTypes: [java.lang.Long]
//!         graph:
//!           nodes:
//!             - { id: 0, position: 0, kind: constant, value: "/orders" }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::graph::ProgramGraph;
use super::{Declaration, FieldDecl, MethodDecl, ProgramCatalog};
use crate::config::FileFormat;
use crate::error::{ExtractorError, Result};
use crate::model::{Annotation, Name};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub declarations: Vec<DeclarationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationRecord {
    /// Qualified name
    pub name: String,
    #[serde(default)]
    pub interface: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodRecord>,
}

impl DeclarationRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interface: false,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn interface(mut self) -> Self {
        self.interface = true;
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodRecord) -> Self {
        self.methods.push(method);
        self
    }

    /// Folds a repeated listing of the same declaration into this one.
    ///
    /// Tags are unioned, fields are unioned by name and methods by signature.
    /// A method graph missing here is taken from the other listing.
    fn absorb(&mut self, other: DeclarationRecord) {
        self.interface |= other.interface;

        for annotation in other.annotations {
            if !self.annotations.contains(&annotation) {
                self.annotations.push(annotation);
            }
        }

        for field in other.fields {
            match self.fields.iter().find(|f| f.name == field.name) {
                Some(existing) => {
                    if existing.type_name != field.type_name {
                        tracing::debug!(
                            "Field {}.{} listed as {} and {}, keeping {}",
                            self.name,
                            field.name,
                            existing.type_name,
                            field.type_name,
                            existing.type_name
                        );
                    }
                }
                None => self.fields.push(field),
            }
        }

        for method in other.methods {
            match self
                .methods
                .iter_mut()
                .find(|m| m.name == method.name && m.parameter_types == method.parameter_types)
            {
                Some(existing) => {
                    if existing.graph.is_none() {
                        existing.graph = method.graph;
                    }
                }
                None => self.methods.push(method),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodRecord {
    pub name: String,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Absent when the analysis engine could not decode the method body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<ProgramGraph>,
}

impl MethodRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter_types: Vec::new(),
            annotations: Vec::new(),
            graph: None,
        }
    }

    pub fn with_parameters(mut self, parameter_types: &[&str]) -> Self {
        self.parameter_types = parameter_types.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_graph(mut self, graph: ProgramGraph) -> Self {
        self.graph = Some(graph);
        self
    }
}

/// [`ProgramCatalog`] over a loaded [`CatalogSnapshot`]
#[derive(Debug, Clone, Default)]
pub struct SnapshotCatalog {
    records: Vec<DeclarationRecord>,
    index: HashMap<String, usize>,
}

impl SnapshotCatalog {
    /// Builds the catalog; repeated listings of one declaration are merged
    /// into the first, keeping first-listing order.
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        let mut records: Vec<DeclarationRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in snapshot.declarations {
            match index.get(&record.name) {
                Some(&idx) => {
                    tracing::debug!("Merging repeated listing of {}", record.name);
                    records[idx].absorb(record);
                }
                None => {
                    index.insert(record.name.clone(), records.len());
                    records.push(record);
                }
            }
        }

        Self { records, index }
    }

    pub fn from_records(records: Vec<DeclarationRecord>) -> Self {
        Self::new(CatalogSnapshot {
            declarations: records,
        })
    }

    /// Loads a snapshot file; the format is chosen by extension
    pub fn load(path: &Path) -> Result<Self> {
        let format = FileFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let snapshot: CatalogSnapshot = format.parse(&content)?;
        tracing::debug!(
            "Loaded catalog snapshot {} with {} declarations",
            path.display(),
            snapshot.declarations.len()
        );
        Ok(Self::new(snapshot))
    }

    fn record(&self, name: &str) -> Result<&DeclarationRecord> {
        self.index
            .get(name)
            .map(|&idx| &self.records[idx])
            .ok_or_else(|| ExtractorError::DeclarationNotFound(name.to_string()))
    }
}

impl ProgramCatalog for SnapshotCatalog {
    fn reachable_declarations(&self) -> Result<Vec<String>> {
        Ok(self.records.iter().map(|r| r.name.clone()).collect())
    }

    fn lookup_declaration(&self, name: &str) -> Result<Declaration> {
        let record = self.record(name)?;
        Ok(Declaration {
            name: Name::qualified(record.name.clone()),
            is_interface: record.interface,
            annotations: record.annotations.clone(),
        })
    }

    fn declared_fields(&self, declaration: &Declaration) -> Result<Vec<FieldDecl>> {
        Ok(self.record(declaration.name.key())?.fields.clone())
    }

    fn declared_methods(&self, declaration: &Declaration) -> Result<Vec<MethodDecl>> {
        let record = self.record(declaration.name.key())?;
        Ok(record
            .methods
            .iter()
            .map(|m| MethodDecl {
                declaring_type: record.name.clone(),
                name: m.name.clone(),
                parameter_types: m.parameter_types.clone(),
                annotations: m.annotations.clone(),
            })
            .collect())
    }

    fn program_graph_of(&self, method: &MethodDecl) -> Result<ProgramGraph> {
        let record = self.record(&method.declaring_type)?;
        record
            .methods
            .iter()
            .find(|m| m.name == method.name && m.parameter_types == method.parameter_types)
            .and_then(|m| m.graph.clone())
            .ok_or_else(|| ExtractorError::GraphUnavailable(method.qualified_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"
declarations:
  - name: com.acme.Order
    annotations:
      - name: javax.persistence.Entity
    fields:
      - name: id
        typeName: java.lang.Long
  - name: com.acme.OrderClient
    methods:
      - name: fetch
        parameterTypes: [java.lang.Long]
        graph:
          nodes:
            - { id: 0, position: 0, kind: constant, value: "/orders" }
      - name: undecodable
"#;

    #[test]
    fn test_parse_yaml_snapshot() {
        let snapshot: CatalogSnapshot = FileFormat::Yaml.parse(SNAPSHOT).unwrap();
        let catalog = SnapshotCatalog::new(snapshot);

        let names = catalog.reachable_declarations().unwrap();
        assert_eq!(names, vec!["com.acme.Order", "com.acme.OrderClient"]);

        let order = catalog.lookup_declaration("com.acme.Order").unwrap();
        assert_eq!(order.name.simple(), "Order");
        assert_eq!(catalog.declared_fields(&order).unwrap().len(), 1);
    }

    #[test]
    fn test_graph_lookup() {
        let snapshot: CatalogSnapshot = FileFormat::Yaml.parse(SNAPSHOT).unwrap();
        let catalog = SnapshotCatalog::new(snapshot);

        let client = catalog.lookup_declaration("com.acme.OrderClient").unwrap();
        let methods = catalog.declared_methods(&client).unwrap();
        assert_eq!(methods.len(), 2);

        let graph = catalog.program_graph_of(&methods[0]).unwrap();
        assert_eq!(graph.len(), 1);

        let missing = catalog.program_graph_of(&methods[1]);
        assert!(matches!(missing, Err(ExtractorError::GraphUnavailable(_))));
    }

    #[test]
    fn test_repeated_listings_merged() {
        let catalog = SnapshotCatalog::from_records(vec![
            DeclarationRecord::new("com.acme.Order")
                .annotated(Annotation::new("javax.persistence.Entity"))
                .field(FieldDecl::new("id", "java.lang.Long"))
                .method(MethodRecord::new("fetch")),
            DeclarationRecord::new("com.acme.Customer"),
            DeclarationRecord::new("com.acme.Order")
                .annotated(Annotation::new("javax.persistence.Entity"))
                .field(FieldDecl::new("id", "java.lang.Long"))
                .field(FieldDecl::new("total", "java.math.BigDecimal"))
                .method(MethodRecord::new("fetch").with_graph(ProgramGraph::default())),
        ]);

        let names = catalog.reachable_declarations().unwrap();
        assert_eq!(names, vec!["com.acme.Order", "com.acme.Customer"]);

        let order = catalog.lookup_declaration("com.acme.Order").unwrap();
        assert_eq!(order.annotations.len(), 1);

        let fields: Vec<_> = catalog
            .declared_fields(&order)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(fields, vec!["id", "total"]);

        let methods = catalog.declared_methods(&order).unwrap();
        assert_eq!(methods.len(), 1);
        assert!(catalog.program_graph_of(&methods[0]).is_ok());
    }

    #[test]
    fn test_unknown_declaration() {
        let catalog = SnapshotCatalog::default();
        assert!(matches!(
            catalog.lookup_declaration("com.acme.Missing"),
            Err(ExtractorError::DeclarationNotFound(_))
        ));
    }
}
