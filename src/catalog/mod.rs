//! Read-only view of the whole-program analysis results.
//!
//! The [`ProgramCatalog`] trait is the only way extraction reaches declarations
//! and program graphs; [`SnapshotCatalog`] implements it over a serialized
//! snapshot exported by the analysis engine.

pub mod graph;
pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Annotation, Name};

pub use graph::{
    target_method_name, FieldRef, GraphBuilder, GraphNode, NodeId, NodeKind, ProgramGraph,
};
pub use snapshot::{CatalogSnapshot, DeclarationRecord, MethodRecord, SnapshotCatalog};

/// A type declaration as seen by the analysis engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: Name,
    pub is_interface: bool,
    pub annotations: Vec<Annotation>,
}

/// A declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecl {
    pub name: String,
    /// Declared (erased) type name, e.g. `java.util.List`
    pub type_name: String,
    /// Generic type arguments, e.g. `["com.acme.Item"]`
    #[serde(default)]
    pub type_arguments: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            type_arguments: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_type_arguments(mut self, arguments: &[&str]) -> Self {
        self.type_arguments = arguments.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// A declared method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDecl {
    pub declaring_type: String,
    pub name: String,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl MethodDecl {
    /// `declaring.Type.method`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }
}

/// Access to the tags attached to declarations, fields and methods
pub trait Annotated {
    fn annotations(&self) -> &[Annotation];
}

impl Annotated for Declaration {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl Annotated for FieldDecl {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

impl Annotated for MethodDecl {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

pub trait ProgramCatalog: Send + Sync {
    /// Qualified names of all reachable declarations, in discovery order.
    /// A declaration reached through several paths may be listed more than once.
    fn reachable_declarations(&self) -> Result<Vec<String>>;
    fn lookup_declaration(&self, name: &str) -> Result<Declaration>;
    fn declared_fields(&self, declaration: &Declaration) -> Result<Vec<FieldDecl>>;
    fn declared_methods(&self, declaration: &Declaration) -> Result<Vec<MethodDecl>>;
    fn program_graph_of(&self, method: &MethodDecl) -> Result<ProgramGraph>;
}
