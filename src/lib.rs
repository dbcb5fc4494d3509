pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;

pub use catalog::{
    Annotated, Declaration, FieldDecl, FieldRef, GraphBuilder, MethodDecl, NodeId, NodeKind,
    ProgramCatalog, ProgramGraph, SnapshotCatalog,
};
pub use config::{ConfigDocument, ExtractionSettings, FileFormat};
pub use error::{ExtractorError, Result};
pub use extract::{
    ArchitectureAssembler, CallSiteLocator, ComponentCatalogBuilder, EntityModelBuilder,
    ExpressionResolver, Extractor, Role, RoleClassifier,
};
pub use model::{
    Annotation, Component, Controller, Endpoint, Entity, Field, MethodSignature, Module, Name,
    ResolvedExpression, RestCall, Service,
};
