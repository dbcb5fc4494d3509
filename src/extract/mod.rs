//! Static resolution engine: role classification, record builders,
//! call-site location, expression resolution and assembly.

pub mod assembler;
pub mod call_locator;
pub mod classifier;
pub mod component_builder;
pub mod entity_builder;
pub mod pipeline;
pub mod resolver;

pub use assembler::{ArchitectureAssembler, DeclarationModel};
pub use call_locator::{CallSite, CallSiteLocator};
pub use classifier::{Role, RoleClassifier};
pub use component_builder::ComponentCatalogBuilder;
pub use entity_builder::{EntityModelBuilder, UNKNOWN_ELEMENT_TYPE};
pub use pipeline::{Classification, Extractor};
pub use resolver::{ExpressionResolver, Resolution};
