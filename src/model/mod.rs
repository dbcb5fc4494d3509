//! Architecture model records.
//!
//! All records are plain values: they are created once during extraction,
//! folded into a [`Module`] by the assembler, and never mutated afterwards.

pub mod component;
pub mod entity;
pub mod expression;
pub mod module;
pub mod names;

pub use component::{Component, Controller, Endpoint, MethodSignature, Service};
pub use entity::{Entity, Field};
pub use expression::{reason, ResolvedExpression, RestCall};
pub use module::Module;
pub use names::{simple_type_name, Annotation, Name};
