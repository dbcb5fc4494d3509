use serde::{Deserialize, Serialize};

use super::entity::Field;
use super::names::Name;

/// A method signature: name and parameter types, no body
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSignature {
    pub name: String,
    #[serde(default)]
    pub parameter_types: Vec<String>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, parameter_types: Vec<String>) -> Self {
        Self {
            name: name.into(),
            parameter_types,
        }
    }
}

/// A service or controller: declared state and declared behavior.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Component {
    pub name: Name,
    pub fields: Vec<Field>,
    pub methods: Vec<MethodSignature>,
}

pub type Service = Component;
pub type Controller = Component;

/// A controller method exposed externally
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// HTTP verb, when statically known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    /// Path template, e.g. `/orders/{id}`
    pub path: String,
    /// Qualified name of the declaring controller
    pub controller: String,
    /// Handler method name
    pub handler: String,
}
