use std::fmt;

use serde::{Deserialize, Serialize};

/// A simple identifier with an optional fully-qualified form
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Name {
    simple: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    qualified: Option<String>,
}

impl Name {
    /// Creates a name without a qualified form
    pub fn new(simple: impl Into<String>) -> Self {
        Self {
            simple: simple.into(),
            qualified: None,
        }
    }

    /// Creates a name from a fully-qualified form, deriving the simple name
    /// from the last `.` or `$` separated segment.
    pub fn qualified(qualified: impl Into<String>) -> Self {
        let qualified = qualified.into();
        Self {
            simple: simple_type_name(&qualified).to_string(),
            qualified: Some(qualified),
        }
    }

    pub fn with_qualified(simple: impl Into<String>, qualified: impl Into<String>) -> Self {
        Self {
            simple: simple.into(),
            qualified: Some(qualified.into()),
        }
    }

    pub fn simple(&self) -> &str {
        &self.simple
    }

    pub fn qualified_name(&self) -> Option<&str> {
        self.qualified.as_deref()
    }

    /// Identity key: the qualified form when known, the simple one otherwise
    pub fn key(&self) -> &str {
        self.qualified.as_deref().unwrap_or(&self.simple)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A metadata tag instance attached to a declaration, field or method
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Annotation {
    /// Fully-qualified tag name (e.g. `javax.persistence.Entity`)
    name: String,
    /// Optional literal payload (e.g. a `${a.b}` configuration key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    pub fn with_payload(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Some(payload.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag name without package and without a leading `@`
    pub fn simple_name(&self) -> &str {
        simple_type_name(self.name.trim_start_matches('@'))
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

/// Strips generic arguments and package/outer-class qualifiers from a type name.
///
/// `java.util.List<com.acme.Item>` becomes `List`, `com.acme.Outer$Inner` becomes `Inner`.
pub fn simple_type_name(type_name: &str) -> &str {
    let base = match type_name.find('<') {
        Some(idx) => &type_name[..idx],
        None => type_name,
    };
    let base = base.trim();
    match base.rfind(['.', '$']) {
        Some(idx) => &base[idx + 1..],
        None => base,
    }
}
