use std::fmt;

use serde::{Deserialize, Serialize};

/// Reasons recorded in [`ResolvedExpression::Unknown`]
pub mod reason {
    pub const UNTAGGED_FIELD_LOAD: &str = "untagged field load";
    pub const MALFORMED_CONFIG_KEY: &str = "malformed config key";
    pub const DEPTH_EXCEEDED: &str = "traversal depth exceeded";
    pub const CROSS_METHOD_ORIGIN: &str = "cross-method origin";
    pub const MISSING_ADDRESS: &str = "missing address argument";
    pub const UNSUPPORTED_KIND_PREFIX: &str = "unsupported node kind: ";
}

/// How far static resolution could reconstruct a value.
///
/// Every resolution terminates in exactly one of these variants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedExpression {
    Literal {
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    Parameter {
        index: u32,
        declared_type: String,
    },
    /// A configuration lookup; `value` is `None` when the key is unresolved
    ConfigValue {
        key: String,
        value: Option<String>,
    },
    /// Sequential concatenation, in program order
    Concat {
        parts: Vec<ResolvedExpression>,
    },
    Unknown {
        reason: String,
    },
}

impl ResolvedExpression {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    pub fn parameter(index: u32, declared_type: impl Into<String>) -> Self {
        Self::Parameter {
            index,
            declared_type: declared_type.into(),
        }
    }

    pub fn config(key: impl Into<String>, value: Option<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            value,
        }
    }

    pub fn concat(parts: Vec<ResolvedExpression>) -> Self {
        Self::Concat { parts }
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self::Unknown {
            reason: reason.into(),
        }
    }

    pub fn unsupported(kind: &str) -> Self {
        Self::unknown(format!("{}{}", reason::UNSUPPORTED_KIND_PREFIX, kind))
    }

    /// True when no `Unknown`, parameter or unresolved config value remains
    pub fn is_fully_resolved(&self) -> bool {
        match self {
            Self::Literal { .. } => true,
            Self::ConfigValue { value, .. } => value.is_some(),
            Self::Concat { parts } => parts.iter().all(Self::is_fully_resolved),
            Self::Parameter { .. } | Self::Unknown { .. } => false,
        }
    }

    /// Collects every `Unknown` reason in this expression, depth first
    pub fn unknown_reasons(&self) -> Vec<&str> {
        let mut reasons = Vec::new();
        self.collect_reasons(&mut reasons);
        reasons
    }

    fn collect_reasons<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Unknown { reason } => out.push(reason),
            Self::Concat { parts } => {
                for part in parts {
                    part.collect_reasons(out);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for ResolvedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { value } => f.write_str(value),
            Self::Parameter { index, .. } => write!(f, "{{arg{}}}", index),
            Self::ConfigValue {
                value: Some(value), ..
            } => f.write_str(value),
            Self::ConfigValue { key, value: None } => write!(f, "${{{}}}", key),
            Self::Concat { parts } => {
                for part in parts {
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
            Self::Unknown { .. } => f.write_str("{?}"),
        }
    }
}

/// An outbound network call issued from a component method
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RestCall {
    /// Qualified name of the declaring method
    pub method: String,
    /// Signature of the matched call target
    pub target: String,
    /// Resolved address argument
    pub address: ResolvedExpression,
}
