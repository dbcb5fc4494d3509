//! Finds outbound-call invocations inside a method's program graph.

use crate::catalog::{target_method_name, MethodDecl, NodeId, NodeKind, ProgramGraph};
use crate::config::ExtractionSettings;

/// A matched invocation whose address argument is not resolved yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Qualified name of the method containing the call
    pub method: String,
    /// Matched call target signature
    pub target: String,
    pub node: NodeId,
    /// Argument-producing nodes, receiver excluded
    pub arguments: Vec<NodeId>,
}

impl CallSite {
    /// The address/URL argument, conventionally the first one
    pub fn address(&self) -> Option<NodeId> {
        self.arguments.first().copied()
    }
}

pub struct CallSiteLocator<'a> {
    prefix: &'a str,
    method_filter: Option<&'a [String]>,
}

impl<'a> CallSiteLocator<'a> {
    pub fn new(settings: &'a ExtractionSettings) -> Self {
        Self {
            prefix: &settings.rest_call_prefix,
            method_filter: settings.rest_call_methods.as_deref(),
        }
    }

    /// Linear scan of the graph's invocations in program order.
    /// Callees are not entered.
    pub fn locate(&self, method: &MethodDecl, graph: &ProgramGraph) -> Vec<CallSite> {
        let qualified = method.qualified_name();

        graph
            .nodes_in_program_order()
            .into_iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Invoke {
                    target, arguments, ..
                } if self.matches(target) => Some(CallSite {
                    method: qualified.clone(),
                    target: target.clone(),
                    node: node.id,
                    arguments: arguments.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    fn matches(&self, target: &str) -> bool {
        if !target.starts_with(self.prefix) {
            return false;
        }
        match self.method_filter {
            Some(allowed) => {
                let name = target_method_name(target);
                allowed.iter().any(|m| m == name)
            }
            None => true,
        }
    }
}
