//! Per-method program graphs.
//!
//! Nodes are instructions; data-dependence edges point from a consuming node
//! to the nodes producing its inputs. Control-dependence edges are carried for
//! completeness but never followed by the resolver.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::Annotation;

/// Node identifier, unique within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// The field referenced by a field-load node, with its tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRef {
    pub declaring_type: String,
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl FieldRef {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// The closed set of node kinds the resolver understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Constant {
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    Parameter {
        index: u32,
        declared_type: String,
    },
    LoadField {
        field: FieldRef,
    },
    #[serde(rename_all = "camelCase")]
    Allocation {
        type_name: String,
    },
    /// A call; `receiver` is absent for static calls
    Invoke {
        target: String,
        #[serde(default)]
        receiver: Option<NodeId>,
        #[serde(default)]
        arguments: Vec<NodeId>,
    },
    /// Value-preserving node (type checks, proxies) forwarding one input
    Pass {
        value: NodeId,
    },
    /// Any instruction the resolver has no rule for
    Other {
        label: String,
    },
}

impl NodeKind {
    pub fn label(&self) -> &str {
        match self {
            NodeKind::Constant { .. } => "constant",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::LoadField { .. } => "load_field",
            NodeKind::Allocation { .. } => "allocation",
            NodeKind::Invoke { .. } => "invoke",
            NodeKind::Pass { .. } => "pass",
            NodeKind::Other { label } => label,
        }
    }
}

/// Method simple name of an invocation target.
///
/// `java.lang.StringBuilder.append(java.lang.String)` becomes `append`.
pub fn target_method_name(target: &str) -> &str {
    let head = match target.find('(') {
        Some(idx) => &target[..idx],
        None => target,
    };
    match head.rfind(['.', '#']) {
        Some(idx) => &head[idx + 1..],
        None => head,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    /// Position in the instruction stream (program order)
    pub position: u32,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub control: Vec<NodeId>,
}

impl GraphNode {
    /// Data-dependence edges: the producers of this node's inputs
    pub fn inputs(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Invoke {
                receiver,
                arguments,
                ..
            } => receiver.iter().chain(arguments.iter()).copied().collect(),
            NodeKind::Pass { value } => vec![*value],
            _ => Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<GraphNode>,
}

/// A method's program graph with a reverse (usage) index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawGraph", into = "RawGraph")]
pub struct ProgramGraph {
    nodes: BTreeMap<NodeId, GraphNode>,
    usages: HashMap<NodeId, Vec<NodeId>>,
}

impl From<RawGraph> for ProgramGraph {
    fn from(raw: RawGraph) -> Self {
        ProgramGraph::new(raw.nodes)
    }
}

impl From<ProgramGraph> for RawGraph {
    fn from(graph: ProgramGraph) -> Self {
        RawGraph {
            nodes: graph.nodes.into_values().collect(),
        }
    }
}

impl ProgramGraph {
    pub fn new(nodes: Vec<GraphNode>) -> Self {
        let nodes: BTreeMap<NodeId, GraphNode> = nodes.into_iter().map(|n| (n.id, n)).collect();

        let mut usages: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in nodes.values() {
            for input in node.inputs() {
                let users = usages.entry(input).or_default();
                if !users.contains(&node.id) {
                    users.push(node.id);
                }
            }
        }

        Self { nodes, usages }
    }

    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in program order
    pub fn nodes_in_program_order(&self) -> Vec<&GraphNode> {
        let mut nodes: Vec<&GraphNode> = self.nodes.values().collect();
        nodes.sort_by_key(|n| (n.position, n.id));
        nodes
    }

    /// Forward consumer lookup
    pub fn usages_of(&self, id: NodeId) -> &[NodeId] {
        self.usages.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Incremental construction of program graphs.
///
/// Positions follow insertion order unless overridden with [`GraphBuilder::reposition`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
}

impl GraphBuilder {
    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(GraphNode {
            id,
            position: id.0,
            kind,
            control: Vec::new(),
        });
        id
    }

    pub fn constant(&mut self, value: impl Into<String>) -> NodeId {
        self.add(NodeKind::Constant {
            value: value.into(),
        })
    }

    pub fn parameter(&mut self, index: u32, declared_type: impl Into<String>) -> NodeId {
        self.add(NodeKind::Parameter {
            index,
            declared_type: declared_type.into(),
        })
    }

    pub fn load_field(&mut self, field: FieldRef) -> NodeId {
        self.add(NodeKind::LoadField { field })
    }

    pub fn allocation(&mut self, type_name: impl Into<String>) -> NodeId {
        self.add(NodeKind::Allocation {
            type_name: type_name.into(),
        })
    }

    pub fn invoke(
        &mut self,
        target: impl Into<String>,
        receiver: Option<NodeId>,
        arguments: Vec<NodeId>,
    ) -> NodeId {
        self.add(NodeKind::Invoke {
            target: target.into(),
            receiver,
            arguments,
        })
    }

    pub fn pass(&mut self, value: NodeId) -> NodeId {
        self.add(NodeKind::Pass { value })
    }

    pub fn other(&mut self, label: impl Into<String>) -> NodeId {
        self.add(NodeKind::Other {
            label: label.into(),
        })
    }

    /// Replaces a node's kind, e.g. to close a cycle
    pub fn relink(&mut self, id: NodeId, kind: NodeKind) {
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.kind = kind;
        }
    }

    pub fn reposition(&mut self, id: NodeId, position: u32) {
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            node.position = position;
        }
    }

    pub fn build(self) -> ProgramGraph {
        ProgramGraph::new(self.nodes)
    }
}
