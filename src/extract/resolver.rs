//! Backward data-flow reconstruction of call argument values.
//!
//! Resolution walks strictly backward along data-dependence edges, with one
//! exception: the append calls of an accumulator are found through the
//! forward usage index, then ordered by program position. Each hop along an
//! edge increases the depth; past `max_depth` the sub-expression becomes
//! `Unknown("traversal depth exceeded")`. A separate visit budget of
//! `max_depth * VISITS_PER_HOP` bounds total work on graphs with heavy fan-out.

use std::collections::HashSet;

use crate::catalog::{target_method_name, FieldRef, NodeId, NodeKind, ProgramGraph};
use crate::config::{parse_key_path, ConfigDocument, ExtractionSettings};
use crate::model::{reason, ResolvedExpression};

const VISITS_PER_HOP: usize = 64;

/// Result of one resolution, with the deepest hop count reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub expression: ResolvedExpression,
    pub hops: usize,
}

struct Trace {
    max_hops: usize,
    visits: usize,
}

pub struct ExpressionResolver<'a> {
    settings: &'a ExtractionSettings,
    config: &'a ConfigDocument,
}

impl<'a> ExpressionResolver<'a> {
    pub fn new(settings: &'a ExtractionSettings, config: &'a ConfigDocument) -> Self {
        Self { settings, config }
    }

    /// Resolves the value produced by `node`. Never fails.
    pub fn resolve(&self, graph: &ProgramGraph, node: NodeId) -> ResolvedExpression {
        self.resolve_traced(graph, node).expression
    }

    pub fn resolve_traced(&self, graph: &ProgramGraph, node: NodeId) -> Resolution {
        let mut trace = Trace {
            max_hops: 0,
            visits: 0,
        };
        let expression = self.resolve_at(graph, node, 0, &mut trace);
        Resolution {
            expression,
            hops: trace.max_hops,
        }
    }

    fn visit_budget(&self) -> usize {
        self.settings.max_depth.saturating_mul(VISITS_PER_HOP)
    }

    fn resolve_at(
        &self,
        graph: &ProgramGraph,
        id: NodeId,
        depth: usize,
        trace: &mut Trace,
    ) -> ResolvedExpression {
        trace.visits += 1;
        if depth > self.settings.max_depth || trace.visits > self.visit_budget() {
            return ResolvedExpression::unknown(reason::DEPTH_EXCEEDED);
        }
        trace.max_hops = trace.max_hops.max(depth);

        let Some(node) = graph.node(id) else {
            return ResolvedExpression::unknown(reason::CROSS_METHOD_ORIGIN);
        };

        match &node.kind {
            NodeKind::Constant { value } => ResolvedExpression::literal(value.clone()),
            NodeKind::Parameter {
                index,
                declared_type,
            } => ResolvedExpression::parameter(*index, declared_type.clone()),
            NodeKind::LoadField { field } => self.resolve_field_load(field),
            NodeKind::Allocation { type_name } if self.is_accumulator(type_name) => {
                self.resolve_accumulator(graph, id, depth, trace)
            }
            NodeKind::Invoke {
                target,
                receiver: Some(receiver),
                ..
            } if self.is_finisher(target) => {
                match self.accumulator_root(graph, *receiver) {
                    Some(root) => self.resolve_at(graph, root, depth + 1, trace),
                    None => ResolvedExpression::unsupported(node.kind.label()),
                }
            }
            NodeKind::Pass { value } => self.resolve_at(graph, *value, depth + 1, trace),
            other => ResolvedExpression::unsupported(other.label()),
        }
    }

    fn resolve_field_load(&self, field: &FieldRef) -> ResolvedExpression {
        let Some(tag) = field
            .annotations
            .iter()
            .find(|a| a.simple_name() == self.settings.config_key_marker)
        else {
            return ResolvedExpression::unknown(reason::UNTAGGED_FIELD_LOAD);
        };

        match tag.payload().and_then(parse_key_path) {
            Some(key) => {
                let value = self.config.resolve(key).map(str::to_string);
                if value.is_none() {
                    tracing::debug!("Configuration key {} is unresolved", key);
                }
                ResolvedExpression::config(key, value)
            }
            None => {
                tracing::warn!(
                    "Malformed configuration key {:?} on field {}.{}",
                    tag.payload(),
                    field.declaring_type,
                    field.name
                );
                ResolvedExpression::unknown(reason::MALFORMED_CONFIG_KEY)
            }
        }
    }

    /// Folds an accumulator's append calls, in program order, into a concatenation
    fn resolve_accumulator(
        &self,
        graph: &ProgramGraph,
        accumulator: NodeId,
        depth: usize,
        trace: &mut Trace,
    ) -> ResolvedExpression {
        let appends = self.collect_appends(graph, accumulator);
        if appends.is_empty() {
            return ResolvedExpression::literal("");
        }

        let parts = appends
            .into_iter()
            .map(|append| match graph.node(append).map(|n| &n.kind) {
                Some(NodeKind::Invoke { arguments, .. }) => match arguments.first() {
                    Some(&value) => self.resolve_at(graph, value, depth + 1, trace),
                    None => ResolvedExpression::unsupported("append without argument"),
                },
                _ => ResolvedExpression::unsupported("append"),
            })
            .collect();

        ResolvedExpression::concat(parts)
    }

    /// Append calls on the accumulator itself, on the result of an earlier
    /// append (`sb.append(a).append(b)`) or on a pass-through alias of either,
    /// sorted by program position.
    fn collect_appends(&self, graph: &ProgramGraph, accumulator: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::from([accumulator]);
        let mut appends = Vec::new();
        let mut pending = vec![accumulator];

        while let Some(current) = pending.pop() {
            for &user in graph.usages_of(current) {
                let Some(node) = graph.node(user) else {
                    continue;
                };
                match &node.kind {
                    NodeKind::Invoke {
                        target,
                        receiver: Some(receiver),
                        ..
                    } if *receiver == current && self.is_append(target) => {
                        if seen.insert(user) {
                            appends.push(user);
                            pending.push(user);
                        }
                    }
                    NodeKind::Pass { value } if *value == current => {
                        if seen.insert(user) {
                            pending.push(user);
                        }
                    }
                    _ => {}
                }
            }
        }

        appends.sort_by_key(|id| graph.node(*id).map(|n| (n.position, n.id)));
        appends
    }

    /// Follows a finisher's receiver through append chains and pass-through
    /// nodes back to the accumulator allocation.
    fn accumulator_root(&self, graph: &ProgramGraph, start: NodeId) -> Option<NodeId> {
        let mut current = start;
        for _ in 0..=self.settings.max_depth {
            match &graph.node(current)?.kind {
                NodeKind::Allocation { type_name } if self.is_accumulator(type_name) => {
                    return Some(current);
                }
                NodeKind::Invoke {
                    target,
                    receiver: Some(receiver),
                    ..
                } if self.is_append(target) => current = *receiver,
                NodeKind::Pass { value } => current = *value,
                _ => return None,
            }
        }
        None
    }

    fn is_accumulator(&self, type_name: &str) -> bool {
        self.settings
            .accumulator_types
            .iter()
            .any(|t| t == type_name)
    }

    fn is_append(&self, target: &str) -> bool {
        let name = target_method_name(target);
        self.settings.append_methods.iter().any(|m| m == name)
    }

    fn is_finisher(&self, target: &str) -> bool {
        let name = target_method_name(target);
        self.settings.finisher_methods.iter().any(|m| m == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GraphBuilder;
    use crate::model::Annotation;

    const SB: &str = "java.lang.StringBuilder";
    const APPEND: &str = "java.lang.StringBuilder.append(java.lang.String)";
    const TO_STRING: &str = "java.lang.StringBuilder.toString()";

    fn config() -> ConfigDocument {
        ConfigDocument::from_yaml_str("svc:\n  host: 10.0.0.1\n").unwrap()
    }

    fn tagged_field(payload: &str) -> FieldRef {
        FieldRef::new("com.acme.OrderClient", "host").with_annotation(Annotation::with_payload(
            "org.springframework.beans.factory.annotation.Value",
            payload,
        ))
    }

    #[test]
    fn test_literal_has_zero_hops() {
        let mut builder = GraphBuilder::default();
        let lit = builder.constant("X");
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = ConfigDocument::empty();
        let resolution = ExpressionResolver::new(&settings, &config).resolve_traced(&graph, lit);

        assert_eq!(resolution.expression, ResolvedExpression::literal("X"));
        assert_eq!(resolution.hops, 0);
    }

    #[test]
    fn test_parameter() {
        let mut builder = GraphBuilder::default();
        let param = builder.parameter(2, "java.lang.String");
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = ConfigDocument::empty();
        let expr = ExpressionResolver::new(&settings, &config).resolve(&graph, param);

        assert_eq!(expr, ResolvedExpression::parameter(2, "java.lang.String"));
    }

    #[test]
    fn test_accumulator_concat_in_program_order() {
        let mut builder = GraphBuilder::default();
        let sb = builder.allocation(SB);
        let host = builder.load_field(tagged_field("${svc.host}"));
        let suffix = builder.constant("/items");
        let prefix = builder.constant("/api/");
        // Inserted out of order; positions restore program order
        let third = builder.invoke(APPEND, Some(sb), vec![suffix]);
        let first = builder.invoke(APPEND, Some(sb), vec![prefix]);
        let second = builder.invoke(APPEND, Some(sb), vec![host]);
        builder.reposition(first, 100);
        builder.reposition(second, 101);
        builder.reposition(third, 102);
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = config();
        let expr = ExpressionResolver::new(&settings, &config).resolve(&graph, sb);

        assert_eq!(
            expr,
            ResolvedExpression::concat(vec![
                ResolvedExpression::literal("/api/"),
                ResolvedExpression::config("svc.host", Some("10.0.0.1".to_string())),
                ResolvedExpression::literal("/items"),
            ])
        );
        assert_eq!(expr.to_string(), "/api/10.0.0.1/items");
    }

    #[test]
    fn test_chained_appends_and_finisher() {
        let mut builder = GraphBuilder::default();
        let sb = builder.allocation(SB);
        let base = builder.constant("http://orders/");
        let id = builder.parameter(0, "java.lang.Long");
        let a1 = builder.invoke(APPEND, Some(sb), vec![base]);
        let a2 = builder.invoke(APPEND, Some(a1), vec![id]);
        let url = builder.invoke(TO_STRING, Some(a2), vec![]);
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = ConfigDocument::empty();
        let expr = ExpressionResolver::new(&settings, &config).resolve(&graph, url);

        assert_eq!(
            expr,
            ResolvedExpression::concat(vec![
                ResolvedExpression::literal("http://orders/"),
                ResolvedExpression::parameter(0, "java.lang.Long"),
            ])
        );
    }

    #[test]
    fn test_appends_through_pass_alias() {
        let mut builder = GraphBuilder::default();
        let sb = builder.allocation(SB);
        let alias = builder.pass(sb);
        let prefix = builder.constant("/api/");
        let a1 = builder.invoke(APPEND, Some(alias), vec![prefix]);
        let suffix = builder.constant("items");
        let a2 = builder.invoke(APPEND, Some(a1), vec![suffix]);
        let url = builder.invoke(TO_STRING, Some(a2), vec![]);
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = ConfigDocument::empty();
        let expr = ExpressionResolver::new(&settings, &config).resolve(&graph, url);

        assert_eq!(
            expr,
            ResolvedExpression::concat(vec![
                ResolvedExpression::literal("/api/"),
                ResolvedExpression::literal("items"),
            ])
        );
        assert_eq!(expr.to_string(), "/api/items");
    }

    #[test]
    fn test_single_append_through_pass_alias() {
        let mut builder = GraphBuilder::default();
        let sb = builder.allocation(SB);
        let alias = builder.pass(sb);
        let prefix = builder.constant("/api/");
        let a1 = builder.invoke(APPEND, Some(alias), vec![prefix]);
        let url = builder.invoke(TO_STRING, Some(a1), vec![]);
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = ConfigDocument::empty();
        let expr = ExpressionResolver::new(&settings, &config).resolve(&graph, url);

        assert_eq!(
            expr,
            ResolvedExpression::concat(vec![ResolvedExpression::literal("/api/")])
        );
        assert_eq!(expr.to_string(), "/api/");
    }

    #[test]
    fn test_empty_accumulator() {
        let mut builder = GraphBuilder::default();
        let sb = builder.allocation(SB);
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = ConfigDocument::empty();
        let expr = ExpressionResolver::new(&settings, &config).resolve(&graph, sb);

        assert_eq!(expr, ResolvedExpression::literal(""));
    }

    #[test]
    fn test_field_loads() {
        let mut builder = GraphBuilder::default();
        let untagged = builder.load_field(FieldRef::new("com.acme.OrderClient", "base"));
        let malformed = builder.load_field(tagged_field("${svc.host"));
        let unresolved = builder.load_field(tagged_field("${svc.port}"));
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = config();
        let resolver = ExpressionResolver::new(&settings, &config);

        assert_eq!(
            resolver.resolve(&graph, untagged),
            ResolvedExpression::unknown(reason::UNTAGGED_FIELD_LOAD)
        );
        assert_eq!(
            resolver.resolve(&graph, malformed),
            ResolvedExpression::unknown(reason::MALFORMED_CONFIG_KEY)
        );
        assert_eq!(
            resolver.resolve(&graph, unresolved),
            ResolvedExpression::config("svc.port", None)
        );
    }

    #[test]
    fn test_unsupported_kinds() {
        let mut builder = GraphBuilder::default();
        let call = builder.invoke("com.acme.Urls.build()", None, vec![]);
        let alloc = builder.allocation("com.acme.Request");
        let phi = builder.other("phi");
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = ConfigDocument::empty();
        let resolver = ExpressionResolver::new(&settings, &config);

        assert_eq!(
            resolver.resolve(&graph, call),
            ResolvedExpression::unknown("unsupported node kind: invoke")
        );
        assert_eq!(
            resolver.resolve(&graph, alloc),
            ResolvedExpression::unknown("unsupported node kind: allocation")
        );
        assert_eq!(
            resolver.resolve(&graph, phi),
            ResolvedExpression::unknown("unsupported node kind: phi")
        );
    }

    #[test]
    fn test_cross_method_origin() {
        let graph = GraphBuilder::default().build();
        let settings = ExtractionSettings::default();
        let config = ConfigDocument::empty();

        assert_eq!(
            ExpressionResolver::new(&settings, &config).resolve(&graph, NodeId(42)),
            ResolvedExpression::unknown(reason::CROSS_METHOD_ORIGIN)
        );
    }

    #[test]
    fn test_cyclic_pass_chain_terminates() {
        let mut builder = GraphBuilder::default();
        let a = builder.other("placeholder");
        let b = builder.pass(a);
        builder.relink(a, NodeKind::Pass { value: b });
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = ConfigDocument::empty();
        let resolution = ExpressionResolver::new(&settings, &config).resolve_traced(&graph, a);

        assert_eq!(
            resolution.expression,
            ResolvedExpression::unknown(reason::DEPTH_EXCEEDED)
        );
        assert_eq!(resolution.hops, settings.max_depth);
    }

    #[test]
    fn test_self_appending_accumulator_terminates() {
        let mut builder = GraphBuilder::default();
        let sb = builder.allocation(SB);
        let lit = builder.constant("x");
        builder.invoke(APPEND, Some(sb), vec![lit]);
        builder.invoke(APPEND, Some(sb), vec![sb]);
        let graph = builder.build();

        let settings = ExtractionSettings {
            max_depth: 8,
            ..Default::default()
        };
        let config = ConfigDocument::empty();
        let expr = ExpressionResolver::new(&settings, &config).resolve(&graph, sb);

        assert!(expr.unknown_reasons().contains(&reason::DEPTH_EXCEEDED));
    }

    #[test]
    fn test_fan_out_bounded_by_visit_budget() {
        // Every append re-appends the accumulator: exponential without a budget
        let mut builder = GraphBuilder::default();
        let sb = builder.allocation(SB);
        for _ in 0..4 {
            builder.invoke(APPEND, Some(sb), vec![sb]);
        }
        let graph = builder.build();

        let settings = ExtractionSettings::default();
        let config = ConfigDocument::empty();
        let expr = ExpressionResolver::new(&settings, &config).resolve(&graph, sb);

        assert!(expr.unknown_reasons().contains(&reason::DEPTH_EXCEEDED));
    }
}
