//! Protocol dependency extraction.
//!
//! Every branch edge in the parse graph that lands on a state with a header
//! payload says "protocol B follows protocol A when A's select field equals
//! V". This module collects those edges per destination protocol, keeping
//! the order in which they were discovered.
//!
//! Edges without a decision field or without a destination payload (for
//! example a `default` branch into `ingress`) are skipped: graphs contain
//! them legitimately, and they carry nothing a dissector could register on.

use std::collections::HashMap;

use tracing::debug;

use crate::graph::{BranchValue, Field, ParseGraph};

/// One inbound edge into a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency<'g> {
    pub protocol_name: &'g str,
    pub ordered_fields: &'g [Field],
    pub previous_protocol_name: &'g str,
    /// Last dotted component of the predecessor's decision expression.
    pub branch_field_name: &'g str,
    pub branch_value: BranchValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    NoDecision,
    UndottedDecision,
    NoPayload,
}

/// Inbound edges grouped by destination protocol.
#[derive(Debug, Clone, Default)]
pub struct Dependencies<'g> {
    by_protocol: HashMap<&'g str, Vec<Dependency<'g>>>,
}

impl<'g> Dependencies<'g> {
    /// All edges into `protocol`, in discovery order.
    pub fn get(&self, protocol: &str) -> &[Dependency<'g>] {
        self.by_protocol
            .get(protocol)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The edge a dissector is generated from.
    ///
    /// When several predecessors lead into `protocol`, the first one
    /// discovered in graph order is used and the others are ignored.
    pub fn select_first(&self, protocol: &str) -> Option<&Dependency<'g>> {
        self.get(protocol).first()
    }

    /// Protocols with at least one edge, sorted by name.
    pub fn protocols(&self) -> Vec<&'g str> {
        let mut names: Vec<_> = self.by_protocol.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.by_protocol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_protocol.is_empty()
    }

    fn push(&mut self, dependency: Dependency<'g>) {
        self.by_protocol
            .entry(dependency.protocol_name)
            .or_default()
            .push(dependency);
    }
}

/// Walk every branch of `graph` and group the usable edges by destination.
///
/// # Examples
/// ```
/// use p4shark_core::{ParseGraph, extract_dependencies};
///
/// let graph = ParseGraph::from_json_str(r#"{"states": [
///     {"name": "parse_ipv4", "select": ["ipv4.protocol"],
///      "fields": [{"name": "ttl", "width": 8}],
///      "branches": [{"value": 17, "next": "parse_udp"}]},
///     {"name": "parse_udp", "fields": [{"name": "srcPort", "width": 16}]}
/// ]}"#)?;
/// let deps = extract_dependencies(&graph);
/// let udp = deps.select_first("udp").unwrap();
/// assert_eq!(udp.previous_protocol_name, "ipv4");
/// assert_eq!(udp.branch_field_name, "protocol");
/// # Ok::<(), p4shark_core::GraphError>(())
/// ```
pub fn extract_dependencies(graph: &ParseGraph) -> Dependencies<'_> {
    let mut dependencies = Dependencies::default();

    for state in graph.states() {
        for branch in state.branches() {
            let next = graph.state(branch.next);
            let branch_field = match state.decision_expression() {
                None => Err(SkipReason::NoDecision),
                Some(expression) => expression
                    .rsplit_once('.')
                    .map(|(_, field)| field)
                    .ok_or(SkipReason::UndottedDecision),
            };
            let edge = branch_field.and_then(|field| {
                if next.fields().is_empty() {
                    Err(SkipReason::NoPayload)
                } else {
                    Ok(field)
                }
            });

            match edge {
                Ok(branch_field_name) => dependencies.push(Dependency {
                    protocol_name: next.protocol(),
                    ordered_fields: next.fields(),
                    previous_protocol_name: state.protocol(),
                    branch_field_name,
                    branch_value: branch.value,
                }),
                Err(reason) => debug!(
                    from = state.name(),
                    to = next.name(),
                    value = %branch.value,
                    ?reason,
                    "skipping incomplete branch"
                ),
            }
        }
    }

    dependencies
}
