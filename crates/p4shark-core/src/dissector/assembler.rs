use tracing::info;

use super::error::GenerateError;
use super::table::{OverridePolicy, resolve_registration};
use crate::dependency::{Dependency, extract_dependencies};
use crate::graph::ParseGraph;
use crate::layout::layout_fields;

/// Prefix joined to the protocol name to form the Wireshark protocol handle.
pub const DEFAULT_HANDLE_PREFIX: &str = "p4_";

/// Inputs to script assembly that do not come from the graph.
#[derive(Debug, Clone)]
pub struct DissectorConfig {
    /// Static Lua prepended to every script (helpers such as `tobits`).
    pub template: String,
    pub handle_prefix: String,
    pub overrides: OverridePolicy,
}

impl Default for DissectorConfig {
    fn default() -> Self {
        Self {
            template: String::new(),
            handle_prefix: DEFAULT_HANDLE_PREFIX.to_string(),
            overrides: OverridePolicy::default(),
        }
    }
}

impl DissectorConfig {
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }
}

/// A generated dissector script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DissectorArtifact {
    /// Protocol the script dissects (e.g. `tcp`).
    pub protocol: String,
    /// Wireshark protocol handle (e.g. `p4_tcp`).
    pub handle: String,
    pub script: String,
}

/// Build the script for one dependency.
pub fn assemble(dependency: &Dependency<'_>, config: &DissectorConfig) -> String {
    let handle = format!("{}{}", config.handle_prefix, dependency.protocol_name);
    let mut script = preamble(&config.template, &handle);
    for descriptor in layout_fields(dependency.ordered_fields) {
        script.push_str(&descriptor.display_line());
    }
    script.push_str(&postamble(dependency, config.overrides));
    script
}

/// Generate the dissector for `protocol`.
///
/// # Examples
/// ```
/// use p4shark_core::{DissectorConfig, ParseGraph, generate};
///
/// let graph = ParseGraph::from_json_str(r#"{"states": [
///     {"name": "parse_ipv4", "select": ["ipv4.protocol"],
///      "fields": [{"name": "ttl", "width": 8}],
///      "branches": [{"value": 6, "next": "parse_tcp"}]},
///     {"name": "parse_tcp", "fields": [{"name": "srcPort", "width": 16}]}
/// ]}"#)?;
/// let artifact = generate(&graph, "tcp", &DissectorConfig::default())?;
/// assert!(artifact.script.ends_with("my_table:add(6, p4_proto)\n"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn generate(
    graph: &ParseGraph,
    protocol: &str,
    config: &DissectorConfig,
) -> Result<DissectorArtifact, GenerateError> {
    let dependencies = extract_dependencies(graph);
    let dependency = dependencies.select_first(protocol).ok_or_else(|| {
        GenerateError::ProtocolNotFound {
            protocol: protocol.to_string(),
        }
    })?;
    Ok(build_artifact(dependency, config))
}

/// Generate a dissector for every protocol that has an inbound edge, sorted
/// by protocol name.
pub fn generate_all(graph: &ParseGraph, config: &DissectorConfig) -> Vec<DissectorArtifact> {
    let dependencies = extract_dependencies(graph);
    dependencies
        .protocols()
        .into_iter()
        .filter_map(|protocol| dependencies.select_first(protocol))
        .map(|dependency| build_artifact(dependency, config))
        .collect()
}

fn build_artifact(dependency: &Dependency<'_>, config: &DissectorConfig) -> DissectorArtifact {
    let script = assemble(dependency, config);
    info!(
        protocol = dependency.protocol_name,
        previous = dependency.previous_protocol_name,
        fields = dependency.ordered_fields.len(),
        "generated dissector"
    );
    DissectorArtifact {
        protocol: dependency.protocol_name.to_string(),
        handle: format!("{}{}", config.handle_prefix, dependency.protocol_name),
        script,
    }
}

fn preamble(template: &str, handle: &str) -> String {
    let label = handle.to_uppercase();
    format!(
        "{template}\n\n-- Auto generated section\n\n\
         p4_proto = Proto(\"{handle}\",\"{label} Protocol\")\n\
         function p4_proto.dissector(buffer,pinfo,tree)\n    \
         pinfo.cols.protocol = \"{label}\"\n    \
         local subtree = tree:add(p4_proto,buffer(),\"{label} Protocol Data\")\n"
    )
}

fn postamble(dependency: &Dependency<'_>, overrides: OverridePolicy) -> String {
    let registration = resolve_registration(dependency, overrides);
    format!(
        "end\n\nmy_table = DissectorTable.get(\"{}\")\nmy_table:add({}, p4_proto)\n",
        registration.table, registration.key
    )
}
