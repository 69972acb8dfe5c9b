use std::collections::HashMap;

use serde::Deserialize;

use super::error::GraphError;
use super::model::{Branch, BranchValue, Field, ParseGraph, ParseState, StateId};

/// State-name marker used by P4 front ends (`parse_ipv4` extracts `ipv4`).
pub const STATE_NAME_MARKER: &str = "parse_";

#[derive(Debug, Deserialize)]
struct GraphRecord {
    states: Vec<StateRecord>,
}

#[derive(Debug, Deserialize)]
struct StateRecord {
    name: String,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    select: Vec<String>,
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    branches: Vec<BranchRecord>,
}

#[derive(Debug, Deserialize)]
struct BranchRecord {
    value: BranchValueRecord,
    next: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BranchValueRecord {
    Number(u64),
    Text(String),
}

/// Parse and validate a graph document.
pub fn parse_graph(document: &str) -> Result<ParseGraph, GraphError> {
    let record: GraphRecord = serde_json::from_str(document)?;
    build_graph(record)
}

/// Protocol name carried by a state name: the text after the last
/// `parse_` marker, or the whole name when there is no marker.
///
/// # Examples
/// ```
/// use p4shark_core::protocol_from_state_name;
///
/// assert_eq!(protocol_from_state_name("parse_ipv4"), "ipv4");
/// assert_eq!(protocol_from_state_name("start"), "start");
/// ```
pub fn protocol_from_state_name(name: &str) -> &str {
    name.rsplit(STATE_NAME_MARKER).next().unwrap_or(name)
}

fn build_graph(record: GraphRecord) -> Result<ParseGraph, GraphError> {
    let mut index = HashMap::with_capacity(record.states.len());
    for (position, state) in record.states.iter().enumerate() {
        if index.insert(state.name.clone(), StateId(position)).is_some() {
            return Err(GraphError::DuplicateState {
                name: state.name.clone(),
            });
        }
    }

    let mut states = Vec::with_capacity(record.states.len());
    for state in record.states {
        if let Some(field) = state.fields.iter().find(|field| field.width == 0) {
            return Err(GraphError::ZeroWidthField {
                state: state.name,
                field: field.name.clone(),
            });
        }

        let mut branches = Vec::with_capacity(state.branches.len());
        for branch in state.branches {
            let next = index
                .get(&branch.next)
                .copied()
                .ok_or_else(|| GraphError::UnknownState {
                    from: state.name.clone(),
                    to: branch.next.clone(),
                })?;
            branches.push(Branch {
                value: branch_value(&state.name, branch.value)?,
                next,
            });
        }

        let protocol = match state.protocol {
            Some(protocol) => protocol,
            None => protocol_from_state_name(&state.name).to_string(),
        };
        states.push(ParseState {
            name: state.name,
            protocol,
            fields: state.fields,
            select: state.select,
            branches,
        });
    }

    Ok(ParseGraph { states, index })
}

fn branch_value(state: &str, record: BranchValueRecord) -> Result<BranchValue, GraphError> {
    let text = match record {
        BranchValueRecord::Number(value) => return Ok(BranchValue::Value(value)),
        BranchValueRecord::Text(text) => text,
    };
    if text.eq_ignore_ascii_case("default") {
        return Ok(BranchValue::Default);
    }
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse::<u64>().ok(),
    };
    parsed
        .map(BranchValue::Value)
        .ok_or_else(|| GraphError::InvalidBranchValue {
            state: state.to_string(),
            value: text,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_GRAPH: &str = r#"{
        "states": [
            {"name": "start", "select": ["ethernet.etherType"],
             "branches": [{"value": "0x0800", "next": "parse_ipv4"}]},
            {"name": "parse_ipv4", "fields": [{"name": "version", "width": 4}],
             "branches": [{"value": "default", "next": "ingress"}]},
            {"name": "ingress", "protocol": "ingress"}
        ]
    }"#;

    #[test]
    fn loads_states_in_document_order() {
        let graph = parse_graph(SMALL_GRAPH).unwrap();
        let names: Vec<_> = graph.states().map(|state| state.name()).collect();
        assert_eq!(names, ["start", "parse_ipv4", "ingress"]);

        let start = graph.find("start").unwrap();
        assert_eq!(start.branches()[0].value, BranchValue::Value(2048));
        assert_eq!(graph.state(start.branches()[0].next).protocol(), "ipv4");

        let ipv4 = graph.find("parse_ipv4").unwrap();
        assert_eq!(ipv4.branches()[0].value, BranchValue::Default);
        assert_eq!(ipv4.decision_expression(), None);
    }

    #[test]
    fn explicit_protocol_wins_over_state_name() {
        let graph = parse_graph(
            r#"{"states": [{"name": "parse_outer_vlan", "protocol": "vlan"}]}"#,
        )
        .unwrap();
        assert_eq!(graph.find("parse_outer_vlan").unwrap().protocol(), "vlan");
    }

    #[test]
    fn protocol_from_state_name_uses_last_marker() {
        assert_eq!(protocol_from_state_name("parse_parse_x"), "x");
        assert_eq!(protocol_from_state_name("parse_tcp"), "tcp");
        assert_eq!(protocol_from_state_name("ingress"), "ingress");
    }

    #[test]
    fn rejects_unknown_branch_target() {
        let err = parse_graph(
            r#"{"states": [{"name": "start", "branches": [{"value": 1, "next": "parse_nope"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownState { ref from, ref to } if from == "start" && to == "parse_nope"
        ));
    }

    #[test]
    fn rejects_duplicate_state() {
        let err = parse_graph(r#"{"states": [{"name": "start"}, {"name": "start"}]}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate parse state"));
    }

    #[test]
    fn rejects_zero_width_field() {
        let err = parse_graph(
            r#"{"states": [{"name": "parse_x", "fields": [{"name": "pad", "width": 0}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::ZeroWidthField { .. }));
    }

    #[test]
    fn rejects_unparseable_branch_value() {
        let err = parse_graph(
            r#"{"states": [{"name": "start", "branches": [{"value": "0xZZ", "next": "start"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::InvalidBranchValue { .. }));
    }
}
