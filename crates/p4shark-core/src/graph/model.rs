use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use super::error::GraphError;
use super::loader::parse_graph;

/// A single header field extracted by a parse state.
///
/// # Examples
/// ```
/// use p4shark_core::Field;
///
/// let field = Field::new("version", 4);
/// assert_eq!(field.width, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Field {
    /// Field name as declared in the header type.
    pub name: String,
    /// Width in bits (at least 1, not necessarily byte aligned).
    pub width: u32,
}

impl Field {
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// Literal that selects an outgoing branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchValue {
    Value(u64),
    Default,
}

impl fmt::Display for BranchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchValue::Value(value) => write!(f, "{value}"),
            BranchValue::Default => f.write_str("default"),
        }
    }
}

/// Index of a state inside its [`ParseGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub value: BranchValue,
    pub next: StateId,
}

/// One header-extraction state.
#[derive(Debug, Clone)]
pub struct ParseState {
    pub(crate) name: String,
    pub(crate) protocol: String,
    pub(crate) fields: Vec<Field>,
    pub(crate) select: Vec<String>,
    pub(crate) branches: Vec<Branch>,
}

impl ParseState {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Protocol this state represents (e.g. `ipv4` for `parse_ipv4`).
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Fields extracted by this state, in header order. Empty for `start`
    /// and for terminal states.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Dotted field reference the branch decision is made on, if the state
    /// selects on anything. Only the first select key counts.
    pub fn decision_expression(&self) -> Option<&str> {
        self.select.first().map(String::as_str)
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }
}

/// Read-only parse-state graph, iterated in document order.
///
/// # Examples
/// ```
/// use p4shark_core::ParseGraph;
///
/// let graph = ParseGraph::from_json_str(r#"{"states": [{"name": "start"}]}"#)?;
/// assert_eq!(graph.len(), 1);
/// assert_eq!(graph.find("start").map(|s| s.protocol()), Some("start"));
/// # Ok::<(), p4shark_core::GraphError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParseGraph {
    pub(crate) states: Vec<ParseState>,
    pub(crate) index: HashMap<String, StateId>,
}

impl ParseGraph {
    pub fn from_json_str(document: &str) -> Result<Self, GraphError> {
        parse_graph(document)
    }

    pub fn states(&self) -> impl Iterator<Item = &ParseState> {
        self.states.iter()
    }

    /// Resolve a branch target. Ids only come from this graph's branches.
    pub fn state(&self, id: StateId) -> &ParseState {
        &self.states[id.0]
    }

    pub fn find(&self, name: &str) -> Option<&ParseState> {
        self.index.get(name).map(|id| self.state(*id))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
