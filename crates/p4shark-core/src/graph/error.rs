use thiserror::Error;

/// Errors returned while loading a parse graph document.
///
/// # Examples
/// ```
/// use p4shark_core::{GraphError, ParseGraph};
///
/// let err = ParseGraph::from_json_str("{\"states\": 1}").unwrap_err();
/// assert!(matches!(err, GraphError::Json(_)));
/// ```
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("malformed graph document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate parse state: {name}")]
    DuplicateState { name: String },
    #[error("state {from} branches to unknown state {to}")]
    UnknownState { from: String, to: String },
    #[error("field {field} in state {state} has zero width")]
    ZeroWidthField { state: String, field: String },
    #[error("invalid branch value {value:?} in state {state}")]
    InvalidBranchValue { state: String, value: String },
}
