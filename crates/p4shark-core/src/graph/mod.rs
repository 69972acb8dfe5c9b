//! Parse-state graph model.
//!
//! The graph is produced by an external P4 front end and handed over as a
//! JSON document. `loader` turns that document into a validated
//! [`ParseGraph`]; `model` holds the read-only types the extractor walks.
//! States keep document order, which is the traversal order everywhere else
//! in the crate.

pub mod error;
pub mod loader;
pub mod model;

pub use error::GraphError;
pub use loader::{parse_graph, protocol_from_state_name};
pub use model::{Branch, BranchValue, Field, ParseGraph, ParseState, StateId};
