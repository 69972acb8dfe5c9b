//! p4shark core library: Wireshark dissectors from P4 parse graphs.
//!
//! A P4 front end compiles a program's parser into a graph of
//! header-extraction states linked by value-keyed branches. This crate loads
//! that graph, works out which predecessor protocol and select value lead
//! into each protocol, lays out each header field at bit precision, and
//! assembles a Lua dissector script that Wireshark can load.
//!
//! Pipeline: `graph` (load + validate) -> `dependency` (inbound edges per
//! protocol) -> `layout` (byte/bit positions per field) -> `dissector`
//! (template + preamble + field lines + table registration). Everything here
//! is pure; reading the graph file and writing scripts is the caller's job.
//!
//! Invariants:
//! - States are walked in document order, so "first discovered" is stable.
//! - Field offsets are counted in bits from 0 for every header.
//! - A script is produced whole or not at all.
//!
//! # Examples
//! ```no_run
//! use p4shark_core::{DissectorConfig, ParseGraph, generate};
//!
//! let document = std::fs::read_to_string("simple_router.json")?;
//! let graph = ParseGraph::from_json_str(&document)?;
//! let artifact = generate(&graph, "tcp", &DissectorConfig::default())?;
//! println!("{}", artifact.script);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod dependency;
pub mod dissector;
pub mod graph;
pub mod layout;

pub use dependency::{Dependencies, Dependency, extract_dependencies};
pub use dissector::{
    DissectorArtifact, DissectorConfig, GenerateError, OverridePolicy, TableRegistration,
    assemble, generate, generate_all, resolve_registration,
};
pub use graph::{
    Branch, BranchValue, Field, GraphError, ParseGraph, ParseState, StateId,
    protocol_from_state_name,
};
pub use layout::{FieldDescriptor, RenderMode, describe_field, layout_fields};
