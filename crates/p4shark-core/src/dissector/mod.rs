//! Wireshark Lua dissector generation.
//!
//! `assembler` stitches the static template, the generated preamble, one
//! subtree line per field and the table registration into a script. `table`
//! decides which dissector table the script registers on. Nothing here does
//! I/O: the caller supplies the template text and writes the result.

pub mod assembler;
pub mod error;
pub mod table;

pub use assembler::{DissectorArtifact, DissectorConfig, assemble, generate, generate_all};
pub use error::GenerateError;
pub use table::{OverridePolicy, TableRegistration, resolve_registration};
