//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `reader` delivers payload bytes with line tracking and pushback.
//! - `lexer` and `regex` recognize the token-shaped input fragments.
//! - `parser` owns all syntactic knowledge and returns the production tree.
//! - `dedup` shares equal literals, turning the tree into a DAG.
//! - `layout` numbers and names exportable nodes and lays out branches.
//! - `table` flattens the DAG into the back-end-agnostic emission model.
//! - `emit` formats the model as C or NASM sources, in memory.

pub mod dedup;
pub mod emit;
pub mod error;
pub mod layout;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod regex;
pub mod table;
pub mod tree;

pub use emit::{Backend, GeneratedPair};
pub use error::{CompileError, CompileResult};
pub use parser::{parse, Grammar};

/// Compile EBNF source into a generated header/implementation pair.
///
/// Returns `Ok(None)` for an input containing no productions: an empty
/// grammar is valid but produces no files.
pub fn compile(source: &str, stem: &str, backend: Backend) -> CompileResult<Option<GeneratedPair>> {
  let mut grammar = parser::parse(source)?;
  let Some(root) = grammar.root else {
    log::debug!("no productions; nothing to emit");
    return Ok(None);
  };
  log::debug!("parsed {} productions", grammar.production_count());
  let shared = dedup::canonicalize(&mut grammar.tree, root);
  log::debug!("canonicalized {shared} duplicate literal references");
  let layout = layout::assign(&mut grammar.tree, root);
  log::debug!(
    "laid out {} table rows over {} branch slots",
    layout.node_count,
    layout.branch_count
  );
  let table = table::build(&grammar.tree, root, layout)?;
  let pair = emit::generate(&table, stem, backend);
  log::debug!(
    "emitted {} ({} bytes) and {} ({} bytes)",
    pair.header_name,
    pair.header.len(),
    pair.source_name,
    pair.source.len()
  );
  Ok(Some(pair))
}
