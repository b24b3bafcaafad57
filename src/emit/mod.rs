//! Code emission: formatting the parsing-table model into source files.
//!
//! Both back-ends receive the same `ParsingTable` and only differ in
//! surface syntax. Emission happens entirely in memory; the caller writes
//! the returned pair to disk once the whole pipeline has succeeded, so a
//! failed run never leaves partial files behind.

mod c;
mod nasm;

use crate::table::ParsingTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
  C,
  Nasm,
}

impl Backend {
  /// Header and implementation file names for a given stem.
  pub fn file_names(self, stem: &str) -> (String, String) {
    match self {
      Backend::C => (format!("{stem}.h"), format!("{stem}.c")),
      Backend::Nasm => (format!("{stem}.inc"), format!("{stem}.nasm")),
    }
  }
}

/// A generated header/implementation pair, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPair {
  pub header_name: String,
  pub header: String,
  pub source_name: String,
  pub source: String,
}

pub fn generate(table: &ParsingTable, stem: &str, backend: Backend) -> GeneratedPair {
  match backend {
    Backend::C => c::emit(table, stem),
    Backend::Nasm => nasm::emit(table, stem),
  }
}
