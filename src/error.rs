//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics are kept lightweight on purpose – a short message, the line
//! and approximate column, and an echo of the most recently read input so
//! the user can locate the fault without a column ruler.

use snafu::Snafu;

use crate::reader::Reader;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  /// Lexical or syntactic fault, reported at the first offending byte.
  #[snafu(display("? {message} in line {line} near position {column}\n{recent}"))]
  Syntax {
    message: String,
    line: u32,
    column: u32,
    recent: String,
  },

  /// An identifier reference that names no declared production, detected
  /// while the branch array is resolved.
  #[snafu(display("? production '{name}' not found"))]
  UnknownProduction { name: String },
}

impl CompileError {
  /// Construct a syntax error anchored at the reader's current position.
  pub fn syntax(reader: &Reader, message: impl Into<String>) -> Self {
    SyntaxSnafu {
      message: message.into(),
      line: reader.line(),
      column: reader.column(),
      recent: reader.recent(),
    }
    .build()
  }
}
