//! Sub-parser for the embedded regular-expression syntax.
//!
//! The grammar is matched recursively but no structural tree is built:
//! every accepted byte is appended to one flat buffer that becomes the
//! text of a single regex node. The buffer caps at 255 bytes; overflow is
//! truncated silently. The downstream interpreter re-parses the body if it
//! needs structure.

use crate::error::{CompileError, CompileResult};
use crate::reader::Reader;

const MAX_BODY: usize = 255;

#[derive(Default)]
struct Body {
  text: Vec<u8>,
}

impl Body {
  fn push(&mut self, byte: u8) {
    if self.text.len() < MAX_BODY {
      self.text.push(byte);
    }
  }
}

/// Read `'/' re-expr '/'` and return the body between the delimiters.
/// The current byte is the opening `/`.
pub fn read_regex_body(reader: &mut Reader) -> CompileResult<Vec<u8>> {
  reader.advance();
  let mut body = Body::default();
  if !re_expr(reader, &mut body)? {
    return Err(CompileError::syntax(reader, "regular expression expected"));
  }
  if reader.current() != Some(b'/') {
    return Err(CompileError::syntax(
      reader,
      "delimiter '/' expected after regular expression",
    ));
  }
  reader.advance();
  Ok(body.text)
}

// re-expr := re-or-expr .
fn re_expr(reader: &mut Reader, body: &mut Body) -> CompileResult<bool> {
  re_or_expr(reader, body)
}

// re-or-expr := re-and-expr { '|' re-and-expr } .
fn re_or_expr(reader: &mut Reader, body: &mut Body) -> CompileResult<bool> {
  if !re_and_expr(reader, body)? {
    return Ok(false);
  }
  while reader.current() == Some(b'|') {
    body.push(b'|');
    reader.advance();
    if !re_and_expr(reader, body)? {
      return Err(CompileError::syntax(
        reader,
        "expression expected in regular expression",
      ));
    }
  }
  Ok(true)
}

// re-and-expr := re-repeat-expr { re-repeat-expr } .
fn re_and_expr(reader: &mut Reader, body: &mut Body) -> CompileResult<bool> {
  if !re_repeat_expr(reader, body)? {
    return Ok(false);
  }
  while re_repeat_expr(reader, body)? {}
  Ok(true)
}

// re-repeat-expr := re-base-expr [ '+' | '*' | '?' ] .
fn re_repeat_expr(reader: &mut Reader, body: &mut Body) -> CompileResult<bool> {
  if !re_base_expr(reader, body)? {
    return Ok(false);
  }
  if let Some(byte @ (b'+' | b'*' | b'?')) = reader.current() {
    body.push(byte);
    reader.advance();
  }
  Ok(true)
}

// re-base-expr := re-cc | re-chr | re-any | '(' re-expr ')' .
fn re_base_expr(reader: &mut Reader, body: &mut Body) -> CompileResult<bool> {
  if re_cc(reader, body)? || re_chr(reader, body)? || re_any(reader, body) {
    return Ok(true);
  }
  if reader.current() != Some(b'(') {
    return Ok(false);
  }
  body.push(b'(');
  reader.advance();
  if !re_expr(reader, body)? || reader.current() != Some(b')') {
    return Err(CompileError::syntax(
      reader,
      "expression expected in regular expression",
    ));
  }
  body.push(b')');
  reader.advance();
  Ok(true)
}

// re-any := '.' .
fn re_any(reader: &mut Reader, body: &mut Body) -> bool {
  if reader.current() != Some(b'.') {
    return false;
  }
  body.push(b'.');
  reader.advance();
  true
}

// re-chr := '\' <any> | [^/.*?[(|] .
fn re_chr(reader: &mut Reader, body: &mut Body) -> CompileResult<bool> {
  if reader.current() == Some(b'\\') {
    reader.advance();
    if reader.current().is_none() {
      return Err(CompileError::syntax(reader, "unexpected end of file"));
    }
    body.push(b'\\');
  } else {
    match reader.current() {
      None => return Err(CompileError::syntax(reader, "unexpected end of file")),
      Some(b'/' | b'.' | b'*' | b'?' | b'[' | b'(' | b'|') => return Ok(false),
      Some(_) => {}
    }
  }
  if let Some(byte) = reader.current() {
    body.push(byte);
  }
  reader.advance();
  Ok(true)
}

// re-cc-chr := '\' <any> | [^\]] .
fn re_cc_chr(reader: &mut Reader, body: &mut Body) -> CompileResult<bool> {
  if reader.current() == Some(b'\\') {
    reader.advance();
    if reader.current().is_none() {
      return Err(CompileError::syntax(reader, "unexpected end of file"));
    }
    body.push(b'\\');
  } else {
    match reader.current() {
      None => return Err(CompileError::syntax(reader, "unexpected end of file")),
      Some(b'\\' | b']') => return Ok(false),
      Some(_) => {}
    }
  }
  if let Some(byte) = reader.current() {
    body.push(byte);
  }
  reader.advance();
  Ok(true)
}

// re-cc-item := re-cc-chr [ '-' re-cc-chr ] .
fn re_cc_item(reader: &mut Reader, body: &mut Body) -> CompileResult<bool> {
  if !re_cc_chr(reader, body)? {
    return Ok(false);
  }
  if reader.current() == Some(b'-') {
    body.push(b'-');
    reader.advance();
    if !re_cc_chr(reader, body)? {
      return Err(CompileError::syntax(
        reader,
        "bad character class in regular expression",
      ));
    }
  }
  Ok(true)
}

// re-cc := '[' [ '^' ] re-cc-item+ ']' .
fn re_cc(reader: &mut Reader, body: &mut Body) -> CompileResult<bool> {
  if reader.current() != Some(b'[') {
    return Ok(false);
  }
  body.push(b'[');
  reader.advance();
  if reader.current() == Some(b'^') {
    body.push(b'^');
    reader.advance();
  }
  if !re_cc_item(reader, body)? {
    return Err(CompileError::syntax(
      reader,
      "bad character class in regular expression",
    ));
  }
  while re_cc_item(reader, body)? {}
  if reader.current() != Some(b']') {
    return Err(CompileError::syntax(
      reader,
      "bad character class in regular expression",
    ));
  }
  body.push(b']');
  reader.advance();
  Ok(true)
}
