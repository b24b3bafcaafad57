//! Recursive-descent parser producing the production tree.
//!
//! The parser mirrors the grammar directly: one method per rule, each
//! returning `Ok(None)` when its first token is absent so callers can try
//! alternatives, and a hard error once a rule is committed. Single-child
//! `and`/`or` wrappers are elided on construction; downstream passes rely
//! on that simplification.

use crate::error::{CompileError, CompileResult};
use crate::lexer;
use crate::reader::Reader;
use crate::regex;
use crate::tree::{NodeKind, NodeRef, Tree};

/// Parse result: the tree arena plus the root production list. `root` is
/// `None` for an input containing no productions at all.
#[derive(Debug)]
pub struct Grammar {
  pub tree: Tree,
  pub root: Option<NodeRef>,
}

impl Grammar {
  /// Pretty-print the syntax tree; empty grammars print nothing.
  pub fn dump(&self) -> String {
    match self.root {
      Some(root) => self.tree.dump(root),
      None => String::new(),
    }
  }

  /// Number of parsed productions.
  pub fn production_count(&self) -> usize {
    match self.root {
      Some(root) => self.tree.node(root).branches.len(),
      None => 0,
    }
  }
}

/// Parse EBNF source into a `Grammar`. Anything after the last production
/// other than whitespace and comments is rejected.
pub fn parse(source: &str) -> CompileResult<Grammar> {
  let mut parser = Parser {
    reader: Reader::new(source),
    tree: Tree::new(),
  };
  parser.reader.advance();
  let root = parser.read_prod_list()?;
  lexer::skip_whitespace(&mut parser.reader);
  if parser.reader.current().is_some() {
    return Err(CompileError::syntax(&parser.reader, "production expected"));
  }
  Ok(Grammar {
    tree: parser.tree,
    root,
  })
}

struct Parser<'a> {
  reader: Reader<'a>,
  tree: Tree,
}

impl Parser<'_> {
  // prod-list := production { production } .
  fn read_prod_list(&mut self) -> CompileResult<Option<NodeRef>> {
    let mut productions = Vec::new();
    while let Some(production) = self.read_production()? {
      productions.push(production);
    }
    if productions.is_empty() {
      return Ok(None);
    }
    let root = self.tree.alloc(NodeKind::ProdList, None);
    for production in productions {
      self.tree.add_branch(root, production);
    }
    Ok(Some(root))
  }

  // production := [ 'TOKEN' ] identifier ':=' expr '.' .
  fn read_production(&mut self) -> CompileResult<Option<NodeRef>> {
    lexer::skip_whitespace(&mut self.reader);
    let mut token = false;
    if self.reader.current() == Some(b'T') {
      let word = lexer::read_uppercase_word(&mut self.reader, 5);
      if word == b"TOKEN" {
        token = true;
      } else {
        lexer::unread_word(&mut self.reader, &word);
        return Ok(None);
      }
    }
    lexer::skip_whitespace(&mut self.reader);
    let name = match self.reader.current() {
      Some(byte) if lexer::is_ident_start(byte) => lexer::read_identifier(&mut self.reader),
      _ => return Ok(None),
    };
    lexer::skip_whitespace(&mut self.reader);
    if self.reader.current() != Some(b':') {
      let found = describe_byte(self.reader.current());
      return Err(CompileError::syntax(
        &self.reader,
        format!("':' expected, but found {found}"),
      ));
    }
    self.reader.advance();
    if self.reader.current() != Some(b'=') {
      return Err(CompileError::syntax(&self.reader, "'=' expected"));
    }
    self.reader.advance();
    let expr = match self.read_expr()? {
      Some(expr) => expr,
      None => {
        return Err(CompileError::syntax(
          &self.reader,
          "expression expected in production",
        ));
      }
    };
    lexer::skip_whitespace(&mut self.reader);
    if self.reader.current() != Some(b'.') {
      return Err(CompileError::syntax(&self.reader, "'.' expected"));
    }
    self.reader.advance();
    let production = self.tree.alloc(NodeKind::Production, Some(name));
    self.tree.node_mut(production).token = token;
    self.tree.add_branch(production, expr);
    Ok(Some(production))
  }

  // expr := or-expr .
  fn read_expr(&mut self) -> CompileResult<Option<NodeRef>> {
    self.read_or_expr()
  }

  // or-expr := and-expr { '|' and-expr } .
  fn read_or_expr(&mut self) -> CompileResult<Option<NodeRef>> {
    let Some(first) = self.read_and_expr()? else {
      return Ok(None);
    };
    let mut alternatives = vec![first];
    loop {
      lexer::skip_whitespace(&mut self.reader);
      if self.reader.current() != Some(b'|') {
        break;
      }
      self.reader.advance();
      match self.read_and_expr()? {
        Some(alternative) => alternatives.push(alternative),
        None => {
          return Err(CompileError::syntax(
            &self.reader,
            "expression expected after '|'",
          ));
        }
      }
    }
    Ok(Some(self.wrap(NodeKind::OrExpr, alternatives)))
  }

  // and-expr := base-expr { base-expr } .
  fn read_and_expr(&mut self) -> CompileResult<Option<NodeRef>> {
    let Some(first) = self.read_base_expr()? else {
      return Ok(None);
    };
    let mut sequence = vec![first];
    while let Some(next) = self.read_base_expr()? {
      sequence.push(next);
    }
    Ok(Some(self.wrap(NodeKind::AndExpr, sequence)))
  }

  /// Wrap children in a node of `kind`, eliding the wrapper when the
  /// sequence has a single element.
  fn wrap(&mut self, kind: NodeKind, children: Vec<NodeRef>) -> NodeRef {
    if children.len() == 1 {
      return children[0];
    }
    let node = self.tree.alloc(kind, None);
    for child in children {
      self.tree.add_branch(node, child);
    }
    node
  }

  // base-expr := identifier | str-lit | regex | bin-match
  //            | '(' expr ')' | '[' expr ']' | '{' expr '}' .
  fn read_base_expr(&mut self) -> CompileResult<Option<NodeRef>> {
    lexer::skip_whitespace(&mut self.reader);
    match self.reader.current() {
      Some(b'\'') | Some(b'"') => {
        let text = lexer::read_str_literal(&mut self.reader)?;
        Ok(Some(self.tree.alloc(NodeKind::StrLit, Some(text))))
      }
      Some(b'/') => {
        let body = regex::read_regex_body(&mut self.reader)?;
        Ok(Some(self.tree.alloc(NodeKind::Regex, Some(body))))
      }
      Some(b'(') => self.read_paren_expr().map(Some),
      Some(b'[') => self.read_grouped(NodeKind::BracketExpr, b']').map(Some),
      Some(b'{') => self.read_grouped(NodeKind::BraceExpr, b'}').map(Some),
      Some(byte) if lexer::is_ident_start(byte) => {
        let name = lexer::read_identifier(&mut self.reader);
        Ok(Some(self.tree.alloc(NodeKind::Ident, Some(name))))
      }
      _ => self.read_bin_match(),
    }
  }

  // '(' expr ')' returns the inner expression without a wrapper.
  fn read_paren_expr(&mut self) -> CompileResult<NodeRef> {
    self.reader.advance();
    let expr = match self.read_expr()? {
      Some(expr) => expr,
      None => {
        return Err(CompileError::syntax(
          &self.reader,
          "expression expected after '('",
        ));
      }
    };
    if self.reader.current() != Some(b')') {
      return Err(CompileError::syntax(
        &self.reader,
        "closing parenthesis ')' expected",
      ));
    }
    self.reader.advance();
    Ok(expr)
  }

  // '[' expr ']' and '{' expr '}' wrap the inner expression.
  fn read_grouped(&mut self, kind: NodeKind, close: u8) -> CompileResult<NodeRef> {
    let open = match kind {
      NodeKind::BracketExpr => '[',
      _ => '{',
    };
    self.reader.advance();
    let expr = match self.read_expr()? {
      Some(expr) => expr,
      None => {
        return Err(CompileError::syntax(
          &self.reader,
          format!("expression expected after '{open}'"),
        ));
      }
    };
    if self.reader.current() != Some(close) {
      let what = match kind {
        NodeKind::BracketExpr => "closing bracket ']' expected",
        _ => "closing brace '}' expected",
      };
      return Err(CompileError::syntax(&self.reader, what));
    }
    self.reader.advance();
    let node = self.tree.alloc(kind, None);
    self.tree.add_branch(node, expr);
    Ok(node)
  }

  // bin-match := hexadecimal
  //            | ( 'BYTE' | 'WORD' | 'DWORD' | 'QWORD' )
  //              [ ':' identifier | '*' identifier ] .
  fn read_bin_match(&mut self) -> CompileResult<Option<NodeRef>> {
    lexer::skip_whitespace(&mut self.reader);
    match self.reader.current() {
      Some(b'$') => {
        let digits = lexer::read_hex_literal(&mut self.reader)?;
        Ok(Some(self.tree.alloc(NodeKind::BinData, Some(digits))))
      }
      Some(b'B' | b'W' | b'D' | b'Q') => {
        const WIDTH_KEYWORDS: [&[u8]; 4] = [b"BYTE", b"WORD", b"DWORD", b"QWORD"];
        let word = lexer::read_uppercase_word(&mut self.reader, 5);
        if !WIDTH_KEYWORDS.contains(&word.as_slice()) {
          lexer::unread_word(&mut self.reader, &word);
          return Ok(None);
        }
        let mut kind = NodeKind::BinField;
        let mut argument = None;
        if let Some(mark @ (b':' | b'*')) = self.reader.current() {
          kind = if mark == b':' {
            NodeKind::BinFieldCount
          } else {
            NodeKind::BinFieldTimes
          };
          self.reader.advance();
          match self.reader.current() {
            Some(byte) if lexer::is_ident_start(byte) => {
              argument = Some(lexer::read_identifier(&mut self.reader));
            }
            _ => {
              return Err(CompileError::syntax(
                &self.reader,
                "identifier expected after ':' or '*' in binary match",
              ));
            }
          }
        }
        let field = self.tree.alloc(kind, Some(word));
        if let Some(name) = argument {
          let ident = self.tree.alloc(NodeKind::Ident, Some(name));
          self.tree.add_branch(field, ident);
        }
        Ok(Some(field))
      }
      _ => Ok(None),
    }
  }
}

/// Render a byte for the `':' expected` diagnostic: printable bytes appear
/// verbatim with their code, everything else as a placeholder dot.
fn describe_byte(byte: Option<u8>) -> String {
  match byte {
    Some(b) if b & 0x60 != 0 => format!("'{}' ({b})", b as char),
    Some(b) => format!("'.' ({b})"),
    None => "end of file".to_string(),
  }
}
