//! Back-end-agnostic parsing-table model.
//!
//! Both emitters consume the same flattened view of the DAG: rows in id
//! order and branch segments in offset order, with every slot already
//! resolved. Building the model is where undeclared production references
//! surface, before any output exists, so both back-ends share one
//! resolution path.

use std::collections::HashMap;

use crate::error::{CompileResult, UnknownProductionSnafu};
use crate::layout::Layout;
use crate::tree::{NodeKind, NodeRef, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
  Terminal,
  Production,
  Mandatory,
  Alternative,
  Optional,
  OptionalRepetitive,
}

impl NodeClass {
  pub fn name(self) -> &'static str {
    match self {
      NodeClass::Terminal => "NC_TERMINAL",
      NodeClass::Production => "NC_PRODUCTION",
      NodeClass::Mandatory => "NC_MANDATORY",
      NodeClass::Alternative => "NC_ALTERNATIVE",
      NodeClass::Optional => "NC_OPTIONAL",
      NodeClass::OptionalRepetitive => "NC_OPTIONAL_REPETITIVE",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermType {
  Undef,
  Str,
  Regex,
  Binary,
}

impl TermType {
  pub fn name(self) -> &'static str {
    match self {
      TermType::Undef => "TT_UNDEF",
      TermType::Str => "TT_STRING",
      TermType::Regex => "TT_REGEX",
      TermType::Binary => "TT_BINARY",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
  Byte,
  Word,
  Dword,
  Qword,
}

impl FieldWidth {
  /// `TB_*` bit value of the width nibble.
  pub fn bits(self) -> u8 {
    match self {
      FieldWidth::Byte => 0x02,
      FieldWidth::Word => 0x03,
      FieldWidth::Dword => 0x04,
      FieldWidth::Qword => 0x05,
    }
  }

  /// Symbolic constant name for assembly output.
  pub fn symbol(self) -> &'static str {
    match self {
      FieldWidth::Byte => "TB_BYTE",
      FieldWidth::Word => "TB_WORD",
      FieldWidth::Dword => "TB_DWORD",
      FieldWidth::Qword => "TB_QWORD",
    }
  }
}

/// Terminal payload of a table row. Formatting differs per back-end; the
/// model keeps the raw shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
  /// No terminal text; emitted as the null sentinel.
  Empty,
  /// String or regex body, raw bytes.
  Text(Vec<u8>),
  /// Decoded binary data bytes.
  Bytes(Vec<u8>),
  /// Typed binary field with its flag bits.
  Field {
    width: FieldWidth,
    param: bool,
    write: bool,
  },
}

impl Payload {
  pub fn is_empty(&self) -> bool {
    matches!(self, Payload::Empty)
  }

  /// The single encoded byte of a `Field` payload.
  pub fn field_byte(width: FieldWidth, param: bool, write: bool) -> u8 {
    let mut value = width.bits();
    if param {
      value |= 0x10; // TBF_PARAM
    }
    if write {
      value |= 0x20; // TBF_WRITE
    }
    value
  }
}

#[derive(Debug)]
pub struct TableRow {
  pub id: i32,
  pub export_ident: String,
  pub class: NodeClass,
  pub node_type: String,
  pub term_type: TermType,
  pub payload: Payload,
  pub num_branches: usize,
  pub branches_ix: i32,
}

/// One resolved branch slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSlot {
  /// A parsing-table row id.
  Node(i32),
  /// Non-exportable child outside a binary match; emitted as `-1` with the
  /// child's kind label.
  NotExported(&'static str),
  /// Unresolved argument of a binary match; emitted as `-2` with the
  /// child's kind label.
  BinParam(&'static str),
}

/// The branch slice owned by one exportable node.
#[derive(Debug)]
pub struct BranchSegment {
  pub branches_ix: i32,
  pub owner: String,
  pub slots: Vec<BranchSlot>,
}

#[derive(Debug)]
pub struct ParsingTable {
  pub tags: Vec<String>,
  pub rows: Vec<TableRow>,
  pub segments: Vec<BranchSegment>,
  pub branch_count: usize,
}

/// Flatten the annotated DAG into the emission model.
pub fn build(tree: &Tree, root: NodeRef, layout: Layout) -> CompileResult<ParsingTable> {
  // first declaration wins when production names repeat
  let mut productions: HashMap<Vec<u8>, i32> = HashMap::new();
  for &child in &tree.node(root).branches {
    let entry = tree.node(child);
    if entry.kind == NodeKind::Production {
      if let Some(name) = &entry.text {
        productions.entry(name.clone()).or_insert(entry.id);
      }
    }
  }

  let mut by_id: Vec<Option<NodeRef>> = vec![None; layout.node_count];
  collect_by_id(tree, root, &mut by_id);

  let mut rows = Vec::with_capacity(layout.node_count);
  let mut segments = Vec::new();
  for node in by_id.into_iter().flatten() {
    let entry = tree.node(node);
    let export_ident = entry.export_ident.clone().unwrap_or_default();
    if !entry.branches.is_empty() {
      let mut slots = Vec::with_capacity(entry.branches.len());
      for &branch in &entry.branches {
        slots.push(resolve_slot(tree, entry.kind, branch, &productions)?);
      }
      segments.push(BranchSegment {
        branches_ix: entry.branches_ix,
        owner: export_ident.clone(),
        slots,
      });
    }
    rows.push(TableRow {
      id: entry.id,
      export_ident,
      class: node_class(entry.kind),
      node_type: entry.node_type_enum.clone().unwrap_or_default(),
      term_type: term_type(entry.kind),
      payload: payload(tree, node),
      num_branches: entry.branches.len(),
      branches_ix: entry.branches_ix,
    });
  }

  Ok(ParsingTable {
    tags: layout.tags,
    rows,
    segments,
    branch_count: layout.branch_count,
  })
}

/// Pre-order walk recording the first ref seen for each id.
fn collect_by_id(tree: &Tree, node: NodeRef, by_id: &mut [Option<NodeRef>]) {
  let entry = tree.node(node);
  if entry.id >= 0 {
    let slot = &mut by_id[entry.id as usize];
    if slot.is_none() {
      *slot = Some(node);
    }
  }
  for &branch in &entry.branches {
    collect_by_id(tree, branch, by_id);
  }
}

fn resolve_slot(
  tree: &Tree,
  parent: NodeKind,
  branch: NodeRef,
  productions: &HashMap<Vec<u8>, i32>,
) -> CompileResult<BranchSlot> {
  let child = tree.node(branch);
  if child.id >= 0 {
    return Ok(BranchSlot::Node(child.id));
  }
  if child.kind == NodeKind::Ident {
    if let Some(text) = &child.text {
      if let Some(&id) = productions.get(text) {
        return Ok(BranchSlot::Node(id));
      }
    }
  }
  if parent.is_bin_match() {
    return Ok(BranchSlot::BinParam(child.kind.label()));
  }
  if child.kind == NodeKind::Ident {
    return UnknownProductionSnafu {
      name: child.text_lossy().into_owned(),
    }
    .fail();
  }
  Ok(BranchSlot::NotExported(child.kind.label()))
}

fn node_class(kind: NodeKind) -> NodeClass {
  match kind {
    NodeKind::Production => NodeClass::Production,
    NodeKind::AndExpr => NodeClass::Mandatory,
    NodeKind::OrExpr => NodeClass::Alternative,
    NodeKind::BracketExpr => NodeClass::Optional,
    NodeKind::BraceExpr => NodeClass::OptionalRepetitive,
    _ => NodeClass::Terminal,
  }
}

fn term_type(kind: NodeKind) -> TermType {
  match kind {
    NodeKind::StrLit => TermType::Str,
    NodeKind::Regex => TermType::Regex,
    NodeKind::BinData | NodeKind::BinField | NodeKind::BinFieldCount | NodeKind::BinFieldTimes => {
      TermType::Binary
    }
    _ => TermType::Undef,
  }
}

fn payload(tree: &Tree, node: NodeRef) -> Payload {
  let entry = tree.node(node);
  match entry.kind {
    NodeKind::StrLit | NodeKind::Regex => {
      Payload::Text(entry.text.clone().unwrap_or_default())
    }
    NodeKind::BinData => Payload::Bytes(decode_hex(entry.text.as_deref().unwrap_or_default())),
    NodeKind::BinField | NodeKind::BinFieldCount | NodeKind::BinFieldTimes => Payload::Field {
      width: field_width(entry.text.as_deref().unwrap_or_default()),
      param: !entry.branches.is_empty(),
      write: entry.kind == NodeKind::BinFieldCount,
    },
    _ => Payload::Empty,
  }
}

fn field_width(text: &[u8]) -> FieldWidth {
  if text == b"BYTE" {
    FieldWidth::Byte
  } else if text == b"WORD" {
    FieldWidth::Word
  } else if text == b"DWORD" {
    FieldWidth::Dword
  } else if text == b"QWORD" {
    FieldWidth::Qword
  } else {
    unreachable!("parser only builds the four width keywords")
  }
}

/// Decode a normalized (even-length, lowercase) hex string.
fn decode_hex(digits: &[u8]) -> Vec<u8> {
  digits
    .chunks_exact(2)
    .map(|pair| {
      let hi = hex_value(pair[0]);
      let lo = hex_value(pair[1]);
      (hi << 4) | lo
    })
    .collect()
}

fn hex_value(digit: u8) -> u8 {
  match digit {
    b'0'..=b'9' => digit - b'0',
    b'a'..=b'f' => digit - b'a' + 10,
    _ => 0,
  }
}
