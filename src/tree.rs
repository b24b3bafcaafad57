//! The syntax tree: node kinds, arena storage, and reference counting.
//!
//! Nodes live in a `Tree` arena and are addressed by copyable `NodeRef`
//! handles. The parser builds a plain tree; the canonicalizer then turns it
//! into a DAG by pointing duplicate literal slots at one shared node. The
//! `refcnt` field tracks incoming references so a shared node survives the
//! release of any one owner; a node whose count reaches zero is emptied and
//! never visited again.

use std::borrow::Cow;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
  Ident,
  StrLit,
  Regex,
  BinData,
  BinField,
  BinFieldCount,
  BinFieldTimes,
  BracketExpr,
  BraceExpr,
  AndExpr,
  OrExpr,
  Production,
  ProdList,
}

impl NodeKind {
  /// Label used by the tree dump and by emitted placeholder comments.
  pub fn label(self) -> &'static str {
    match self {
      NodeKind::Ident => "T_IDENTIFIER",
      NodeKind::StrLit => "T_STR_LITERAL",
      NodeKind::Regex => "T_REG_EX",
      NodeKind::BinData => "T_BIN_DATA",
      NodeKind::BinField => "T_BIN_FIELD",
      NodeKind::BinFieldCount => "T_BIN_FIELD_COUNT",
      NodeKind::BinFieldTimes => "T_BIN_FIELD_TIMES",
      NodeKind::BracketExpr => "T_BRACK_EXPR",
      NodeKind::BraceExpr => "T_BRACE_EXPR",
      NodeKind::AndExpr => "T_AND_EXPR",
      NodeKind::OrExpr => "T_OR_EXPR",
      NodeKind::Production => "T_PRODUCTION",
      NodeKind::ProdList => "T_PROD_LIST",
    }
  }

  /// Whether nodes of this kind receive an id, a name, and a table row.
  pub fn is_exportable(self) -> bool {
    !matches!(self, NodeKind::Ident | NodeKind::ProdList)
  }

  /// Binary matches keep their named argument unresolved in the branch
  /// array (`-2` placeholder instead of an error).
  pub fn is_bin_match(self) -> bool {
    matches!(
      self,
      NodeKind::BinData | NodeKind::BinField | NodeKind::BinFieldCount | NodeKind::BinFieldTimes
    )
  }

  /// The kinds subject to canonicalization.
  pub fn is_shareable_literal(self) -> bool {
    matches!(self, NodeKind::StrLit | NodeKind::Regex)
  }
}

/// Handle into a `Tree`. Cheap to copy; never dangles while the tree lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(usize);

#[derive(Debug)]
pub struct Node {
  pub kind: NodeKind,
  pub text: Option<Vec<u8>>,
  /// Set on productions introduced with the `TOKEN` keyword. Carried for
  /// downstream consumers; numbering and emission ignore it.
  pub token: bool,
  pub branches: Vec<NodeRef>,
  pub export_ident: Option<String>,
  pub node_type_enum: Option<String>,
  pub id: i32,
  pub branches_ix: i32,
  pub refcnt: u32,
}

impl Node {
  pub fn text_lossy(&self) -> Cow<'_, str> {
    match &self.text {
      Some(text) => String::from_utf8_lossy(text),
      None => Cow::Borrowed(""),
    }
  }
}

#[derive(Debug, Default)]
pub struct Tree {
  nodes: Vec<Node>,
}

impl Tree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn alloc(&mut self, kind: NodeKind, text: Option<Vec<u8>>) -> NodeRef {
    self.nodes.push(Node {
      kind,
      text,
      token: false,
      branches: Vec::new(),
      export_ident: None,
      node_type_enum: None,
      id: -1,
      branches_ix: -1,
      refcnt: 1,
    });
    NodeRef(self.nodes.len() - 1)
  }

  pub fn node(&self, node: NodeRef) -> &Node {
    &self.nodes[node.0]
  }

  pub fn node_mut(&mut self, node: NodeRef) -> &mut Node {
    &mut self.nodes[node.0]
  }

  pub fn add_branch(&mut self, parent: NodeRef, child: NodeRef) {
    self.nodes[parent.0].branches.push(child);
  }

  /// Record an additional incoming reference.
  pub fn retain(&mut self, node: NodeRef) {
    self.nodes[node.0].refcnt += 1;
  }

  /// Drop one incoming reference. At zero the node is emptied and its
  /// branches are released in turn.
  pub fn release(&mut self, node: NodeRef) {
    let entry = &mut self.nodes[node.0];
    entry.refcnt -= 1;
    if entry.refcnt > 0 {
      return;
    }
    entry.id = -1;
    entry.branches_ix = -1;
    entry.text = None;
    entry.export_ident = None;
    entry.node_type_enum = None;
    let branches = std::mem::take(&mut entry.branches);
    for branch in branches {
      self.release(branch);
    }
  }

  /// Live nodes (refcnt above zero), in allocation order.
  pub fn nodes(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
    self
      .nodes
      .iter()
      .enumerate()
      .filter(|(_, node)| node.refcnt > 0)
      .map(|(ix, node)| (NodeRef(ix), node))
  }

  /// Pretty-print the subtree under `root`, two spaces per level.
  pub fn dump(&self, root: NodeRef) -> String {
    let mut out = String::new();
    self.dump_into(root, 0, &mut out);
    out
  }

  fn dump_into(&self, node: NodeRef, indent: usize, out: &mut String) {
    let entry = self.node(node);
    match &entry.text {
      None => {
        let _ = writeln!(out, "{:indent$}{}", "", entry.kind.label());
      }
      Some(text) => {
        let _ = writeln!(
          out,
          "{:indent$}{} '{}'",
          "",
          entry.kind.label(),
          String::from_utf8_lossy(text)
        );
      }
    }
    for &branch in &entry.branches {
      self.dump_into(branch, indent + 2, out);
    }
  }
}
