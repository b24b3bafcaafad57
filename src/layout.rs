//! Numbering and layout: the two pre-order walks that prepare the DAG for
//! emission.
//!
//! The first walk assigns every exportable node its global id and its
//! node-type enumeration tag, collecting the deduplicated tag list that
//! becomes the emitted enumeration. The second walk materializes stable
//! export identifiers and lays out each node's slice of the flat branch
//! array. Both walks guard per node, so a literal shared by many slots is
//! numbered and named exactly once.

use std::collections::HashSet;

use crate::tree::{NodeKind, NodeRef, Tree};

/// Enumeration tags for fixed operator terminals. Any other non-name body
/// falls back to a numeric `NT_TERMINAL_<id>` tag.
const OPERATOR_LABELS: &[(&str, &str)] = &[
  ("<>", "NE"),
  ("!=", "CNE"),
  ("==", "DEQ"),
  ("=", "EQ"),
  (">=", "GE"),
  ("<=", "LE"),
  ("<", "LT"),
  (">", "GT"),
  ("&", "AND"),
  ("&&", "LOGAND"),
  ("|", "OR"),
  ("||", "LOGOR"),
  (";", "SEMIC"),
  (",", "COMMA"),
  (":", "COLON"),
  ("(", "LPAREN"),
  (")", "RPAREN"),
  ("[", "LBRACK"),
  ("]", "RBRACK"),
  ("{", "LBRACE"),
  ("}", "RBRACE"),
  ("^", "XOR"),
  ("^^", "LOGXOR"),
  ("*", "STAR"),
  ("**", "DBLSTAR"),
  ("/", "SLASH"),
  ("+", "PLUS"),
  ("-", "MINUS"),
  (":=", "ASSIGN"),
  ("::=", "ASSIGN2"),
  ("~=", "APPLY"),
  ("++", "PLUSPLUS"),
  ("--", "MINUSMINUS"),
  ("+=", "PLUSEQ"),
  ("-=", "MINUSEQ"),
  ("*=", "STAREQ"),
  ("/=", "SLASHEQ"),
  ("&=", "ANDEQ"),
  ("|=", "OREQ"),
  ("^=", "XOREQ"),
  (".", "DOT"),
  ("!", "EXCLAM"),
  ("<<", "LSHIFT"),
  (">>", "RSHIFT"),
  ("%", "MODULO"),
  ("%=", "MODULOEQ"),
  ("...", "ELLIPSIS"),
  ("..", "RANGE"),
];

/// The sentinel tag shared by all nodes without a dedicated enumeration
/// entry; emitted once as the enumeration prelude.
pub const GENERIC_TAG: &str = "_NT_GENERIC";

pub struct Layout {
  /// Enumeration tags in emission order, `_NT_GENERIC` excluded.
  pub tags: Vec<String>,
  /// Parsing-table row count.
  pub node_count: usize,
  /// Total branch-array length.
  pub branch_count: usize,
}

/// Run both walks over the DAG under `root`.
pub fn assign(tree: &mut Tree, root: NodeRef) -> Layout {
  let mut tags = Vec::new();
  let mut seen_labels = HashSet::new();
  let mut next_id = 0;
  enumerate(tree, root, &mut next_id, &mut tags, &mut seen_labels);
  let mut branch_ix = 0;
  name_and_lay_out(tree, root, &mut branch_ix);
  Layout {
    tags,
    node_count: next_id as usize,
    branch_count: branch_ix as usize,
  }
}

fn enumerate(
  tree: &mut Tree,
  node: NodeRef,
  next_id: &mut i32,
  tags: &mut Vec<String>,
  seen_labels: &mut HashSet<String>,
) {
  let entry = tree.node(node);
  if entry.kind.is_exportable() && entry.id == -1 {
    let (tag, emit) = match entry.kind {
      NodeKind::Production => (production_tag(&entry.text_lossy()), true),
      NodeKind::StrLit | NodeKind::Regex => terminal_tag(entry.text.as_deref(), *next_id, seen_labels),
      _ => (GENERIC_TAG.to_string(), false),
    };
    let entry = tree.node_mut(node);
    entry.node_type_enum = Some(tag.clone());
    entry.id = *next_id;
    *next_id += 1;
    if emit {
      tags.push(tag);
    }
  }
  for ix in 0..tree.node(node).branches.len() {
    let branch = tree.node(node).branches[ix];
    enumerate(tree, branch, next_id, tags, seen_labels);
  }
}

fn name_and_lay_out(tree: &mut Tree, node: NodeRef, branch_ix: &mut i32) {
  let entry = tree.node(node);
  if entry.id >= 0 && entry.export_ident.is_none() {
    let ident = match entry.kind {
      NodeKind::Production => format!("production_{}", entry.text_lossy().replace('-', "_")),
      NodeKind::StrLit => format!("string_terminal_{}", entry.id),
      NodeKind::Regex => format!("regex_terminal_{}", entry.id),
      NodeKind::AndExpr => format!("mandatory_expr_{}", entry.id),
      NodeKind::OrExpr => format!("alternative_expr_{}", entry.id),
      NodeKind::BracketExpr => format!("optional_expr_{}", entry.id),
      NodeKind::BraceExpr => format!("optional_repetitive_expr_{}", entry.id),
      // binary terminals carry no prefix
      _ => format!("{}", entry.id),
    };
    let branches = entry.branches.len();
    let entry = tree.node_mut(node);
    entry.export_ident = Some(ident);
    if branches != 0 {
      entry.branches_ix = *branch_ix;
      *branch_ix += branches as i32;
    }
  }
  for ix in 0..tree.node(node).branches.len() {
    let branch = tree.node(node).branches[ix];
    name_and_lay_out(tree, branch, branch_ix);
  }
}

/// `NT_` tag for a production: dashes to underscores, uppercased.
fn production_tag(name: &str) -> String {
  let mut tag = String::from("NT_");
  for c in name.chars() {
    match c {
      '-' => tag.push('_'),
      _ => tag.push(c.to_ascii_uppercase()),
    }
  }
  tag
}

/// `NT_TERMINAL_*` tag for a literal. Name-shaped and operator bodies get
/// readable labels, deduplicated across the grammar; anything else falls
/// back to the node id.
fn terminal_tag(text: Option<&[u8]>, id: i32, seen_labels: &mut HashSet<String>) -> (String, bool) {
  let text = text.unwrap_or_default();
  if is_name(text) {
    let label: String = text.iter().map(|&b| b.to_ascii_uppercase() as char).collect();
    return dedup_label(format!("NT_TERMINAL_{label}"), seen_labels);
  }
  if let Some(label) = operator_label(text) {
    return dedup_label(format!("NT_TERMINAL_{label}"), seen_labels);
  }
  (format!("NT_TERMINAL_{id}"), true)
}

fn dedup_label(label: String, seen_labels: &mut HashSet<String>) -> (String, bool) {
  let fresh = seen_labels.insert(label.clone());
  (label, fresh)
}

/// A body consisting solely of letters, digits, and underscores can be
/// embedded into an enumeration tag directly.
fn is_name(text: &[u8]) -> bool {
  text
    .iter()
    .all(|&b| b.is_ascii_alphanumeric() || b == b'_')
}

fn operator_label(text: &[u8]) -> Option<&'static str> {
  OPERATOR_LABELS
    .iter()
    .find(|(op, _)| op.as_bytes() == text)
    .map(|&(_, label)| label)
}
