//! Canonicalization: global deduplication of equal literal nodes.
//!
//! After this pass the tree is a DAG in which any two string-literal or
//! regex nodes with equal text are the same node. A slot is redirected only
//! to a strictly earlier node (first match of a pre-order scan), so the
//! first occurrence keeps its reference count untouched and every shared
//! node's count equals its number of incoming branch slots. The linear
//! scan is fine at the intended scale of hundreds of productions.

use crate::tree::{NodeKind, NodeRef, Tree};

/// Deduplicate literals under `root`. Returns the number of redirected
/// slots.
pub fn canonicalize(tree: &mut Tree, root: NodeRef) -> usize {
  let mut shared = 0;
  visit(tree, root, root, &mut shared);
  shared
}

fn visit(tree: &mut Tree, root: NodeRef, node: NodeRef, shared: &mut usize) {
  for ix in 0..tree.node(node).branches.len() {
    let child = tree.node(node).branches[ix];
    if tree.node(child).kind.is_shareable_literal() {
      if let Some(earlier) = find_earlier(tree, root, child) {
        tree.node_mut(node).branches[ix] = earlier;
        tree.retain(earlier);
        tree.release(child);
        *shared += 1;
      }
    } else {
      visit(tree, root, child, shared);
    }
  }
}

/// First node in pre-order with the same kind and text as `query`, if it
/// is not `query` itself.
fn find_earlier(tree: &Tree, root: NodeRef, query: NodeRef) -> Option<NodeRef> {
  let kind = tree.node(query).kind;
  let text = tree.node(query).text.clone();
  let found = find_first(tree, root, kind, text.as_deref())?;
  (found != query).then_some(found)
}

fn find_first(tree: &Tree, node: NodeRef, kind: NodeKind, text: Option<&[u8]>) -> Option<NodeRef> {
  let entry = tree.node(node);
  if entry.kind == kind && entry.text.as_deref() == text {
    return Some(node);
  }
  for &branch in &entry.branches {
    if let Some(found) = find_first(tree, branch, kind, text) {
      return Some(found);
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::parse;

  fn canonical(source: &str) -> (Tree, NodeRef, usize) {
    let mut grammar = parse(source).expect("grammar should parse");
    let root = grammar.root.expect("grammar should be non-empty");
    let shared = canonicalize(&mut grammar.tree, root);
    (grammar.tree, root, shared)
  }

  #[test]
  fn duplicate_literals_become_one_node() {
    let (tree, root, shared) = canonical("a := 'x' . b := 'x' .");
    assert_eq!(shared, 1);
    let slot = |production: usize| tree.node(tree.node(root).branches[production]).branches[0];
    assert_eq!(slot(0), slot(1));
    assert_eq!(tree.node(slot(0)).refcnt, 2);
  }

  #[test]
  fn distinct_literals_are_untouched() {
    let (tree, root, shared) = canonical("a := 'x' . b := 'y' .");
    assert_eq!(shared, 0);
    let slot = |production: usize| tree.node(tree.node(root).branches[production]).branches[0];
    assert_ne!(slot(0), slot(1));
    assert_eq!(tree.node(slot(0)).refcnt, 1);
  }

  #[test]
  fn string_and_regex_of_equal_text_stay_separate() {
    let (_, _, shared) = canonical("a := 'x' . b := /x/ .");
    assert_eq!(shared, 0);
  }

  #[test]
  fn duplicates_inside_one_production_are_shared() {
    let (tree, root, shared) = canonical("a := 'x' 'x' 'x' .");
    assert_eq!(shared, 2);
    let and = tree.node(tree.node(root).branches[0]).branches[0];
    let slots = &tree.node(and).branches;
    assert_eq!(slots[0], slots[1]);
    assert_eq!(slots[1], slots[2]);
    assert_eq!(tree.node(slots[0]).refcnt, 3);
  }

  #[test]
  fn released_duplicates_are_freed() {
    let (tree, _, _) = canonical("a := 'x' . b := 'x' .");
    let live = tree
      .nodes()
      .filter(|(_, node)| node.kind == NodeKind::StrLit)
      .count();
    // one live literal; the duplicate was emptied
    assert_eq!(live, 1);
  }

  #[test]
  fn regex_literals_deduplicate_too() {
    let (tree, root, shared) = canonical("a := /[a-z]+/ . b := /[a-z]+/ .");
    assert_eq!(shared, 1);
    let slot = |production: usize| tree.node(tree.node(root).branches[production]).branches[0];
    assert_eq!(slot(0), slot(1));
  }
}
