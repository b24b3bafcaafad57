//! Grammar-level invariants checked over generated inputs.

use std::collections::HashMap;

use proptest::prelude::prop;
use proptest::strategy::{Just, Strategy, Union};
use proptest::{prop_assert, prop_assert_eq, proptest};

use ebnfc::dedup::canonicalize;
use ebnfc::layout::assign;
use ebnfc::parser::parse;
use ebnfc::table::{build, BranchSlot};
use ebnfc::tree::{NodeRef, Tree};
use ebnfc::{compile, Backend};

const NAMES: &[&str] = &["alpha", "beta", "gamma", "delta", "omega"];
const LITERALS: &[&str] = &["x", "y", "z", "+", "-", "==", "while", "a b"];
const REGEXES: &[&str] = &["[a-z]+", "[0-9]", "abc", "x|y"];

/// One expression leaf, rendered as EBNF. Identifier references only name
/// productions that always exist (see `grammars`).
fn leaf() -> impl Strategy<Value = String> {
  Union::new(vec![
    prop::sample::select(LITERALS).prop_map(|s| format!("'{s}'")).boxed(),
    prop::sample::select(REGEXES).prop_map(|s| format!("/{s}/")).boxed(),
    prop::sample::select(NAMES).prop_map(|s| s.to_string()).boxed(),
    Just("$0af3".to_string()).boxed(),
    Just("BYTE".to_string()).boxed(),
    Just("WORD:count".to_string()).boxed(),
  ])
}

fn expr() -> impl Strategy<Value = String> {
  leaf().prop_recursive(3, 16, 4, |inner| {
    Union::new(vec![
      prop::collection::vec(inner.clone(), 2..4)
        .prop_map(|parts| parts.join(" "))
        .boxed(),
      prop::collection::vec(inner.clone(), 2..4)
        .prop_map(|parts| parts.join(" | "))
        .boxed(),
      inner.clone().prop_map(|e| format!("[ {e} ]")).boxed(),
      inner.clone().prop_map(|e| format!("{{ {e} }}")).boxed(),
      inner.prop_map(|e| format!("( {e} )")).boxed(),
    ])
  })
}

/// A grammar defining every name in `NAMES`, so identifier references
/// always resolve. `WORD:count` stays unresolved by design (`count` is
/// never declared) and exercises the `-2` placeholder path.
fn grammars() -> impl Strategy<Value = String> {
  prop::collection::vec(expr(), NAMES.len()).prop_map(|bodies| {
    let mut source = String::new();
    for (name, body) in NAMES.iter().zip(bodies) {
      source.push_str(&format!("{name} := {body} .\n"));
    }
    source
  })
}

/// Walk the DAG from the root, counting how many branch slots point at
/// each node. Parents are visited once each; shared literals are leaves.
fn slot_counts(tree: &Tree, root: NodeRef) -> HashMap<NodeRef, usize> {
  let mut counts = HashMap::new();
  let mut stack = vec![root];
  let mut visited = vec![root];
  while let Some(node) = stack.pop() {
    for &branch in &tree.node(node).branches {
      *counts.entry(branch).or_insert(0) += 1;
      if !visited.contains(&branch) {
        visited.push(branch);
        stack.push(branch);
      }
    }
  }
  counts
}

proptest! {
  #[test]
  fn canonicalization_leaves_no_duplicate_literals(source in grammars()) {
    let mut grammar = parse(&source).expect("generated grammars parse");
    let root = grammar.root.expect("generated grammars are non-empty");
    canonicalize(&mut grammar.tree, root);

    let mut seen = Vec::new();
    let counts = slot_counts(&grammar.tree, root);
    for (&node, _) in counts.iter() {
      let entry = grammar.tree.node(node);
      if entry.kind.is_shareable_literal() {
        let key = (entry.kind, entry.text.clone());
        prop_assert!(!seen.contains(&key), "duplicate literal survived");
        seen.push(key);
      }
    }
  }

  #[test]
  fn refcounts_match_incoming_slots(source in grammars()) {
    let mut grammar = parse(&source).expect("generated grammars parse");
    let root = grammar.root.expect("generated grammars are non-empty");
    canonicalize(&mut grammar.tree, root);

    let counts = slot_counts(&grammar.tree, root);
    prop_assert_eq!(grammar.tree.node(root).refcnt, 1);
    for (&node, &count) in counts.iter() {
      prop_assert_eq!(grammar.tree.node(node).refcnt as usize, count);
    }
  }

  #[test]
  fn branch_array_is_consistent(source in grammars()) {
    let mut grammar = parse(&source).expect("generated grammars parse");
    let root = grammar.root.expect("generated grammars are non-empty");
    canonicalize(&mut grammar.tree, root);
    let layout = assign(&mut grammar.tree, root);
    let table = build(&grammar.tree, root, layout).expect("references resolve");

    // ids are contiguous in row order
    for (ix, row) in table.rows.iter().enumerate() {
      prop_assert_eq!(row.id, ix as i32);
    }

    // the branch array length is the sum of all branch lists
    let total: usize = table.rows.iter().map(|row| row.num_branches).sum();
    prop_assert_eq!(total, table.branch_count);

    // segments partition the array in offset order
    let mut expected_ix = 0;
    for segment in &table.segments {
      prop_assert_eq!(segment.branches_ix, expected_ix);
      expected_ix += segment.slots.len() as i32;
    }
    prop_assert_eq!(expected_ix as usize, table.branch_count);

    // every resolved slot stays inside the table
    let rows = table.rows.len() as i32;
    for segment in &table.segments {
      for slot in &segment.slots {
        if let BranchSlot::Node(id) = slot {
          prop_assert!((0..rows).contains(id));
        }
      }
    }
  }

  #[test]
  fn dump_is_a_function_of_the_input(source in grammars()) {
    let first = parse(&source).expect("generated grammars parse").dump();
    let second = parse(&source).expect("generated grammars parse").dump();
    prop_assert_eq!(first, second);
  }

  #[test]
  fn recompilation_is_byte_identical(source in grammars()) {
    let c1 = compile(&source, "gen", Backend::C).expect("compiles");
    let c2 = compile(&source, "gen", Backend::C).expect("compiles");
    prop_assert_eq!(c1, c2);
    let n1 = compile(&source, "gen", Backend::Nasm).expect("compiles");
    let n2 = compile(&source, "gen", Backend::Nasm).expect("compiles");
    prop_assert_eq!(n1, n2);
  }
}

#[test]
fn canonicalizer_is_identity_without_duplicates() {
  let source = "alpha := 'x' . beta := 'y' | /z/ .";
  let mut grammar = parse(source).expect("grammar parses");
  let root = grammar.root.expect("grammar is non-empty");
  assert_eq!(canonicalize(&mut grammar.tree, root), 0);
}
