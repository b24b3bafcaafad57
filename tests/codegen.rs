//! End-to-end scenarios: compile small grammars and check the generated
//! sources of both back-ends.

use ebnfc::{compile, Backend, GeneratedPair};

fn c_pair(source: &str) -> GeneratedPair {
  compile(source, "gram", Backend::C)
    .expect("compilation should succeed")
    .expect("grammar should be non-empty")
}

fn nasm_pair(source: &str) -> GeneratedPair {
  compile(source, "gram", Backend::Nasm)
    .expect("compilation should succeed")
    .expect("grammar should be non-empty")
}

#[test]
fn minimal_production() {
  let pair = c_pair("a := 'x' .");
  assert_eq!(pair.header_name, "gram.h");
  assert_eq!(pair.source_name, "gram.c");
  assert!(pair.header.contains("#ifndef GRAM_H"));
  assert!(pair.header.contains("    NT_A,\n    NT_TERMINAL_X,\n"));
  assert!(pair.header.contains("extern const int gram_branches[1];"));
  assert!(pair
    .header
    .contains("extern const parsingnode_t gram_parsingTable[2];"));
  assert!(pair
    .source
    .contains("    // 0: production_a branches\n    1, \n"));
  assert!(pair
    .source
    .contains("    // 0: production_a\n    { NC_PRODUCTION, NT_A, TT_UNDEF, 0, 1, 0 },\n"));
  assert!(pair
    .source
    .contains("    // 1: string_terminal_1\n    { NC_TERMINAL, NT_TERMINAL_X, TT_STRING, \"x\", 0, -1 },\n"));
}

#[test]
fn alternation_builds_an_or_row_and_ordered_branches() {
  let pair = c_pair("a := 'x' | 'y' .");
  assert!(pair
    .source
    .contains("    // 0: production_a branches\n    1, \n"));
  assert!(pair
    .source
    .contains("    // 1: alternative_expr_1 branches\n    2, 3, \n"));
  assert!(pair
    .source
    .contains("    { NC_ALTERNATIVE, _NT_GENERIC, TT_UNDEF, 0, 2, 1 },\n"));
}

#[test]
fn duplicate_literals_share_one_row() {
  let pair = c_pair("a := 'x' . b := 'x' .");
  assert_eq!(pair.source.matches("TT_STRING").count(), 1);
  assert!(pair
    .header
    .contains("extern const parsingnode_t gram_parsingTable[3];"));
  // both productions reference row 1
  assert!(pair
    .source
    .contains("    // 0: production_a branches\n    1, \n"));
  assert!(pair
    .source
    .contains("    // 1: production_b branches\n    1, \n"));
}

#[test]
fn optional_repetitive_group() {
  let pair = c_pair("a := { 'x' } .");
  assert!(pair
    .source
    .contains("    { NC_OPTIONAL_REPETITIVE, _NT_GENERIC, TT_UNDEF, 0, 1, 1 },\n"));
  assert!(pair
    .source
    .contains("    // 1: optional_repetitive_expr_1 branches\n    2, \n"));
}

#[test]
fn bin_field_count_with_undeclared_name_is_not_an_error() {
  let pair = c_pair("a := BYTE:n 'x' .");
  assert!(pair.source.contains("-2 /* T_IDENTIFIER */, \n"));
  // BYTE|TBF_PARAM|TBF_WRITE = 0x32, the character '2'
  assert!(pair
    .source
    .contains("{ NC_TERMINAL, _NT_GENERIC, TT_BINARY, \"2\", 1, 3 },\n"));
  assert!(pair
    .source
    .contains("    // 0: production_a\n    { NC_PRODUCTION, NT_A, TT_UNDEF, 0, 1, 0 },\n"));
}

#[test]
fn unresolved_identifier_aborts_emission() {
  let err = compile("a := b .", "gram", Backend::C).unwrap_err();
  assert_eq!(err.to_string(), "? production 'b' not found");
  let err = compile("a := b .", "gram", Backend::Nasm).unwrap_err();
  assert_eq!(err.to_string(), "? production 'b' not found");
}

#[test]
fn compilation_is_deterministic() {
  let source = "a := 'x' | /[a-z]+/ . b := { a } BYTE:n .";
  assert_eq!(c_pair(source), c_pair(source));
  assert_eq!(nasm_pair(source), nasm_pair(source));
}

#[test]
fn empty_input_compiles_to_nothing() {
  assert!(compile("", "gram", Backend::C)
    .expect("empty input is valid")
    .is_none());
  assert!(compile(" \t\n-- comment only\n", "gram", Backend::Nasm)
    .expect("comment-only input is valid")
    .is_none());
}

#[test]
fn token_keyword_does_not_change_the_output() {
  let tagged = c_pair("TOKEN a := 'x' .");
  let plain = c_pair("a := 'x' .");
  assert_eq!(tagged.header, plain.header);
  assert_eq!(tagged.source, plain.source);
}

#[test]
fn operator_terminals_get_readable_tags() {
  let pair = c_pair("a := '=' | '==' | ':=' .");
  assert!(pair.header.contains("    NT_TERMINAL_EQ,\n"));
  assert!(pair.header.contains("    NT_TERMINAL_DEQ,\n"));
  assert!(pair.header.contains("    NT_TERMINAL_ASSIGN,\n"));
}

#[test]
fn colliding_terminal_tags_are_emitted_once() {
  let pair = c_pair("a := 'x' . b := /x/ .");
  assert_eq!(pair.header.matches("NT_TERMINAL_X,").count(), 1);
  // both rows still carry the shared tag
  assert_eq!(pair.source.matches(", NT_TERMINAL_X,").count(), 2);
}

#[test]
fn odd_hex_literals_are_zero_padded() {
  let pair = c_pair("a := $abc .");
  assert!(pair
    .source
    .contains("{ NC_TERMINAL, _NT_GENERIC, TT_BINARY, \"\\x0a\\xbc\", 0, -1 },\n"));
  let pair = nasm_pair("a := $abc .");
  assert!(pair.source.contains("db          TB_DATA,0x02,0x0a,0xbc\n"));
}

#[test]
fn regex_terminals_are_marked_tt_regex() {
  let pair = c_pair("a := /[a-z0-9-]+/ .");
  assert!(pair
    .source
    .contains("{ NC_TERMINAL, NT_TERMINAL_1, TT_REGEX, \"[a-z0-9-]+\", 0, -1 },\n"));
}

#[test]
fn quotes_and_backslashes_are_escaped_in_c_output() {
  let pair = c_pair("a := '\"' | /\\\\/ .");
  assert!(pair.source.contains("\"\\\"\""));
  assert!(pair.source.contains("\"\\\\\\\\\""));
}

#[test]
fn nasm_minimal_production() {
  let pair = nasm_pair("a := 'x' .");
  assert_eq!(pair.header_name, "gram.inc");
  assert_eq!(pair.source_name, "gram.nasm");
  assert!(pair
    .header
    .contains(&format!("{:<23} equ         {}\n", "NT_A", 1)));
  assert!(pair
    .header
    .contains(&format!("{:<23} equ         {}\n", "NT_TERMINAL_X", 2)));
  assert!(pair.header.contains("struc      parsingnode"));
  assert!(pair.source.contains("%include    \"gram.inc\""));
  assert!(pair.source.contains("global      gram_branches"));
  assert!(pair.source.contains("gram_branches:\n"));
  assert!(pair
    .source
    .contains("; 0: production_a branches\n                        dw          1 \n"));
  assert!(pair
    .source
    .contains(&format!("{:<23} db          'x',0\n", "prod_1_text")));
  assert!(pair.source.contains(
    "; 0: production_a\n                        db          NC_PRODUCTION, TT_UNDEF\n                        dw          NT_A, 1, 0\n                        dq          0\n"
  ));
  assert!(pair.source.contains(
    "; 1: string_terminal_1\n                        db          NC_TERMINAL, TT_STRING\n                        dw          NT_TERMINAL_X, 0, -1\n                        dq          prod_1_text\n"
  ));
}

#[test]
fn nasm_branch_lists_separate_values_with_commas() {
  let pair = nasm_pair("a := 'x' 'y' 'z' .");
  assert!(pair
    .source
    .contains("; 1: mandatory_expr_1 branches\n                        dw          2, 3, 4 \n"));
}

#[test]
fn nasm_bin_param_breaks_the_value_list() {
  let pair = nasm_pair("a := WORD*n .");
  assert!(pair.source.contains("dw          -2 ; T_IDENTIFIER\n"));
  assert!(pair
    .source
    .contains(&format!("{:<23} db          TB_WORD|TBF_PARAM\n", "prod_1_text")));
}

#[test]
fn nasm_quoting_falls_back_per_body() {
  let pair = nasm_pair("a := 'he said \"hi\"' | \"it's\" .");
  assert!(pair
    .source
    .contains(&format!("{:<23} db          'he said \"hi\"',0\n", "prod_2_text")));
  assert!(pair
    .source
    .contains(&format!("{:<23} db          \"it's\",0\n", "prod_3_text")));
}

#[test]
fn production_references_are_resolved_in_both_backends() {
  let source = "a := b 'x' . b := 'y' .";
  let c = c_pair(source);
  // a's sequence references production b (id 2) and terminal 'x'
  assert!(c
    .source
    .contains("    // 1: mandatory_expr_1 branches\n    3, 2, \n"));
  let nasm = nasm_pair(source);
  assert!(nasm
    .source
    .contains("; 1: mandatory_expr_1 branches\n                        dw          3, 2 \n"));
}

#[test]
fn dashed_names_map_to_underscored_symbols() {
  let pair = c_pair("my-rule := 'x' .");
  assert!(pair.header.contains("    NT_MY_RULE,\n"));
  assert!(pair.source.contains("// 0: production_my_rule\n"));
}
