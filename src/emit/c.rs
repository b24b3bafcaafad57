//! C back-end: a header with the type and enumeration definitions and an
//! implementation file with the branch array and parsing table
//! initializers.

use crate::table::{BranchSlot, ParsingTable, Payload};

use super::GeneratedPair;

pub fn emit(table: &ParsingTable, stem: &str) -> GeneratedPair {
  let (header_name, source_name) = super::Backend::C.file_names(stem);
  GeneratedPair {
    header: emit_header(table, stem, &header_name),
    source: emit_source(table, stem, &header_name),
    header_name,
    source_name,
  }
}

const BANNER: &str = "\
// code auto-generated by ebnfc; do not modify!
// (code might get overwritten during next ebnfc invocation)

";

const TYPE_DEFINITIONS: &str = "\
#include <stddef.h>

typedef enum _nodeclass_t {
    NC_TERMINAL,
    NC_PRODUCTION,
    NC_MANDATORY,
    NC_ALTERNATIVE,
    NC_OPTIONAL,
    NC_OPTIONAL_REPETITIVE,
} nodeclass_t;

typedef enum _terminaltype_t {
    TT_UNDEF,
    TT_STRING,
    TT_REGEX,
    TT_BINARY,
} terminaltype_t;

enum {
    TB_UNDEF  = 0x00,
    TB_DATA   = 0x01,
    TB_BYTE   = 0x02,
    TB_WORD   = 0x03,
    TB_DWORD  = 0x04,
    TB_QWORD  = 0x05,
    TBF_PARAM = 0x10,
    TBF_WRITE = 0x20,
};

typedef enum _nodetype_t {
    _NT_GENERIC,
";

const NODE_STRUCT: &str = "\
} nodetype_t;

typedef struct _parsingnode_t {
    nodeclass_t        nodeClass;
    nodetype_t         nodeType;
    terminaltype_t     termType;
    const char*        text;
    size_t             numBranches;
    int                branches;
} parsingnode_t;

";

fn emit_header(table: &ParsingTable, stem: &str, header_name: &str) -> String {
  let guard = guard_symbol(header_name);
  let mut out = String::new();
  out.push_str(BANNER);
  out.push_str(&format!("#ifndef {guard}\n#define {guard} 1\n\n"));
  out.push_str(TYPE_DEFINITIONS);
  for tag in &table.tags {
    out.push_str(&format!("    {tag},\n"));
  }
  out.push_str(NODE_STRUCT);
  out.push_str(&format!(
    "extern const int {stem}_branches[{}];\n",
    table.branch_count
  ));
  out.push_str(&format!(
    "extern const parsingnode_t {stem}_parsingTable[{}];\n\n",
    table.rows.len()
  ));
  out.push_str("#endif\n");
  out
}

fn emit_source(table: &ParsingTable, stem: &str, header_name: &str) -> String {
  let mut out = String::new();
  out.push_str(BANNER);
  out.push_str(&format!("#include \"{header_name}\"\n\n"));
  out.push_str("// branches\n\n");
  out.push_str(&format!(
    "const int {stem}_branches[{}] = {{\n",
    table.branch_count
  ));
  for segment in &table.segments {
    out.push_str(&format!(
      "    // {}: {} branches\n    ",
      segment.branches_ix, segment.owner
    ));
    for slot in &segment.slots {
      match slot {
        BranchSlot::Node(id) => out.push_str(&format!("{id}, ")),
        BranchSlot::NotExported(label) => out.push_str(&format!("-1 /* {label} */, ")),
        BranchSlot::BinParam(label) => out.push_str(&format!("-2 /* {label} */, ")),
      }
    }
    out.push('\n');
  }
  out.push_str("};\n\n");
  out.push_str(&format!(
    "const parsingnode_t {stem}_parsingTable[{}] = {{\n",
    table.rows.len()
  ));
  for row in &table.rows {
    out.push_str(&format!("    // {}: {}\n", row.id, row.export_ident));
    out.push_str(&format!(
      "    {{ {}, {}, {}, {}, {}, {} }},\n",
      row.class.name(),
      row.node_type,
      row.term_type.name(),
      text_field(&row.payload),
      row.num_branches,
      row.branches_ix
    ));
  }
  out.push_str("};\n\n");
  out
}

/// The `text` initializer: a quoted escaped string, or the null sentinel.
fn text_field(payload: &Payload) -> String {
  match payload {
    Payload::Empty => "0".to_string(),
    Payload::Text(bytes) | Payload::Bytes(bytes) => format!("\"{}\"", escape(bytes)),
    Payload::Field {
      width,
      param,
      write,
    } => {
      let byte = Payload::field_byte(*width, *param, *write);
      format!("\"{}\"", escape(&[byte]))
    }
  }
}

/// C string escaping: quotes and backslashes get a backslash, bytes with
/// both 0x20 and 0x40 clear (controls) and bytes above 0x7f become `\xHH`.
fn escape(bytes: &[u8]) -> String {
  let mut out = String::new();
  for &byte in bytes {
    match byte {
      b'"' => out.push_str("\\\""),
      b'\\' => out.push_str("\\\\"),
      _ if byte & 0x60 != 0 && byte < 0x80 => out.push(byte as char),
      _ => out.push_str(&format!("\\x{byte:02x}")),
    }
  }
  out
}

/// Include-guard symbol: lowercase letters are uppercased; `.`, `/`, `\`
/// and `:` become underscores. Other bytes pass through.
fn guard_symbol(header_name: &str) -> String {
  header_name
    .chars()
    .map(|c| match c {
      '.' | '/' | '\\' | ':' => '_',
      _ => c.to_ascii_uppercase(),
    })
    .collect()
}
