//! NASM back-end: an include file with `equ` constants and the
//! `parsingnode` struc, and a source file declaring the branch array,
//! terminal text objects, and parsing table in a read-only data section.

use crate::table::{BranchSlot, ParsingTable, Payload};

use super::GeneratedPair;

pub fn emit(table: &ParsingTable, stem: &str) -> GeneratedPair {
  let (header_name, source_name) = super::Backend::Nasm.file_names(stem);
  GeneratedPair {
    header: emit_header(table),
    source: emit_source(table, stem, &header_name),
    header_name,
    source_name,
  }
}

const BANNER: &str = "\
; code auto-generated by ebnfc; do not modify!
; (code might get overwritten during next ebnfc invocation)

";

const MODE_LINES: &str = "\
                        cpu         x64
                        bits        64

";

const FIXED_CONSTANTS: &str = "\
NC_TERMINAL             equ         0
NC_PRODUCTION           equ         1
NC_MANDATORY            equ         2
NC_ALTERNATIVE          equ         3
NC_OPTIONAL             equ         4
NC_OPTIONAL_REPETITIVE  equ         5

TT_UNDEF                equ         0
TT_STRING               equ         1
TT_REGEX                equ         2
TT_BINARY               equ         3

TB_UNDEF                equ         0x00
TB_DATA                 equ         0x01
TB_BYTE                 equ         0x02
TB_WORD                 equ         0x03
TB_DWORD                equ         0x04
TB_QWORD                equ         0x05
TBF_PARAM               equ         0x10
TBF_WRITE               equ         0x20

_NT_GENERIC             equ         0
";

const NODE_STRUC: &str = "
                        struc      parsingnode
                           pn_nodeClass:       resb    1
                           pn_termType:        resb    1
                           pn_nodeType:        resw    1
                           pn_numBranches:     resw    1
                           pn_branches:        resw    1
                           pn_text:            resq    1
                        endstruc

";

const INDENT: &str = "                        ";

fn emit_header(table: &ParsingTable) -> String {
  let mut out = String::new();
  out.push_str(BANNER);
  out.push_str(MODE_LINES);
  out.push_str(FIXED_CONSTANTS);
  for (ix, tag) in table.tags.iter().enumerate() {
    out.push_str(&format!("{tag:<23} equ         {}\n", ix + 1));
  }
  out.push_str(NODE_STRUC);
  out
}

fn emit_source(table: &ParsingTable, stem: &str, header_name: &str) -> String {
  let mut out = String::new();
  out.push_str(BANNER);
  out.push_str(MODE_LINES);
  out.push_str(&format!("{INDENT}%include    \"{header_name}\"\n\n"));
  out.push_str(&format!("{INDENT}section     .rodata\n\n"));
  out.push_str(&format!(
    "{INDENT}global      {stem}_branches\n{INDENT}global      {stem}_parsingTable\n\n"
  ));
  out.push_str(&format!("{stem}_branches:\n"));
  for segment in &table.segments {
    out.push_str(&format!(
      "{INDENT}; {}: {} branches\n{INDENT}dw          ",
      segment.branches_ix, segment.owner
    ));
    for (ix, slot) in segment.slots.iter().enumerate() {
      let last = ix == segment.slots.len() - 1;
      match slot {
        BranchSlot::Node(id) => {
          out.push_str(&format!("{id}{} ", if last { "" } else { "," }));
        }
        BranchSlot::NotExported(label) => {
          out.push_str(&format!("-1 ; {label}"));
          if !last {
            out.push_str(&format!("\n{INDENT}dw          "));
          }
        }
        BranchSlot::BinParam(label) => {
          out.push_str(&format!("-2 ; {label}"));
          if !last {
            out.push_str(&format!("\n{INDENT}dw          "));
          }
        }
      }
    }
    out.push('\n');
  }
  out.push_str("\n\n");
  for row in &table.rows {
    if let Some(text) = text_object(&row.payload) {
      let label = format!("prod_{}_text", row.id);
      out.push_str(&format!("{label:<23} db          {text}\n"));
    }
  }
  out.push_str("\n\n");
  out.push_str(&format!("{INDENT}align       8,db 0\n\n"));
  out.push_str(&format!("{stem}_parsingTable:\n"));
  for row in &table.rows {
    out.push_str(&format!("{INDENT}; {}: {}\n", row.id, row.export_ident));
    out.push_str(&format!(
      "{INDENT}db          {}, {}\n",
      row.class.name(),
      row.term_type.name()
    ));
    out.push_str(&format!(
      "{INDENT}dw          {}, {}, {}\n",
      row.node_type, row.num_branches, row.branches_ix
    ));
    if row.payload.is_empty() {
      out.push_str(&format!("{INDENT}dq          0\n"));
    } else {
      out.push_str(&format!("{INDENT}dq          prod_{}_text\n", row.id));
    }
  }
  out.push_str("\n\n");
  out
}

/// The `db` operand for a row's terminal text object, or `None` for rows
/// without one. String and regex bodies are NUL-terminated; binary
/// payloads are not.
fn text_object(payload: &Payload) -> Option<String> {
  match payload {
    Payload::Empty => None,
    Payload::Text(bytes) => Some(format!("{},0", quoted(bytes))),
    Payload::Bytes(bytes) => {
      let mut parts = vec![format!("TB_DATA,0x{:02x}", bytes.len())];
      parts.extend(bytes.iter().map(|b| format!("0x{b:02x}")));
      Some(parts.join(","))
    }
    Payload::Field {
      width,
      param,
      write,
    } => {
      let mut text = width.symbol().to_string();
      if *param {
        text.push_str("|TBF_PARAM");
      }
      if *write {
        text.push_str("|TBF_WRITE");
      }
      Some(text)
    }
  }
}

/// Quote a byte string for NASM: single quotes when the body contains
/// none, double quotes otherwise, and a comma-separated hex run when
/// neither quoting is safe or a byte falls outside printable ASCII.
fn quoted(bytes: &[u8]) -> String {
  let printable = bytes.iter().all(|&b| (0x20..0x7f).contains(&b));
  if printable && !bytes.contains(&b'\'') {
    return format!("'{}'", String::from_utf8_lossy(bytes));
  }
  if printable && !bytes.contains(&b'"') {
    return format!("\"{}\"", String::from_utf8_lossy(bytes));
  }
  bytes
    .iter()
    .map(|b| format!("0x{b:02x}"))
    .collect::<Vec<_>>()
    .join(",")
}
