//! Byte-at-a-time source reader with line tracking and pushback.
//!
//! The reader is the only component that sees raw input. It drops carriage
//! returns, swallows newlines while counting lines, strips `--` line
//! comments, and keeps a small ring of recently delivered bytes for
//! diagnostic echo. Downstream recognizers therefore only ever deal with
//! payload bytes.

const RECENT_LEN: usize = 64;

pub struct Reader<'a> {
  input: &'a [u8],
  pos: usize,
  pushback: Vec<u8>,
  current: Option<u8>,
  line: u32,
  column: u32,
  ring: [u8; RECENT_LEN],
  ring_pos: usize,
  ring_len: usize,
}

impl<'a> Reader<'a> {
  pub fn new(source: &'a str) -> Self {
    Self {
      input: source.as_bytes(),
      pos: 0,
      pushback: Vec::new(),
      current: None,
      line: 0,
      column: 0,
      ring: [0; RECENT_LEN],
      ring_pos: 0,
      ring_len: 0,
    }
  }

  /// The byte most recently delivered by `advance`, or `None` at EOF.
  pub fn current(&self) -> Option<u8> {
    self.current
  }

  pub fn line(&self) -> u32 {
    self.line
  }

  /// Count of delivered bytes on the current line.
  pub fn column(&self) -> u32 {
    self.column
  }

  /// Push a raw byte back; it will be re-delivered before further input.
  /// Pushed bytes pass through line/ring accounting again on re-delivery,
  /// exactly like first-time input.
  pub fn push_back(&mut self, byte: u8) {
    self.pushback.push(byte);
  }

  /// Deliver the next logical byte into `current`.
  ///
  /// Newlines and carriage returns are consumed here, as are `--` line
  /// comments, so callers never observe either.
  pub fn advance(&mut self) {
    let mut byte = self.read_raw();
    loop {
      let Some(b) = byte else {
        self.current = None;
        return;
      };
      if self.line == 0 {
        self.line = 1;
        self.column = 0;
      }
      match b {
        b'\r' => {
          byte = self.read_raw();
        }
        b'\n' => {
          self.line += 1;
          self.column = 0;
          byte = self.read_raw();
        }
        b'-' => {
          let lookahead = self.read_raw();
          if lookahead == Some(b'-') {
            // comment runs through the next newline
            let mut c = self.read_raw();
            while c.is_some() && c != Some(b'\n') {
              c = self.read_raw();
            }
            byte = c;
          } else {
            if let Some(la) = lookahead {
              self.push_back(la);
            }
            self.deliver(b'-');
            return;
          }
        }
        _ => {
          self.deliver(b);
          return;
        }
      }
    }
  }

  /// The last up-to-64 delivered bytes, oldest first, for error echo.
  pub fn recent(&self) -> String {
    let mut bytes = Vec::with_capacity(self.ring_len);
    if self.ring_len < RECENT_LEN {
      bytes.extend_from_slice(&self.ring[..self.ring_len]);
    } else {
      bytes.extend_from_slice(&self.ring[self.ring_pos..]);
      bytes.extend_from_slice(&self.ring[..self.ring_pos]);
    }
    String::from_utf8_lossy(&bytes).into_owned()
  }

  fn deliver(&mut self, byte: u8) {
    self.column += 1;
    self.ring[self.ring_pos] = byte;
    self.ring_pos = (self.ring_pos + 1) % RECENT_LEN;
    if self.ring_len < RECENT_LEN {
      self.ring_len += 1;
    }
    self.current = Some(byte);
  }

  fn read_raw(&mut self) -> Option<u8> {
    if let Some(byte) = self.pushback.pop() {
      return Some(byte);
    }
    let byte = self.input.get(self.pos).copied();
    if byte.is_some() {
      self.pos += 1;
    }
    byte
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn drain(source: &str) -> Vec<u8> {
    let mut reader = Reader::new(source);
    let mut out = Vec::new();
    reader.advance();
    while let Some(b) = reader.current() {
      out.push(b);
      reader.advance();
    }
    out
  }

  #[test]
  fn newlines_and_carriage_returns_are_invisible() {
    assert_eq!(drain("a\r\nb\nc"), b"abc");
  }

  #[test]
  fn line_comments_are_invisible() {
    assert_eq!(drain("a -- comment\nb"), b"a b");
    assert_eq!(drain("-- only a comment"), b"");
  }

  #[test]
  fn single_dash_is_delivered() {
    assert_eq!(drain("a-b"), b"a-b");
  }

  #[test]
  fn line_counting_tracks_delivered_bytes() {
    let mut reader = Reader::new("ab\ncd");
    reader.advance();
    reader.advance();
    assert_eq!((reader.line(), reader.column()), (1, 2));
    reader.advance();
    assert_eq!((reader.line(), reader.column()), (2, 1));
  }

  #[test]
  fn pushback_is_lifo() {
    let mut reader = Reader::new("z");
    reader.push_back(b'b');
    reader.push_back(b'a');
    reader.advance();
    assert_eq!(reader.current(), Some(b'a'));
    reader.advance();
    assert_eq!(reader.current(), Some(b'b'));
    reader.advance();
    assert_eq!(reader.current(), Some(b'z'));
  }

  #[test]
  fn recent_echo_keeps_the_last_64_bytes() {
    let source: String = ('a'..='z').cycle().take(100).collect();
    let mut reader = Reader::new(&source);
    reader.advance();
    while reader.current().is_some() {
      reader.advance();
    }
    let recent = reader.recent();
    assert_eq!(recent.len(), 64);
    assert!(source.ends_with(&recent));
  }

  #[test]
  fn empty_input_is_eof_immediately() {
    let mut reader = Reader::new("");
    reader.advance();
    assert_eq!(reader.current(), None);
    assert_eq!(reader.line(), 0);
  }
}
