use parsekit_runtime::{Error, PResult};

use crate::ast::Ast;

/// The declared input alphabet: 7-bit ASCII. Class inversion subtracts
/// the listed ranges from this span.
const MAX_BYTE: u8 = 127;

/// Parses `text` into a regex AST.
///
/// Grammar (operator precedence low to high):
/// `Sequence <- Suffix*`; `Suffix <- OneOf ('*'|'+'|'?')*`;
/// `OneOf <- '(' Sequence ('|' Sequence)* ')' | Symbol`;
/// `Symbol <- '[' ... ']' | '\' escape | literal byte`.
pub fn parse(text: &str) -> PResult<Ast> {
  let mut parser = Parser { bytes: text.as_bytes(), pos: 0 };
  let ast = parser.parse_sequence()?;
  if parser.pos != parser.bytes.len() {
    return Err(parser.unexpected());
  }
  Ok(ast)
}

struct Parser<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> Parser<'a> {
  fn peek(&self) -> Option<u8> {
    self.bytes.get(self.pos).copied()
  }

  fn peek_at(&self, offset: usize) -> Option<u8> {
    self.bytes.get(self.pos + offset).copied()
  }

  fn advance(&mut self) -> Option<u8> {
    let b = self.peek();
    if b.is_some() {
      self.pos += 1;
    }
    b
  }

  fn unexpected(&self) -> Error {
    let ch = self.peek().map(|b| b as char).unwrap_or('?');
    Error::RegexSyntax { pos: self.pos, message: format!("unexpected character '{ch}'") }
  }

  fn parse_sequence(&mut self) -> PResult<Ast> {
    let mut items = Vec::new();
    while let Some(b) = self.peek() {
      if b == b')' || b == b'|' {
        break;
      }
      items.push(self.parse_suffix()?);
    }
    Ok(match items.len() {
      1 => items.pop().unwrap(),
      _ => Ast::Sequence(items),
    })
  }

  fn parse_suffix(&mut self) -> PResult<Ast> {
    let mut node = self.parse_one_of()?;
    loop {
      match self.peek() {
        Some(b'*') => {
          self.advance();
          node = Ast::ZeroOrMore(Box::new(node));
        }
        Some(b'+') => {
          self.advance();
          node = Ast::OneOrMore(Box::new(node));
        }
        Some(b'?') => {
          self.advance();
          node = Ast::ZeroOrOne(Box::new(node));
        }
        _ => break,
      }
    }
    Ok(node)
  }

  fn parse_one_of(&mut self) -> PResult<Ast> {
    if self.peek() == Some(b'(') {
      self.advance();
      let mut alts = vec![self.parse_sequence()?];
      while self.peek() == Some(b'|') {
        self.advance();
        alts.push(self.parse_sequence()?);
      }
      match self.advance() {
        Some(b')') => {}
        _ => {
          return Err(Error::RegexSyntax {
            pos: self.pos,
            message: "unterminated group, expected ')'".into(),
          })
        }
      }
      Ok(if alts.len() == 1 { alts.pop().unwrap() } else { Ast::Alt(alts) })
    } else {
      self.parse_symbol()
    }
  }

  fn parse_symbol(&mut self) -> PResult<Ast> {
    match self.peek() {
      None => Err(Error::RegexSyntax { pos: self.pos, message: "expected a symbol".into() }),
      Some(b')') | Some(b'|') | Some(b'*') | Some(b'+') | Some(b'?') => Err(self.unexpected()),
      Some(b'[') => self.parse_char_class(),
      Some(b'\\') => self.parse_escape(),
      Some(b) => {
        self.advance();
        Ok(Ast::Symbol(b))
      }
    }
  }

  fn parse_char_class(&mut self) -> PResult<Ast> {
    self.advance(); // consume '['
    let invert = if self.peek() == Some(b'^') {
      self.advance();
      true
    } else {
      false
    };

    let mut ranges = Vec::new();
    loop {
      match self.peek() {
        None => return Err(Error::UnterminatedClass { pos: self.pos }),
        Some(b']') => {
          self.advance();
          break;
        }
        Some(_) => {
          let lo = self.read_class_member()?;
          let is_range =
            self.peek() == Some(b'-') && self.peek_at(1).is_some() && self.peek_at(1) != Some(b']');
          if is_range {
            self.advance(); // consume '-'
            let hi = self.read_class_member()?;
            ranges.push((lo, hi));
          } else {
            ranges.push((lo, lo));
          }
        }
      }
    }

    let ranges = if invert { invert_ranges(&ranges) } else { merge_ranges(&ranges) };
    Ok(Ast::CharClass(ranges))
  }

  fn read_class_member(&mut self) -> PResult<u8> {
    match self.advance() {
      None => Err(Error::UnterminatedClass { pos: self.pos }),
      Some(b'\\') => self.read_escaped_byte(),
      Some(b) => Ok(b),
    }
  }

  fn read_escaped_byte(&mut self) -> PResult<u8> {
    match self.advance() {
      None => Err(Error::IncompleteEscape { pos: self.pos }),
      Some(b't') => Ok(b'\t'),
      Some(b'n') => Ok(b'\n'),
      Some(b'r') => Ok(b'\r'),
      Some(b) => Ok(b),
    }
  }

  fn parse_escape(&mut self) -> PResult<Ast> {
    self.advance(); // consume '\'
    match self.advance() {
      None => Err(Error::IncompleteEscape { pos: self.pos }),
      Some(b's') => Ok(Ast::CharClass(whitespace_ranges())),
      Some(b'S') => Ok(Ast::CharClass(invert_ranges(&whitespace_ranges()))),
      Some(b'w') => Ok(Ast::CharClass(word_ranges())),
      Some(b'W') => Ok(Ast::CharClass(invert_ranges(&word_ranges()))),
      Some(b't') => Ok(Ast::Symbol(b'\t')),
      Some(b'n') => Ok(Ast::Symbol(b'\n')),
      Some(b'r') => Ok(Ast::Symbol(b'\r')),
      Some(b) => Ok(Ast::Symbol(b)),
    }
  }
}

fn whitespace_ranges() -> Vec<(u8, u8)> {
  vec![(0x09, 0x0d), (b' ', b' ')]
}

fn word_ranges() -> Vec<(u8, u8)> {
  vec![(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')]
}

fn merge_ranges(ranges: &[(u8, u8)]) -> Vec<(u8, u8)> {
  if ranges.is_empty() {
    return Vec::new();
  }
  let mut sorted = ranges.to_vec();
  sorted.sort_by_key(|r| r.0);
  let mut merged = vec![sorted[0]];
  for &(lo, hi) in &sorted[1..] {
    let last = merged.last_mut().unwrap();
    if (lo as u16) <= (last.1 as u16) + 1 {
      last.1 = last.1.max(hi);
    } else {
      merged.push((lo, hi));
    }
  }
  merged
}

/// Subtracts `ranges` from `[0, MAX_BYTE]`, used both for `[^...]` classes
/// and for `\S`/`\W`.
fn invert_ranges(ranges: &[(u8, u8)]) -> Vec<(u8, u8)> {
  let merged = merge_ranges(ranges);
  let mut result = Vec::new();
  let mut next: u16 = 0;
  for (lo, hi) in merged {
    if (lo as u16) > next {
      result.push((next as u8, lo - 1));
    }
    next = (hi as u16) + 1;
  }
  if next <= MAX_BYTE as u16 {
    result.push((next as u8, MAX_BYTE));
  }
  result
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_sequence_and_alternation() {
    let ast = parse("(if|[a-z]+)").unwrap();
    assert_eq!(
      ast,
      Ast::Alt(vec![
        Ast::Sequence(vec![Ast::Symbol(b'i'), Ast::Symbol(b'f')]),
        Ast::OneOrMore(Box::new(Ast::CharClass(vec![(b'a', b'z')]))),
      ])
    );
  }

  #[test]
  fn quantifiers_bind_tighter_than_sequence() {
    let ast = parse("ab*c").unwrap();
    assert_eq!(
      ast,
      Ast::Sequence(vec![
        Ast::Symbol(b'a'),
        Ast::ZeroOrMore(Box::new(Ast::Symbol(b'b'))),
        Ast::Symbol(b'c'),
      ])
    );
  }

  #[test]
  fn inverted_class_is_full_complement() {
    let ast = parse("[^a-z]").unwrap();
    let Ast::CharClass(ranges) = ast else { panic!("expected char class") };
    assert_eq!(ranges, vec![(0, b'a' - 1), (b'z' + 1, MAX_BYTE)]);
  }

  #[test]
  fn unterminated_group_is_an_error() {
    let err = parse("(ab").unwrap_err();
    assert!(matches!(err, Error::RegexSyntax { .. }));
  }

  #[test]
  fn unterminated_class_is_an_error() {
    let err = parse("[abc").unwrap_err();
    assert!(matches!(err, Error::UnterminatedClass { .. }));
  }

  #[test]
  fn dangling_quantifier_is_unexpected_character() {
    let err = parse("*ab").unwrap_err();
    assert!(matches!(err, Error::RegexSyntax { .. }));
  }

  #[test]
  fn trailing_incomplete_escape_is_an_error() {
    let err = parse("ab\\").unwrap_err();
    assert!(matches!(err, Error::IncompleteEscape { .. }));
  }
}
