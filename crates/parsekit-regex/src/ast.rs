use std::fmt;

/// The regex syntax tree. Immutable after construction: every node owns
/// its children outright, and the root is owned by whoever called
/// [`crate::parser::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
  Symbol(u8),
  /// A list of disjoint-or-not inclusive byte ranges. Class inversion
  /// (a leading `^`) is resolved during parsing, so by the time an AST
  /// node exists its ranges are already the ones that should match.
  CharClass(Vec<(u8, u8)>),
  Sequence(Vec<Ast>),
  Alt(Vec<Ast>),
  ZeroOrOne(Box<Ast>),
  ZeroOrMore(Box<Ast>),
  OneOrMore(Box<Ast>),
}

impl Ast {
  /// Collects every inclusive byte range this node's leaves can match,
  /// the raw material the [`crate::encoding::Encoding`] is built from.
  pub fn collect_ranges(&self, out: &mut Vec<(u8, u8)>) {
    match self {
      Ast::Symbol(b) => out.push((*b, *b)),
      Ast::CharClass(ranges) => out.extend_from_slice(ranges),
      Ast::Sequence(children) | Ast::Alt(children) => {
        for child in children {
          child.collect_ranges(out);
        }
      }
      Ast::ZeroOrOne(child) | Ast::ZeroOrMore(child) | Ast::OneOrMore(child) => {
        child.collect_ranges(out)
      }
    }
  }

  /// True for nodes that print as a single lexical unit and so don't need
  /// wrapping in `( ... )` before a quantifier is appended.
  fn is_atom(&self) -> bool {
    matches!(self, Ast::Symbol(_) | Ast::CharClass(_))
  }

  fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_atom() {
      write!(f, "{self}")
    } else {
      write!(f, "({self})")
    }
  }
}

const METACHARS: &[u8] = b"\\()|*+?[]^-";

fn write_byte(f: &mut fmt::Formatter<'_>, b: u8) -> fmt::Result {
  match b {
    b'\t' => write!(f, "\\t"),
    b'\n' => write!(f, "\\n"),
    b'\r' => write!(f, "\\r"),
    b if METACHARS.contains(&b) => write!(f, "\\{}", b as char),
    b => write!(f, "{}", b as char),
  }
}

impl fmt::Display for Ast {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Ast::Symbol(b) => write_byte(f, *b),
      Ast::CharClass(ranges) => {
        write!(f, "[")?;
        for (lo, hi) in ranges {
          write_byte(f, *lo)?;
          if hi != lo {
            write!(f, "-")?;
            write_byte(f, *hi)?;
          }
        }
        write!(f, "]")
      }
      Ast::Sequence(children) => {
        for child in children {
          child.fmt_operand_in_sequence(f)?;
        }
        Ok(())
      }
      Ast::Alt(children) => {
        write!(f, "(")?;
        for (i, child) in children.iter().enumerate() {
          if i > 0 {
            write!(f, "|")?;
          }
          write!(f, "{child}")?;
        }
        write!(f, ")")
      }
      Ast::ZeroOrOne(child) => {
        child.fmt_operand(f)?;
        write!(f, "?")
      }
      Ast::ZeroOrMore(child) => {
        child.fmt_operand(f)?;
        write!(f, "*")
      }
      Ast::OneOrMore(child) => {
        child.fmt_operand(f)?;
        write!(f, "+")
      }
    }
  }
}

impl Ast {
  // `Alt` already self-delimits with its own `( ... )`, and every other
  // node either is an atom or carries its own trailing quantifier, so a
  // sequence can just print each child in turn.
  fn fmt_operand_in_sequence(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{self}")
  }
}
