use parsekit_runtime::PResult;

use crate::ast::Ast;
use crate::dfa::Dfa;
use crate::encoding::Encoding;
use crate::nfa::Nfa;
use crate::parser::parse;

/// Runs a set of patterns over an input byte slice as a single combined
/// DFA, reporting the longest match and which pattern won it.
#[derive(Debug, Clone)]
pub struct Matcher {
  encoding: Encoding,
  dfa: Dfa,
}

/// The result of scanning from a given position: how many bytes the
/// longest match consumed, and the smallest-index pattern that matched
/// that length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
  pub length: usize,
  pub pattern: usize,
}

impl Matcher {
  /// Parses `patterns` as regexes and builds their combined matcher.
  pub fn new(patterns: &[&str]) -> PResult<Self> {
    let asts: Vec<Ast> = patterns.iter().map(|p| parse(p)).collect::<PResult<_>>()?;
    Ok(Self::from_asts(&asts))
  }

  pub fn from_asts(patterns: &[Ast]) -> Self {
    let mut ranges = Vec::new();
    for pattern in patterns {
      pattern.collect_ranges(&mut ranges);
    }
    let encoding = Encoding::build(&ranges);
    let nfa = Nfa::build(patterns, &encoding);
    let dfa = Dfa::build(&nfa, &encoding);
    Matcher { encoding, dfa }
  }

  /// Scans `input` starting at byte offset `start`, returning the longest
  /// match found there, or `None` if no pattern matches any nonempty
  /// prefix.
  pub fn matches(&self, input: &[u8], start: usize) -> Option<Match> {
    let mut state = self.dfa.start();
    // A pattern that accepts the empty string (e.g. "a?") must win a
    // zero-length match here, not only once some byte extends it.
    let mut best: Option<Match> = self.dfa.accept(state).map(|pattern| Match { length: 0, pattern });

    for (offset, &byte) in input[start..].iter().enumerate() {
      let code_point = self.encoding.code_point(byte);
      state = self.dfa.transition(state, code_point);
      if state == self.dfa.reject() {
        break;
      }
      if let Some(pattern) = self.dfa.accept(state) {
        best = Some(Match { length: offset + 1, pattern });
      }
    }

    best
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn matches_the_longest_prefix() {
    let matcher = Matcher::new(&["[a-d]*a"]).unwrap();
    let m = matcher.matches(b"abcda", 0).unwrap();
    assert_eq!(m, Match { length: 5, pattern: 0 });
  }

  #[test]
  fn no_match_returns_none() {
    let matcher = Matcher::new(&["[a-d]*a"]).unwrap();
    assert_eq!(matcher.matches(b"xyz", 0), None);
  }

  #[test]
  fn ties_break_towards_the_first_declared_pattern() {
    // "if" and "[a-z]+" both match "if" fully; the keyword must win.
    let matcher = Matcher::new(&["if", "[a-z]+"]).unwrap();
    let m = matcher.matches(b"if", 0).unwrap();
    assert_eq!(m, Match { length: 2, pattern: 0 });

    let m = matcher.matches(b"ifx", 0).unwrap();
    assert_eq!(m, Match { length: 3, pattern: 1 });
  }

  #[test]
  fn scans_from_an_arbitrary_offset() {
    let matcher = Matcher::new(&["[a-z]+"]).unwrap();
    let m = matcher.matches(b"12abc", 2).unwrap();
    assert_eq!(m, Match { length: 3, pattern: 0 });
  }

  #[test]
  fn a_pattern_that_accepts_empty_still_matches_when_nothing_extends_it() {
    let matcher = Matcher::new(&["a?"]).unwrap();
    let m = matcher.matches(b"b", 0).unwrap();
    assert_eq!(m, Match { length: 0, pattern: 0 });
  }

  #[test]
  fn a_pattern_that_accepts_empty_still_prefers_the_longer_extension() {
    let matcher = Matcher::new(&["a*"]).unwrap();
    let m = matcher.matches(b"aab", 0).unwrap();
    assert_eq!(m, Match { length: 2, pattern: 0 });
  }
}
