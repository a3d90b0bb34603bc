use std::fmt;

/// Where an [`Error::LrConflict`] arose: shifting past a pending reduction,
/// or two reductions competing for the same state/lookahead cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LrConflictKind {
  ShiftReduce,
  ReduceReduce,
}

impl fmt::Display for LrConflictKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ShiftReduce => write!(f, "shift/reduce"),
      Self::ReduceReduce => write!(f, "reduce/reduce"),
    }
  }
}

/// The single error type shared across the workspace. Construction-time
/// faults only: a failed parse (no applicable table entry) is represented
/// as `None`/`Vec::new()` by the drivers, not as an `Error` variant, since
/// it's an expected outcome of attempting to parse invalid input.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("unexpected character at position {pos}: {message}")]
  RegexSyntax { pos: usize, message: String },

  #[error("unterminated character class at position {pos}")]
  UnterminatedClass { pos: usize },

  #[error("incomplete escape sequence at position {pos}")]
  IncompleteEscape { pos: usize },

  #[error("LL(1) conflict in rule {rule} on symbol {symbol}: rhs {rhs1} and {rhs2} both apply")]
  Ll1Conflict { rule: usize, symbol: usize, rhs1: usize, rhs2: usize },

  #[error("LR {kind} conflict on symbol {symbol} between item {item1} and {item2}")]
  LrConflict { kind: LrConflictKind, symbol: usize, item1: usize, item2: usize },

  #[error("state-graph construction exceeded the configured cap of {limit} state(s)")]
  TooManyStates { limit: usize },
}

pub type PResult<T> = Result<T, Error>;
