/// Guards canonical automaton construction against runaway state-graph
/// growth on a pathological grammar. Built with `with_*` methods in the
/// teacher's `ParserConfig` style rather than a long constructor.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildConfig {
  max_states: Option<usize>,
}

impl BuildConfig {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fails construction with `Error::TooManyStates` once the canonical
  /// automaton would grow past `max_states`. `None` (the default) never
  /// caps it.
  pub fn with_max_states(mut self, max_states: usize) -> Self {
    self.max_states = Some(max_states);
    self
  }

  pub fn max_states(&self) -> Option<usize> {
    self.max_states
  }
}

/// Construction-time diagnostics for a built table, reported alongside
/// it rather than folded into the parse result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
  pub num_states: usize,
  /// Always 0 for a table that built successfully: every builder in
  /// this crate fails on the first conflict it finds rather than
  /// accumulating past it, so a returned table can never have seen one.
  pub num_conflicts_seen_before_failure: usize,
}
