use std::collections::BTreeSet;

use parsekit_grammar::Grammar;
use parsekit_lr::{augment, compute_states, BuildConfig, Metrics, Reduction};
use parsekit_runtime::{PResult, Table};

/// One action available in a GLR table cell. Unlike the single-entry
/// [`parsekit_lr::LrTable`], a cell may hold more than one action at
/// once: that ambiguity is exactly what the GLR driver forks a new
/// stack over instead of rejecting at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Shift(usize),
  Reduce(usize),
}

/// A multi-entry LR table. Reduce lookahead is plain FOLLOW (the same
/// choice the original's `GLR` always makes, never lifting per-state
/// lookahead the way LALR does), since the driver already tolerates
/// whatever extra ambiguity that coarser lookahead lets through. Built,
/// like [`parsekit_lr::LrTable`], over an internally augmented
/// `S' : S $end` grammar, so acceptance only ever fires once the whole
/// input has genuinely reduced back to the original start symbol.
#[derive(Debug, Clone)]
pub struct GlrTable {
  actions: Table<Vec<Action>>,
  reductions: Vec<Reduction>,
  accept_states: BTreeSet<usize>,
  num_terminals: usize,
  end_terminal: usize,
  metrics: Metrics,
}

impl GlrTable {
  pub fn build(grammar: &Grammar, config: &BuildConfig) -> PResult<Self> {
    let augmented = augment(grammar);
    let grammar = &augmented.grammar;
    let states = compute_states(grammar, config)?;
    let sets = grammar.compute_sets();
    let num_terminals = grammar.terminals().len();
    let num_cols = num_terminals + grammar.rules().len();

    let mut actions: Table<Vec<Action>> = Table::new(states.len(), num_cols, Vec::new());
    let mut reductions: Vec<Reduction> = Vec::new();
    let mut accept_states = BTreeSet::new();

    for (i, state) in states.iter().enumerate() {
      for item in &state.items {
        let rhs = &grammar.rules()[item.rule].rhs[item.rhs];
        if item.pos != rhs.len() {
          continue;
        }

        for &terminal in &sets.follow[item.rule] {
          let reduction = Reduction { rule: item.rule, rhs: item.rhs };
          let index = reductions.iter().position(|r| *r == reduction).unwrap_or_else(|| {
            reductions.push(reduction);
            reductions.len() - 1
          });
          actions.at_mut(i, terminal).push(Action::Reduce(index));
        }

        // Only the state completing the augmented `S' : S $end`
        // production accepts; a completed item of the original start
        // rule can also appear wherever some sub-derivation of it
        // finishes early, which must not end the parse.
        if item.rule == grammar.start_rule() {
          accept_states.insert(i);
        }
      }

      for (&symbol, &target) in &state.transitions {
        actions.at_mut(i, symbol).push(Action::Shift(target));
      }
    }

    log::debug!(
      "GLR table built: {} state(s), {} distinct reduction(s)",
      states.len(),
      reductions.len()
    );
    let metrics = Metrics { num_states: states.len(), num_conflicts_seen_before_failure: 0 };
    Ok(GlrTable { actions, reductions, accept_states, num_terminals, end_terminal: augmented.end_terminal, metrics })
  }

  pub fn actions(&self, state: usize, symbol: usize) -> &[Action] {
    self.actions.at(state, symbol)
  }

  pub fn reduction(&self, index: usize) -> Reduction {
    self.reductions[index]
  }

  pub fn is_accepting(&self, state: usize) -> bool {
    self.accept_states.contains(&state)
  }

  pub fn num_terminals(&self) -> usize {
    self.num_terminals
  }

  /// The reserved column standing for true end-of-input; see
  /// [`parsekit_lr::LrTable::end_terminal`].
  pub fn end_terminal(&self) -> usize {
    self.end_terminal
  }

  pub fn metrics(&self) -> Metrics {
    self.metrics
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use parsekit_grammar::{Rule, Symbol};

  #[test]
  fn dangling_else_grammar_keeps_both_actions_in_one_cell() {
    // S : i S e S | i S | a -- the same dangling-else shape that forces
    // the single-entry SLR builder to fail; GLR keeps both the shift
    // (extend the outer if) and the reduce (close the inner one).
    let grammar = Grammar::new(
      vec!["i".into(), "e".into(), "a".into()],
      vec![Rule {
        lhs: "S".into(),
        rhs: vec![
          vec![Symbol::Terminal(0), Symbol::Nonterminal(0), Symbol::Terminal(1), Symbol::Nonterminal(0)],
          vec![Symbol::Terminal(0), Symbol::Nonterminal(0)],
          vec![Symbol::Terminal(2)],
        ],
      }],
      0,
    );
    let table = GlrTable::build(&grammar, &BuildConfig::default()).unwrap();
    let has_shift_and_reduce = (0..table.actions.rows()).any(|state| {
      let cell = table.actions(state, 1); // "e"
      cell.iter().any(|a| matches!(a, Action::Shift(_))) && cell.iter().any(|a| matches!(a, Action::Reduce(_)))
    });
    assert!(has_shift_and_reduce);
  }

  #[test]
  fn a_cap_below_the_grammars_actual_state_count_fails_construction() {
    let grammar = Grammar::new(
      vec!["a".into(), "b".into()],
      vec![Rule {
        lhs: "S".into(),
        rhs: vec![
          vec![Symbol::Terminal(0), Symbol::Nonterminal(0), Symbol::Terminal(1)],
          vec![Symbol::Terminal(0), Symbol::Terminal(1)],
        ],
      }],
      0,
    );
    let err = GlrTable::build(&grammar, &BuildConfig::new().with_max_states(1)).unwrap_err();
    assert!(matches!(err, parsekit_runtime::Error::TooManyStates { limit: 1 }));
  }
}
