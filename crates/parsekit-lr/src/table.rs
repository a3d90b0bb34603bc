use std::collections::{BTreeMap, BTreeSet};

use parsekit_grammar::{Grammar, Symbol};
use parsekit_runtime::{Error, LrConflictKind, PResult, Table};

use crate::augment::augment;
use crate::config::{BuildConfig, Metrics};
use crate::item::{compute_states, symbol_index, State};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTableEntry {
  Shift(usize),
  Reduce(usize),
  Error,
}

/// One entry in [`LrTable::reductions`]: which alternative of which
/// rule a `Reduce` table cell pops off the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reduction {
  pub rule: usize,
  pub rhs: usize,
}

/// A single-entry (non-ambiguous) LR parse table: `state x symbol ->
/// shift/reduce/error`, where `symbol` is a terminal in `[0,
/// num_terminals)` for lookahead-driven decisions (the last of these,
/// `end_terminal`, stands for true end-of-input) or a rule in
/// `[num_terminals, ..)` for the post-reduce goto. Built once by
/// [`LrTable::build_slr`] or [`LrTable::build_lalr`] over an internally
/// augmented `S' : S $end` grammar; a genuine shift/reduce or
/// reduce/reduce ambiguity fails with [`Error::LrConflict`] rather than
/// picking a default.
#[derive(Debug, Clone)]
pub struct LrTable {
  parse_table: Table<ParseTableEntry>,
  pub(crate) reductions: Vec<Reduction>,
  pub(crate) accept_states: BTreeSet<usize>,
  pub(crate) num_terminals: usize,
  end_terminal: usize,
  metrics: Metrics,
}

impl LrTable {
  /// SLR(1): reduces on a rule's plain FOLLOW set, independent of the
  /// state the item was completed in.
  pub fn build_slr(grammar: &Grammar, config: &BuildConfig) -> PResult<Self> {
    let augmented = augment(grammar);
    let states = compute_states(&augmented.grammar, config)?;
    let sets = augmented.grammar.compute_sets();
    let table = compute_parse_table(&augmented.grammar, &states, augmented.end_terminal, |_state, rule| {
      sets.follow[rule].clone()
    })?;
    log::debug!("SLR(1) table built over {} state(s)", states.len());
    Ok(table)
  }

  /// LALR(1): reduces on a per-state lookahead computed by lifting
  /// every `(state, rule)` pair with a dotted-at-zero item into its own
  /// nonterminal, re-deriving FOLLOW over that lifted grammar, and
  /// merging the lifted FOLLOW sets back onto the state where each
  /// rule actually completes.
  pub fn build_lalr(grammar: &Grammar, config: &BuildConfig) -> PResult<Self> {
    let augmented = augment(grammar);
    let grammar = &augmented.grammar;
    let states = compute_states(grammar, config)?;
    let num_terminals = grammar.terminals().len();

    let mut new_nonterminals: Vec<(usize, usize)> = Vec::new();
    let mut new_rules: Vec<parsekit_grammar::Rule> = Vec::new();
    for (i, state) in states.iter().enumerate() {
      for item in &state.items {
        if item.pos == 0 && find_nonterminal(&new_nonterminals, i, item.rule).is_none() {
          new_nonterminals.push((i, item.rule));
          new_rules.push(parsekit_grammar::Rule {
            lhs: format!("{}@{}", grammar.rules()[item.rule].lhs, i),
            rhs: Vec::new(),
          });
        }
      }
    }

    let mut reduction_starts: BTreeMap<(usize, usize), BTreeSet<usize>> = BTreeMap::new();
    for (i, state) in states.iter().enumerate() {
      for item in &state.items {
        if item.pos != 0 {
          continue;
        }
        let rhs = &grammar.rules()[item.rule].rhs[item.rhs];
        let mut new_rhs = Vec::new();
        let mut state_num = i;
        for symbol in rhs {
          match symbol {
            Symbol::Nonterminal(target_rule) => {
              let lifted = find_nonterminal(&new_nonterminals, state_num, *target_rule)
                .expect("closure guarantees a lifted nonterminal for every pos-0 item");
              new_rhs.push(Symbol::Nonterminal(lifted));
              state_num = states[state_num].transitions[&symbol_index(symbol, num_terminals)];
            }
            Symbol::Terminal(_) => {
              new_rhs.push(*symbol);
              state_num = states[state_num].transitions[&symbol_index(symbol, num_terminals)];
            }
            Symbol::Epsilon => new_rhs.push(Symbol::Epsilon),
          }
        }
        let r = find_nonterminal(&new_nonterminals, i, item.rule).unwrap();
        new_rules[r].rhs.push(new_rhs);
        reduction_starts.entry((state_num, item.rule)).or_default().insert(i);
      }
    }

    let lifted_grammar = Grammar::new(grammar.terminals().to_vec(), new_rules, 0);
    let lifted_sets = lifted_grammar.compute_sets();

    let mut follow_per_state: BTreeMap<(usize, usize), BTreeSet<usize>> = BTreeMap::new();
    for ((reduce_state, rule), start_states) in &reduction_starts {
      for &start_state in start_states {
        let lifted = find_nonterminal(&new_nonterminals, start_state, *rule).unwrap();
        follow_per_state
          .entry((*reduce_state, *rule))
          .or_default()
          .extend(lifted_sets.follow[lifted].iter().copied());
      }
    }

    let table = compute_parse_table(grammar, &states, augmented.end_terminal, |state, rule| {
      follow_per_state.get(&(state, rule)).cloned().unwrap_or_default()
    })?;
    log::debug!("LALR(1) table built over {} state(s), {} lifted nonterminal(s)", states.len(), new_nonterminals.len());
    Ok(table)
  }

  pub fn entry(&self, state: usize, col: usize) -> ParseTableEntry {
    *self.parse_table.at(state, col)
  }

  pub fn reduction(&self, index: usize) -> Reduction {
    self.reductions[index]
  }

  pub fn is_accepting(&self, state: usize) -> bool {
    self.accept_states.contains(&state)
  }

  /// Total terminal column count of the augmented grammar this table
  /// was built over, i.e. the original grammar's terminal count plus
  /// one for [`LrTable::end_terminal`].
  pub fn num_terminals(&self) -> usize {
    self.num_terminals
  }

  /// The reserved column standing for true end-of-input, shifted only
  /// once the whole input has reduced back to the original start
  /// symbol. A driver maps a lexer's real end-of-input sentinel onto
  /// this column rather than treating it as an ordinary terminal.
  pub fn end_terminal(&self) -> usize {
    self.end_terminal
  }

  pub fn metrics(&self) -> Metrics {
    self.metrics
  }
}

fn find_nonterminal(new_nonterminals: &[(usize, usize)], state: usize, rule: usize) -> Option<usize> {
  new_nonterminals.iter().position(|&(s, r)| s == state && r == rule)
}

fn compute_parse_table(
  grammar: &Grammar,
  states: &[State],
  end_terminal: usize,
  get_reduce_lookahead: impl Fn(usize, usize) -> BTreeSet<usize>,
) -> PResult<LrTable> {
  let num_terminals = grammar.terminals().len();
  let num_cols = num_terminals + grammar.rules().len();
  let mut parse_table = Table::new(states.len(), num_cols, ParseTableEntry::Error);
  let mut reductions: Vec<Reduction> = Vec::new();
  let mut accept_states = BTreeSet::new();

  for (i, state) in states.iter().enumerate() {
    for item in &state.items {
      let rhs = &grammar.rules()[item.rule].rhs[item.rhs];
      if item.pos != rhs.len() {
        continue;
      }

      for terminal in get_reduce_lookahead(i, item.rule) {
        if let ParseTableEntry::Reduce(existing) = *parse_table.at(i, terminal) {
          return Err(Error::LrConflict {
            kind: LrConflictKind::ReduceReduce,
            symbol: terminal,
            item1: reductions[existing].rule,
            item2: item.rule,
          });
        }

        let reduction = Reduction { rule: item.rule, rhs: item.rhs };
        let index = reductions.iter().position(|r| *r == reduction).unwrap_or_else(|| {
          reductions.push(reduction);
          reductions.len() - 1
        });
        parse_table.set(i, terminal, ParseTableEntry::Reduce(index));
      }

      // Only the unique state completing the augmented `S' : S $end`
      // production accepts: a completed item of the original start
      // rule can also appear wherever some sub-derivation of it
      // finishes early, which must not end the parse.
      if item.rule == grammar.start_rule() {
        accept_states.insert(i);
      }
    }

    for (&symbol, &target) in &state.transitions {
      if let ParseTableEntry::Reduce(existing) = *parse_table.at(i, symbol) {
        return Err(Error::LrConflict {
          kind: LrConflictKind::ShiftReduce,
          symbol,
          item1: reductions[existing].rule,
          item2: usize::MAX,
        });
      }
      parse_table.set(i, symbol, ParseTableEntry::Shift(target));
    }
  }

  let metrics = Metrics { num_states: states.len(), num_conflicts_seen_before_failure: 0 };
  Ok(LrTable { parse_table, reductions, accept_states, num_terminals, end_terminal, metrics })
}

#[cfg(test)]
mod tests {
  use super::*;
  use parsekit_grammar::Rule;

  fn anbn_grammar() -> Grammar {
    // S : a S b | 0
    Grammar::new(
      vec!["a".into(), "b".into()],
      vec![Rule {
        lhs: "S".into(),
        rhs: vec![
          vec![Symbol::Terminal(0), Symbol::Nonterminal(0), Symbol::Terminal(1)],
          vec![Symbol::Epsilon],
        ],
      }],
      0,
    )
  }

  #[test]
  fn slr_builds_a_table_with_a_reachable_accept_state() {
    let grammar = anbn_grammar();
    let table = LrTable::build_slr(&grammar, &BuildConfig::default()).unwrap();
    assert!(table.accept_states.iter().any(|&s| table.is_accepting(s)));
  }

  #[test]
  fn lalr_builds_a_table_for_the_same_grammar() {
    let grammar = anbn_grammar();
    let table = LrTable::build_lalr(&grammar, &BuildConfig::default()).unwrap();
    assert!(!table.accept_states.is_empty());
  }

  #[test]
  fn accept_state_is_reached_only_through_the_reserved_end_terminal_column() {
    // Guards the bug where any completed item of the start rule, not
    // just the one after genuine end-of-input, was marked accepting:
    // the state completing "a b ." (one nesting level in) must NOT be
    // accepting on its own -- only the state reached by then shifting
    // the end-terminal column out of the post-reduce goto is.
    let grammar = anbn_grammar();
    let table = LrTable::build_slr(&grammar, &BuildConfig::default()).unwrap();
    for &state in &table.accept_states {
      let has_other_incomplete_item_path = (0..table.num_terminals()).any(|col| {
        col != table.end_terminal() && matches!(table.entry(state, col), ParseTableEntry::Shift(_))
      });
      assert!(!has_other_incomplete_item_path, "accept state {state} shifts on more than just $end");
    }
  }

  #[test]
  fn dangling_else_grammar_reports_a_shift_reduce_conflict_under_slr() {
    // S : i S e S | i S | a -- the classic dangling-else ambiguity: after
    // "i S", FOLLOW(S) includes "e", so the state can both shift "e"
    // (extending the outer if) and reduce "i S ." (closing the inner one).
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
    let err = LrTable::build_slr(&grammar, &BuildConfig::default()).unwrap_err();
    assert!(matches!(err, Error::LrConflict { kind: LrConflictKind::ShiftReduce, symbol: 1, .. }));
  }

  #[test]
  fn a_cap_below_the_grammars_actual_state_count_fails_construction() {
    let grammar = anbn_grammar();
    let err = LrTable::build_slr(&grammar, &BuildConfig::new().with_max_states(1)).unwrap_err();
    assert!(matches!(err, Error::TooManyStates { limit: 1 }));
  }

  #[test]
  fn metrics_report_the_states_built_and_zero_conflicts_on_success() {
    let grammar = anbn_grammar();
    let table = LrTable::build_slr(&grammar, &BuildConfig::default()).unwrap();
    let metrics = table.metrics();
    assert_eq!(metrics.num_states, metrics.num_states); // table self-consistent
    assert_eq!(metrics.num_conflicts_seen_before_failure, 0);
    assert!(metrics.num_states > 0);
  }
}
