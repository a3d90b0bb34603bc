use std::collections::{BTreeMap, BTreeSet, HashMap};

use parsekit_grammar::{Grammar, Symbol};
use parsekit_runtime::{Error, PResult};

use crate::config::BuildConfig;

/// An LR(0) item: a dot position within one rule's alternative.
/// Epsilon alternatives are always represented already-complete
/// (`pos == rhs.len()`), since there is nothing to shift over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
  pub rule: usize,
  pub rhs: usize,
  pub pos: usize,
}

/// One node of the canonical LR(0) automaton: its closed item set and
/// the outgoing transitions, keyed by [`symbol_index`].
#[derive(Debug, Clone, Default)]
pub struct State {
  pub items: BTreeSet<Item>,
  pub transitions: BTreeMap<usize, usize>,
}

/// Maps a grammar symbol onto the combined terminal+nonterminal index
/// space that both the automaton's transitions and the parse table's
/// columns are addressed by: terminals occupy `[0, num_terminals)`,
/// nonterminals occupy `[num_terminals, num_terminals + num_rules)`.
pub fn symbol_index(symbol: &Symbol, num_terminals: usize) -> usize {
  match symbol {
    Symbol::Terminal(t) => *t,
    Symbol::Nonterminal(r) => num_terminals + r,
    Symbol::Epsilon => unreachable!("epsilon never appears under a dot"),
  }
}

fn initial_pos(rhs: &[Symbol]) -> usize {
  if matches!(rhs, [Symbol::Epsilon]) {
    1
  } else {
    0
  }
}

/// Expands `items` with every item reachable by repeatedly closing over
/// the nonterminal standing under each item's dot, until a full pass
/// adds nothing new.
pub fn compute_closure(grammar: &Grammar, items: &mut BTreeSet<Item>) {
  let mut changed = true;
  while changed {
    changed = false;
    let snapshot: Vec<Item> = items.iter().copied().collect();
    for item in snapshot {
      let rhs = &grammar.rules()[item.rule].rhs[item.rhs];
      if let Some(Symbol::Nonterminal(next_rule)) = rhs.get(item.pos) {
        for (rhs_index, next_rhs) in grammar.rules()[*next_rule].rhs.iter().enumerate() {
          let new_item = Item { rule: *next_rule, rhs: rhs_index, pos: initial_pos(next_rhs) };
          if items.insert(new_item) {
            changed = true;
          }
        }
      }
    }
  }
}

/// Builds the canonical collection of LR(0) states by closing the
/// start rule's items and repeatedly computing goto sets for every
/// symbol standing under a dot, merging any state whose closed item
/// set already exists. Fails with `Error::TooManyStates` if the graph
/// grows past `config`'s cap.
pub fn compute_states(grammar: &Grammar, config: &BuildConfig) -> PResult<Vec<State>> {
  let num_terminals = grammar.terminals().len();

  let mut initial_items: BTreeSet<Item> = grammar.rules()[grammar.start_rule()]
    .rhs
    .iter()
    .enumerate()
    .map(|(rhs_index, rhs)| Item { rule: grammar.start_rule(), rhs: rhs_index, pos: initial_pos(rhs) })
    .collect();
  compute_closure(grammar, &mut initial_items);

  let mut states = vec![State { items: initial_items.clone(), transitions: BTreeMap::new() }];
  let mut index_of: HashMap<BTreeSet<Item>, usize> = HashMap::new();
  index_of.insert(initial_items, 0);
  let mut worklist = vec![0usize];

  while let Some(state_index) = worklist.pop() {
    let mut moves: BTreeMap<usize, BTreeSet<Item>> = BTreeMap::new();
    for item in states[state_index].items.clone() {
      let rhs = &grammar.rules()[item.rule].rhs[item.rhs];
      if let Some(symbol) = rhs.get(item.pos) {
        let sym_index = symbol_index(symbol, num_terminals);
        let mut next_item = item;
        next_item.pos += 1;
        moves.entry(sym_index).or_default().insert(next_item);
      }
    }

    for (sym_index, mut item_set) in moves {
      compute_closure(grammar, &mut item_set);
      let target = *index_of.entry(item_set.clone()).or_insert_with(|| {
        let new_index = states.len();
        states.push(State { items: item_set, transitions: BTreeMap::new() });
        worklist.push(new_index);
        new_index
      });
      states[state_index].transitions.insert(sym_index, target);
    }

    if let Some(max) = config.max_states() {
      if states.len() > max {
        return Err(Error::TooManyStates { limit: max });
      }
    }
  }

  log::debug!("LR(0) automaton built: {} state(s)", states.len());
  Ok(states)
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
  fn closure_adds_every_alternative_of_a_referenced_rule() {
    let grammar = anbn_grammar();
    let mut items = BTreeSet::new();
    items.insert(Item { rule: 0, rhs: 0, pos: 0 });
    compute_closure(&grammar, &mut items);
    // dot stands before S, so both of S's alternatives must be pulled in
    assert!(items.contains(&Item { rule: 0, rhs: 0, pos: 0 }));
    assert!(items.contains(&Item { rule: 0, rhs: 1, pos: 1 })); // epsilon alt, already complete
  }

  #[test]
  fn states_reuse_an_existing_node_for_an_identical_item_set() {
    let grammar = anbn_grammar();
    let states = compute_states(&grammar, &BuildConfig::default()).unwrap();
    // shifting "a" from state 0 returns to an item set equal to state 0's own closure
    let shifted = *states[0].transitions.get(&0).unwrap();
    assert_eq!(states[shifted].items, states[0].items);
  }

  #[test]
  fn every_state_has_a_transition_for_each_symbol_under_a_dot() {
    let grammar = anbn_grammar();
    let states = compute_states(&grammar, &BuildConfig::default()).unwrap();
    for state in &states {
      for item in &state.items {
        let rhs = &grammar.rules()[item.rule].rhs[item.rhs];
        if let Some(symbol) = rhs.get(item.pos) {
          let sym = symbol_index(symbol, grammar.terminals().len());
          assert!(state.transitions.contains_key(&sym));
        }
      }
    }
  }

  #[test]
  fn a_cap_below_the_grammars_actual_state_count_fails_construction() {
    let grammar = anbn_grammar();
    let err = compute_states(&grammar, &BuildConfig::new().with_max_states(1)).unwrap_err();
    assert!(matches!(err, parsekit_runtime::Error::TooManyStates { limit: 1 }));
  }
}
