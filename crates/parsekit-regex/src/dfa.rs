use std::collections::{BTreeSet, HashMap, VecDeque};

use parsekit_runtime::Table;

use crate::encoding::Encoding;
use crate::nfa::Nfa;

/// A dense, minimized DFA: `State x CodePoint -> State`, with a dedicated
/// reject state absorbing every undefined transition.
#[derive(Debug, Clone)]
pub struct Dfa {
  num_code_points: usize,
  start: usize,
  reject: usize,
  transitions: Table<usize>,
  /// `accept[state]` is the smallest-index pattern accepting there, or
  /// `None` if the state isn't accepting.
  accept: Vec<Option<usize>>,
}

impl Dfa {
  pub fn build(nfa: &Nfa, encoding: &Encoding) -> Self {
    let raw = subset_construction(nfa, encoding);
    minimize(raw)
  }

  pub fn start(&self) -> usize {
    self.start
  }

  pub fn reject(&self) -> usize {
    self.reject
  }

  pub fn num_states(&self) -> usize {
    self.transitions.rows()
  }

  /// Always returns exactly one target state: the table is total over
  /// `State x CodePoint`.
  pub fn transition(&self, state: usize, code_point: usize) -> usize {
    if code_point >= self.num_code_points {
      return self.reject;
    }
    *self.transitions.at(state, code_point)
  }

  pub fn accept(&self, state: usize) -> Option<usize> {
    self.accept[state]
  }
}

struct RawDfa {
  num_code_points: usize,
  start: usize,
  /// Sparse per-state transitions: only code points with an actual edge
  /// are present; everything else implicitly goes to reject.
  transitions: Vec<HashMap<usize, usize>>,
  accept: Vec<Option<usize>>,
}

fn epsilon_closure(nfa: &Nfa, seeds: &[usize]) -> BTreeSet<usize> {
  let mut closure: BTreeSet<usize> = seeds.iter().copied().collect();
  let mut queue: Vec<usize> = seeds.to_vec();
  while let Some(s) = queue.pop() {
    for &next in &nfa.states()[s].epsilon_transitions {
      if closure.insert(next) {
        queue.push(next);
      }
    }
  }
  closure
}

fn subset_construction(nfa: &Nfa, encoding: &Encoding) -> RawDfa {
  let num_code_points = encoding.num_code_points();
  let mut state_sets: Vec<BTreeSet<usize>> = Vec::new();
  let mut index_of: HashMap<BTreeSet<usize>, usize> = HashMap::new();

  let mut find_or_add = |set: BTreeSet<usize>, state_sets: &mut Vec<BTreeSet<usize>>| -> (usize, bool) {
    if let Some(&i) = index_of.get(&set) {
      (i, false)
    } else {
      let i = state_sets.len();
      state_sets.push(set.clone());
      index_of.insert(set, i);
      (i, true)
    }
  };

  let start_set = epsilon_closure(nfa, &[nfa.start()]);
  let (start, _) = find_or_add(start_set, &mut state_sets);

  let mut transitions: Vec<HashMap<usize, usize>> = vec![HashMap::new()];
  let mut queue = VecDeque::from([start]);

  while let Some(state) = queue.pop_front() {
    for code_point in 0..num_code_points {
      let mut targets = Vec::new();
      for &nfa_state in &state_sets[state] {
        for &(cp, target) in &nfa.states()[nfa_state].transitions {
          if cp == code_point {
            targets.push(target);
          }
        }
      }
      if targets.is_empty() {
        continue;
      }

      let closure = epsilon_closure(nfa, &targets);
      let (target_state, is_new) = find_or_add(closure, &mut state_sets);
      if is_new {
        transitions.push(HashMap::new());
        queue.push_back(target_state);
      }
      transitions[state].insert(code_point, target_state);
    }
  }

  let mut accept = vec![None; state_sets.len()];
  for (state, set) in state_sets.iter().enumerate() {
    for (pattern_idx, &accept_state) in nfa.accepts().iter().enumerate() {
      if set.contains(&accept_state) {
        accept[state] = Some(pattern_idx);
        break; // patterns are in declaration order: first hit is smallest index
      }
    }
  }

  log::debug!("subset construction produced {} DFA states", state_sets.len());
  RawDfa { num_code_points, start, transitions, accept }
}

/// Hopcroft-style partition refinement, generalized to per-pattern accept
/// labels (states with different winning patterns can never merge).
fn minimize(raw: RawDfa) -> Dfa {
  let RawDfa { num_code_points, start, transitions, accept } = raw;
  let num_states = transitions.len();

  let mut groups: HashMap<Option<usize>, BTreeSet<usize>> = HashMap::new();
  for state in 0..num_states {
    groups.entry(accept[state]).or_default().insert(state);
  }
  let mut partition: Vec<BTreeSet<usize>> = groups.into_values().collect();
  let mut queue: VecDeque<usize> = (0..partition.len()).collect();

  while let Some(class_idx) = queue.pop_front() {
    if class_idx >= partition.len() {
      continue;
    }
    let distinguisher = partition[class_idx].clone();

    for code_point in 0..num_code_points {
      let mut inbound = BTreeSet::new();
      for state in 0..num_states {
        if let Some(&target) = transitions[state].get(&code_point) {
          if distinguisher.contains(&target) {
            inbound.insert(state);
          }
        }
      }
      if inbound.is_empty() {
        continue;
      }

      for i in 0..partition.len() {
        let (inside, outside): (BTreeSet<usize>, BTreeSet<usize>) =
          partition[i].iter().partition(|s| inbound.contains(s));
        if inside.is_empty() || outside.is_empty() {
          continue;
        }

        partition[i] = inside.clone();
        partition.push(outside);
        let outside_idx = partition.len() - 1;

        if queue.contains(&i) {
          queue.push_back(outside_idx);
        } else if inside.len() > partition[outside_idx].len() {
          queue.push_back(outside_idx);
        } else {
          queue.push_back(i);
        }
      }
    }
  }

  let mut class_of = vec![0usize; num_states];
  for (class_idx, class) in partition.iter().enumerate() {
    for &state in class {
      class_of[state] = class_idx;
    }
  }

  let num_classes = partition.len();
  let reject = num_classes; // one extra state, absorbing all undefined transitions
  let mut table = Table::new(num_classes + 1, num_code_points, reject);
  let mut new_accept = vec![None; num_classes + 1];

  for (class_idx, class) in partition.iter().enumerate() {
    let representative = *class.iter().next().unwrap();
    new_accept[class_idx] = accept[representative];
    for code_point in 0..num_code_points {
      if let Some(&target) = transitions[representative].get(&code_point) {
        table.set(class_idx, code_point, class_of[target]);
      }
    }
  }

  log::debug!("minimization reduced {} states to {}", num_states, num_classes);

  Dfa { num_code_points, start: class_of[start], reject, transitions: table, accept: new_accept }
}
