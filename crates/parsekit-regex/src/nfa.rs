use crate::ast::Ast;
use crate::encoding::Encoding;

/// One NFA state: its labeled (code-point) transitions and its
/// epsilon-transitions.
#[derive(Debug, Clone, Default)]
pub struct State {
  pub transitions: Vec<(usize, usize)>,
  pub epsilon_transitions: Vec<usize>,
}

/// A Thompson-construction NFA over the code-point alphabet, built for
/// possibly many patterns at once: a single super-start state links by
/// epsilon to each pattern's own start, and the accept state of each
/// pattern is recorded in declaration order so a downstream DFA can label
/// states with the smallest-index pattern that accepts there.
#[derive(Debug, Clone)]
pub struct Nfa {
  states: Vec<State>,
  start: usize,
  /// `accepts[i]` is the NFA state accepting pattern `i`.
  accepts: Vec<usize>,
}

impl Nfa {
  pub fn build(patterns: &[Ast], encoding: &Encoding) -> Self {
    let mut nfa = Nfa { states: Vec::new(), start: 0, accepts: Vec::new() };
    let super_start = nfa.add_state();
    nfa.start = super_start;

    for pattern in patterns {
      let pattern_start = nfa.add_state();
      let pattern_accept = nfa.add_state();
      nfa.add_epsilon(super_start, pattern_start);
      nfa.populate(pattern, pattern_start, pattern_accept, encoding);
      nfa.accepts.push(pattern_accept);
    }

    log::debug!("NFA built: {} states, {} patterns", nfa.states.len(), nfa.accepts.len());
    nfa
  }

  pub fn start(&self) -> usize {
    self.start
  }

  pub fn accepts(&self) -> &[usize] {
    &self.accepts
  }

  pub fn states(&self) -> &[State] {
    &self.states
  }

  fn add_state(&mut self) -> usize {
    self.states.push(State::default());
    self.states.len() - 1
  }

  fn add_transition(&mut self, from: usize, code_point: usize, to: usize) {
    self.states[from].transitions.push((code_point, to));
  }

  fn add_epsilon(&mut self, from: usize, to: usize) {
    self.states[from].epsilon_transitions.push(to);
  }

  fn populate(&mut self, node: &Ast, start: usize, accept: usize, encoding: &Encoding) {
    match node {
      Ast::Symbol(b) => {
        let code_point = encoding.code_point(*b);
        self.add_transition(start, code_point, accept);
      }

      Ast::CharClass(ranges) => {
        let mut code_points: Vec<usize> =
          ranges.iter().flat_map(|&r| encoding.code_point_ranges(r)).collect();
        code_points.sort_unstable();
        code_points.dedup();
        for code_point in code_points {
          self.add_transition(start, code_point, accept);
        }
      }

      Ast::Sequence(children) => {
        let mut current = start;
        for (i, child) in children.iter().enumerate() {
          let next = if i == children.len() - 1 { accept } else { self.add_state() };
          self.populate(child, current, next, encoding);
          current = next;
        }
        if children.is_empty() {
          self.add_epsilon(start, accept);
        }
      }

      Ast::Alt(children) => {
        for child in children {
          self.populate(child, start, accept, encoding);
        }
      }

      Ast::ZeroOrMore(child) => {
        let first = self.add_state();
        let next = self.add_state();
        self.add_epsilon(start, first);
        self.add_epsilon(next, accept);
        self.populate(child, first, next, encoding);
        self.add_epsilon(first, next);
        self.add_epsilon(next, first);
      }

      Ast::OneOrMore(child) => {
        let first = self.add_state();
        let next = self.add_state();
        self.add_epsilon(start, first);
        self.add_epsilon(next, accept);
        self.populate(child, first, next, encoding);
        self.add_epsilon(next, first);
      }

      Ast::ZeroOrOne(child) => {
        let new_start = self.add_state();
        let new_accept = self.add_state();
        self.add_epsilon(start, new_start);
        self.add_epsilon(new_accept, accept);
        self.populate(child, new_start, new_accept, encoding);
        self.add_epsilon(new_start, new_accept);
      }
    }
  }
}
