use parsekit_grammar::{Grammar, Rule, Symbol};

/// The synthetic terminal marking true end-of-input in an augmented
/// grammar's start production. Never collides with a real pattern name
/// since it's only ever used internally, never looked up by
/// `Grammar::terminal_index`.
const END_TERMINAL_NAME: &str = "$end";

/// `grammar` plus a fresh `S' : S $end` start production appended after
/// it, used to build the canonical automaton.
pub struct Augmented {
  pub grammar: Grammar,
  pub end_terminal: usize,
}

/// Appends a fresh end-of-input terminal and a synthetic start rule
/// `S' : S $end` to `grammar`. The automaton built over the result has
/// exactly one state where `S'`'s item is complete, reached only by
/// shifting the real end-of-input token after the whole input has
/// reduced back to the original start symbol — unlike scanning for any
/// completed item of the original start rule, which also matches every
/// sub-derivation of it that happens to finish early.
pub fn augment(grammar: &Grammar) -> Augmented {
  let end_terminal = grammar.terminals().len();
  let mut terminals = grammar.terminals().to_vec();
  terminals.push(END_TERMINAL_NAME.to_string());

  let mut rules = grammar.rules().to_vec();
  let start_rule = rules.len();
  rules.push(Rule {
    lhs: format!("{}'", grammar.rules()[grammar.start_rule()].lhs),
    rhs: vec![vec![Symbol::Nonterminal(grammar.start_rule()), Symbol::Terminal(end_terminal)]],
  });

  Augmented { grammar: Grammar::new(terminals, rules, start_rule), end_terminal }
}
