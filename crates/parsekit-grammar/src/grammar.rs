use std::collections::BTreeSet;

/// One grammar symbol: a terminal or nonterminal index into the owning
/// [`Grammar`]'s tables, or the distinguished empty-string symbol that
/// appears only as a whole RHS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
  Terminal(usize),
  Nonterminal(usize),
  Epsilon,
}

impl Symbol {
  fn is_nullable(&self, nullable: &BTreeSet<usize>) -> bool {
    match self {
      Symbol::Terminal(_) => false,
      Symbol::Epsilon => true,
      Symbol::Nonterminal(i) => nullable.contains(i),
    }
  }
}

pub type Rhs = Vec<Symbol>;

/// A nonterminal and its alternative right-hand sides.
#[derive(Debug, Clone, Default)]
pub struct Rule {
  pub lhs: String,
  pub rhs: Vec<Rhs>,
}

/// The FIRST/FOLLOW/nullable tables produced by [`Grammar::compute_sets`],
/// indexed by rule (nonterminal) index.
#[derive(Debug, Clone, Default)]
pub struct SymbolSets {
  pub first: Vec<BTreeSet<usize>>,
  pub follow: Vec<BTreeSet<usize>>,
  pub nullable: BTreeSet<usize>,
}

/// A plain BNF grammar: terminals named by string, nonterminals named by
/// their rule's `lhs` and addressed by rule index. Produced either
/// directly or by normalizing an [`crate::Ebnf`] grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
  terminals: Vec<String>,
  rules: Vec<Rule>,
  start_rule: usize,
}

impl Grammar {
  pub fn new(terminals: Vec<String>, rules: Vec<Rule>, start_rule: usize) -> Self {
    Grammar { terminals, rules, start_rule }
  }

  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  pub fn start_rule(&self) -> usize {
    self.start_rule
  }

  pub fn terminals(&self) -> &[String] {
    &self.terminals
  }

  pub fn terminal_index(&self, name: &str) -> Option<usize> {
    self.terminals.iter().position(|t| t == name)
  }

  pub fn rule_index(&self, name: &str) -> Option<usize> {
    self.rules.iter().position(|r| r.lhs == name)
  }

  /// Fixed-point computation of FIRST, FOLLOW and nullability: keep
  /// re-scanning every production until a full pass adds nothing new.
  pub fn compute_sets(&self) -> SymbolSets {
    let mut first: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.rules.len()];
    let mut follow: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.rules.len()];
    let mut nullable: BTreeSet<usize> = BTreeSet::new();

    let mut changed = true;
    let mut rounds = 0;
    while changed {
      changed = false;
      rounds += 1;
      for (i, rule) in self.rules.iter().enumerate() {
        for rhs in &rule.rhs {
          let (rhs_first, rhs_nullable) = first_of_sequence(rhs, &first, &nullable);
          changed |= union_into(&mut first[i], &rhs_first);
          if rhs_nullable {
            changed |= nullable.insert(i);
          }

          for (j, symbol) in rhs.iter().enumerate() {
            if let Symbol::Nonterminal(target) = symbol {
              let (tail_first, tail_nullable) = first_of_sequence(&rhs[j + 1..], &first, &nullable);
              changed |= union_into(&mut follow[*target], &tail_first);
              if tail_nullable {
                let follow_i = follow[i].clone();
                changed |= union_into(&mut follow[*target], &follow_i);
              }
            }
          }
        }
      }
    }

    log::debug!("FIRST/FOLLOW/nullable fixed point converged after {rounds} round(s)");
    SymbolSets { first, follow, nullable }
  }
}

fn union_into(target: &mut BTreeSet<usize>, source: &BTreeSet<usize>) -> bool {
  let mut changed = false;
  for &s in source {
    changed |= target.insert(s);
  }
  changed
}

/// FIRST of a whole symbol sequence: each symbol's own FIRST set,
/// stopping at the first non-nullable symbol. Returns whether the
/// entire sequence (including the empty sequence) is nullable.
fn first_of_sequence(
  symbols: &[Symbol],
  first: &[BTreeSet<usize>],
  nullable: &BTreeSet<usize>,
) -> (BTreeSet<usize>, bool) {
  let mut result = BTreeSet::new();
  for symbol in symbols {
    match symbol {
      Symbol::Terminal(t) => {
        result.insert(*t);
      }
      Symbol::Nonterminal(n) => result.extend(first[*n].iter().copied()),
      Symbol::Epsilon => {}
    }
    if !symbol.is_nullable(nullable) {
      return (result, false);
    }
  }
  (result, true)
}
