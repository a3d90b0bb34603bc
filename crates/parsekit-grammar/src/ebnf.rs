use crate::grammar::{Grammar, Rhs, Rule, Symbol};

/// One EBNF right-hand-side symbol: a reference to a terminal or a
/// nonterminal rule, both addressed by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EbnfSymbol {
  Terminal(usize),
  Nonterminal(usize),
}

/// An EBNF right-hand side tree. `Sequence` and `OneOf` only ever appear
/// directly under a rule's `rhs` or inside another combinator's operand;
/// `Sequence` nested directly inside `Sequence`, or any combinator's
/// operand being itself a bare `Sequence`/`OneOf` two levels deep, is not
/// produced by this representation (parenthesize it as a `OneOf` with one
/// alternative, or flatten the sequence, before normalizing).
#[derive(Debug, Clone)]
pub enum Ebnf {
  Symbol(EbnfSymbol),
  Sequence(Vec<Ebnf>),
  OneOf(Vec<Ebnf>),
  OneOrMore(Box<Ebnf>),
  ZeroOrMore(Box<Ebnf>),
  ZeroOrOne(Box<Ebnf>),
}

#[derive(Debug, Clone)]
pub struct EbnfRule {
  pub lhs: String,
  pub rhs: Ebnf,
}

/// An EBNF grammar: the same shape as [`Grammar`], but rules carry a
/// single [`Ebnf`] tree instead of a flat list of BNF alternatives.
/// [`EbnfGrammar::normalize`] lowers it to BNF, introducing one fresh
/// nonterminal per quantifier or nested alternation.
#[derive(Debug, Clone)]
pub struct EbnfGrammar {
  terminals: Vec<String>,
  rules: Vec<EbnfRule>,
  start_rule: usize,
}

impl EbnfGrammar {
  pub fn new(terminals: Vec<String>, rules: Vec<EbnfRule>, start_rule: usize) -> Self {
    EbnfGrammar { terminals, rules, start_rule }
  }

  /// Lowers this grammar to BNF. Every `?`/`*`/`+` and every nested `|`
  /// becomes a fresh nonterminal named `<rule>.<n>`, `n` starting at 1
  /// and incrementing past any name already in use.
  pub fn normalize(&self) -> Grammar {
    let mut rules: Vec<Rule> =
      self.rules.iter().map(|r| Rule { lhs: r.lhs.clone(), rhs: Vec::new() }).collect();

    for i in 0..self.rules.len() {
      let node = self.rules[i].rhs.clone();
      populate_rule(&mut rules, i, &node);
    }

    log::debug!(
      "normalized EBNF grammar: {} declared rule(s) expanded to {} BNF rule(s)",
      self.rules.len(),
      rules.len()
    );
    Grammar::new(self.terminals.clone(), rules, self.start_rule)
  }
}

fn create_sub_rule_name(rule_name: &str, rules: &[Rule]) -> String {
  let mut n = 1usize;
  loop {
    let candidate = format!("{rule_name}.{n}");
    if rules.iter().any(|r| r.lhs == candidate) {
      n += 1;
    } else {
      return candidate;
    }
  }
}

/// Populates `rules[index]`'s alternatives from `node`: a bare `OneOf`
/// contributes one alternative per child, anything else contributes a
/// single alternative.
fn populate_rule(rules: &mut Vec<Rule>, index: usize, node: &Ebnf) {
  if let Ebnf::OneOf(children) = node {
    for child in children.clone() {
      let rule_name = rules[index].lhs.clone();
      let mut rhs = Rhs::new();
      populate_rhs(&mut rhs, &child, rules, &rule_name);
      rules[index].rhs.push(rhs);
    }
  } else {
    let rule_name = rules[index].lhs.clone();
    let mut rhs = Rhs::new();
    populate_rhs(&mut rhs, node, rules, &rule_name);
    rules[index].rhs.push(rhs);
  }
}

/// Populates one alternative's symbol list from `node`: a bare
/// `Sequence` contributes one symbol per child, anything else
/// contributes a single symbol.
fn populate_rhs(rhs: &mut Rhs, node: &Ebnf, rules: &mut Vec<Rule>, rule_name: &str) {
  if let Ebnf::Sequence(children) = node {
    for child in children {
      rhs.push(populate_symbol(child, rules, rule_name));
    }
  } else {
    rhs.push(populate_symbol(node, rules, rule_name));
  }
}

/// Resolves one RHS position to a [`Symbol`], introducing a fresh
/// nonterminal (and its rules) for any quantifier or nested alternation.
fn populate_symbol(node: &Ebnf, rules: &mut Vec<Rule>, rule_name: &str) -> Symbol {
  match node {
    Ebnf::Symbol(EbnfSymbol::Terminal(i)) => Symbol::Terminal(*i),
    Ebnf::Symbol(EbnfSymbol::Nonterminal(i)) => Symbol::Nonterminal(*i),

    Ebnf::Sequence(_) => unreachable!("a Sequence can only appear as a rule's or OneOf's direct child"),

    // `E?` -> `E' : E | 0`
    Ebnf::ZeroOrOne(child) => {
      let index = rules.len();
      rules.push(Rule { lhs: create_sub_rule_name(rule_name, rules), rhs: Vec::new() });
      populate_rule(rules, index, child);
      rules[index].rhs.push(vec![Symbol::Epsilon]);
      Symbol::Nonterminal(index)
    }

    // `E*` -> `E' : E E' | 0`
    Ebnf::ZeroOrMore(child) => {
      let index = rules.len();
      rules.push(Rule { lhs: create_sub_rule_name(rule_name, rules), rhs: Vec::new() });
      populate_rule(rules, index, child);
      for alt in rules[index].rhs.iter_mut() {
        alt.push(Symbol::Nonterminal(index));
      }
      rules[index].rhs.push(vec![Symbol::Epsilon]);
      Symbol::Nonterminal(index)
    }

    // `E+` -> `E' : E E'' ; E'' : E E'' | 0`
    Ebnf::OneOrMore(child) => {
      let index = rules.len();
      rules.push(Rule { lhs: create_sub_rule_name(rule_name, rules), rhs: Vec::new() });
      let next_index = rules.len();
      rules.push(Rule { lhs: create_sub_rule_name(rule_name, rules), rhs: Vec::new() });

      populate_rule(rules, index, child);
      for alt in rules[index].rhs.iter_mut() {
        alt.push(Symbol::Nonterminal(next_index));
      }
      let repeated = rules[index].rhs.clone();
      rules[next_index].rhs = repeated;
      rules[next_index].rhs.push(vec![Symbol::Epsilon]);
      Symbol::Nonterminal(index)
    }

    // Nested `(a | b)` -> a fresh nonterminal with one alternative per arm.
    Ebnf::OneOf(_) => {
      let index = rules.len();
      rules.push(Rule { lhs: create_sub_rule_name(rule_name, rules), rhs: Vec::new() });
      populate_rule(rules, index, node);
      Symbol::Nonterminal(index)
    }
  }
}
