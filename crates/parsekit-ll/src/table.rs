use std::collections::BTreeSet;

use parsekit_grammar::{Grammar, Symbol};
use parsekit_runtime::{Error, PResult, Table, TokenValue, ERROR_TOKEN};

/// Construction-time diagnostics for a built table, reported alongside
/// it rather than folded into the parse result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
  /// The number of rules (nonterminals) the table was built over.
  pub num_states: usize,
  /// Always 0 for a table that built successfully: `LlTable::build`
  /// fails on the first FIRST/FIRST or FIRST/FOLLOW clash it finds
  /// rather than accumulating past it.
  pub num_conflicts_seen_before_failure: usize,
}

/// The LL(1) predictive parse table: `rule x lookahead -> rhs index`.
/// Built eagerly at construction; a grammar with a FIRST/FIRST or
/// FIRST/FOLLOW clash fails with [`Error::Ll1Conflict`] rather than
/// producing a table that would silently pick one alternative.
#[derive(Debug, Clone)]
pub struct LlTable {
  table: Table<Option<usize>>,
  metrics: Metrics,
}

impl LlTable {
  pub fn build(grammar: &Grammar) -> PResult<Self> {
    let sets = grammar.compute_sets();
    let mut table = Table::new(grammar.rules().len(), grammar.terminals().len(), None);

    for (i, rule) in grammar.rules().iter().enumerate() {
      for (j, rhs) in rule.rhs.iter().enumerate() {
        // Only the leading symbol of each alternative drives prediction:
        // by construction every alternative's first symbol alone fixes
        // the lookahead set (nested nullability is already flattened out
        // by the EBNF normalizer into FIRST/FOLLOW of that one symbol).
        match rhs[0] {
          Symbol::Terminal(t) => add_entry(&mut table, i, t, j)?,
          Symbol::Nonterminal(n) => {
            add_entries(&mut table, i, &sets.first[n], j)?;
            if sets.nullable.contains(&n) {
              add_entries(&mut table, i, &sets.follow[n], j)?;
            }
          }
          Symbol::Epsilon => add_entries(&mut table, i, &sets.follow[i], j)?,
        }
      }
    }

    log::debug!(
      "LL(1) table built: {} rule(s) x {} terminal(s)",
      grammar.rules().len(),
      grammar.terminals().len()
    );
    let metrics = Metrics { num_states: grammar.rules().len(), num_conflicts_seen_before_failure: 0 };
    Ok(LlTable { table, metrics })
  }

  /// The alternative to predict for `rule` on lookahead `symbol`, or
  /// `None` if there is no entry (a parse error) or `symbol` is the
  /// tokenizer's error sentinel.
  pub fn rhs(&self, rule: usize, symbol: TokenValue) -> Option<usize> {
    if symbol == ERROR_TOKEN {
      return None;
    }
    *self.table.at(rule, symbol)
  }

  pub fn metrics(&self) -> Metrics {
    self.metrics
  }
}

fn add_entry(table: &mut Table<Option<usize>>, rule: usize, symbol: usize, rhs: usize) -> PResult<()> {
  match *table.at(rule, symbol) {
    None => {
      table.set(rule, symbol, Some(rhs));
      Ok(())
    }
    Some(existing) => Err(Error::Ll1Conflict { rule, symbol, rhs1: existing, rhs2: rhs }),
  }
}

fn add_entries(
  table: &mut Table<Option<usize>>,
  rule: usize,
  symbols: &BTreeSet<usize>,
  rhs: usize,
) -> PResult<()> {
  for &symbol in symbols {
    add_entry(table, rule, symbol, rhs)?;
  }
  Ok(())
}
