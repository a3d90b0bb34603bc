use std::collections::HashMap;

use parsekit_grammar::{Grammar, Symbol};
use parsekit_lex::{Stream, Token};

use crate::table::{LrTable, ParseTableEntry};

/// One slot on the parse stack: a shifted terminal or a reduced
/// nonterminal, each carrying whatever `Data` its decorator or reducer
/// produced (`None` if no callback was registered for it).
pub enum ParseItem<Data> {
  Terminal { index: usize, data: Option<Data> },
  Nonterminal { index: usize, data: Option<Data> },
}

type TerminalDecorator<Data> = Box<dyn Fn(&Token) -> Data>;
type Reducer<Data> = Box<dyn Fn(&[ParseItem<Data>]) -> Data>;

/// A single shift/reduce parse driven by an [`LrTable`], with user
/// callbacks hung off grammar rules and terminals by name. Build one
/// session per parser, register callbacks, then call
/// [`ParseSession::parse`] once per input stream.
pub struct ParseSession<'g, Data> {
  grammar: &'g Grammar,
  table: &'g LrTable,
  terminal_decorators: HashMap<usize, TerminalDecorator<Data>>,
  reducers: HashMap<usize, Reducer<Data>>,
}

impl<'g, Data> ParseSession<'g, Data> {
  pub fn new(grammar: &'g Grammar, table: &'g LrTable) -> Self {
    ParseSession { grammar, table, terminal_decorators: HashMap::new(), reducers: HashMap::new() }
  }

  pub fn add_terminal_decorator(&mut self, terminal: &str, decorator: impl Fn(&Token) -> Data + 'static) {
    if let Some(index) = self.grammar.terminal_index(terminal) {
      self.terminal_decorators.insert(index, Box::new(decorator));
    }
  }

  pub fn add_reducer(&mut self, rule: &str, reducer: impl Fn(&[ParseItem<Data>]) -> Data + 'static) {
    if let Some(index) = self.grammar.rule_index(rule) {
      self.reducers.insert(index, Box::new(reducer));
    }
  }

  /// Drives `stream` through the table starting in state 0. Returns
  /// `None` on any parse error: an unmatched byte, a table cell with no
  /// entry, or a lookahead value (end/error sentinel) outside the
  /// grammar's terminal range.
  pub fn parse(&self, stream: &mut Stream<'_, '_>) -> Option<Data> {
    struct StateItem {
      state: usize,
      parse_stack_start: usize,
    }

    let mut state_stack: Vec<StateItem> = Vec::new();
    let mut parse_stack: Vec<ParseItem<Data>> = Vec::new();
    let mut state = 0usize;

    while !self.table.is_accepting(state) {
      state_stack.push(StateItem { state, parse_stack_start: parse_stack.len() });

      // The table's end-terminal column stands for true end-of-input,
      // reached only once the whole input has reduced back to the
      // start symbol; a real lookahead past it (the latched error
      // sentinel, or anything else out of range) fails the parse.
      let token = stream.next_token();
      let column = if token.is_end() {
        self.table.end_terminal()
      } else if token.value >= self.table.end_terminal() {
        return None;
      } else {
        token.value
      };

      match self.table.entry(state, column) {
        ParseTableEntry::Shift(next_state) => {
          let data = self.terminal_decorators.get(&column).map(|decorate| decorate(stream.next_token()));
          parse_stack.push(ParseItem::Terminal { index: column, data });
          stream.consume_token();
          state = next_state;
        }

        ParseTableEntry::Reduce(reduction_index) => {
          let reduction = self.table.reduction(reduction_index);
          let rhs = &self.grammar.rules()[reduction.rule].rhs[reduction.rhs];
          for symbol in rhs {
            if !matches!(symbol, Symbol::Epsilon) {
              state_stack.pop();
            }
          }

          state = state_stack.last()?.state;
          let parse_stack_start = state_stack.last()?.parse_stack_start;

          if let Some(reducer) = self.reducers.get(&reduction.rule) {
            let data = reducer(&parse_stack[parse_stack_start..]);
            parse_stack.truncate(parse_stack_start);
            parse_stack.push(ParseItem::Nonterminal { index: reduction.rule, data: Some(data) });
          }

          let goto_col = self.table.num_terminals() + reduction.rule;
          state = match self.table.entry(state, goto_col) {
            ParseTableEntry::Shift(next_state) => next_state,
            _ => return None,
          };
        }

        ParseTableEntry::Error => return None,
      }
    }

    parse_stack.into_iter().next().and_then(|item| match item {
      ParseItem::Terminal { data, .. } | ParseItem::Nonterminal { data, .. } => data,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use parsekit_grammar::Rule;
  use parsekit_lex::{Configuration, Pattern, Tokenizer};

  // S : a S b | a b
  fn anbn_grammar() -> Grammar {
    Grammar::new(
      vec!["a".into(), "b".into()],
      vec![Rule {
        lhs: "S".into(),
        rhs: vec![
          vec![Symbol::Terminal(0), Symbol::Nonterminal(0), Symbol::Terminal(1)],
          vec![Symbol::Terminal(0), Symbol::Terminal(1)],
        ],
      }],
      0,
    )
  }

  // S : a S b | 0 -- nullable start rule: the augmented automaton must
  // still only accept after genuinely consuming the whole input, not
  // the instant the nullable alternative's item completes at state 0.
  fn nullable_anbn_grammar() -> Grammar {
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

  fn tokenizer() -> Tokenizer {
    Tokenizer::new(vec![Configuration {
      patterns: vec![
        Pattern { name: "a".into(), regex: "a".into(), value: Some(0) },
        Pattern { name: "b".into(), regex: "b".into(), value: Some(1) },
      ],
    }])
    .unwrap()
  }

  #[test]
  fn parses_balanced_nesting_to_acceptance() {
    let grammar = anbn_grammar();
    let table = crate::table::LrTable::build_slr(&grammar, &crate::config::BuildConfig::default()).unwrap();
    let tok = tokenizer();
    let mut stream = tok.stream("aabb");
    let session: ParseSession<()> = ParseSession::new(&grammar, &table);
    session.parse(&mut stream);
    assert!(stream.next_token().is_end());
  }

  #[test]
  fn accepts_only_after_the_whole_input_is_consumed_even_with_a_nullable_start_rule() {
    let grammar = nullable_anbn_grammar();
    let table = crate::table::LrTable::build_slr(&grammar, &crate::config::BuildConfig::default()).unwrap();
    let tok = tokenizer();
    let mut stream = tok.stream("aabb");
    let session: ParseSession<()> = ParseSession::new(&grammar, &table);
    session.parse(&mut stream);
    assert!(stream.next_token().is_end());
  }

  #[test]
  fn reducers_build_a_value_bottom_up() {
    let grammar = anbn_grammar();
    let table = crate::table::LrTable::build_lalr(&grammar, &crate::config::BuildConfig::default()).unwrap();
    let tok = tokenizer();
    let mut stream = tok.stream("aabb");

    let mut session: ParseSession<usize> = ParseSession::new(&grammar, &table);
    session.add_terminal_decorator("a", |_| 1usize);
    session.add_reducer("S", |items| {
      items
        .iter()
        .map(|item| match item {
          ParseItem::Terminal { data, .. } => data.unwrap_or(0),
          ParseItem::Nonterminal { data, .. } => data.unwrap_or(0),
        })
        .sum()
    });

    let result = session.parse(&mut stream);
    assert_eq!(result, Some(2));
  }

  #[test]
  fn an_unrecognized_token_fails_the_parse() {
    let grammar = anbn_grammar();
    let table = crate::table::LrTable::build_slr(&grammar, &crate::config::BuildConfig::default()).unwrap();
    let tok = tokenizer();
    let mut stream = tok.stream("ac");
    let session: ParseSession<()> = ParseSession::new(&grammar, &table);
    assert!(session.parse(&mut stream).is_none());
  }
}
