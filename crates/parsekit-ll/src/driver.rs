use std::collections::HashMap;

use parsekit_grammar::{Grammar, Symbol};
use parsekit_lex::{Stream, Token};

use crate::table::LlTable;

/// One slot on the parse stack: a matched terminal or a reduced
/// nonterminal, each carrying whatever `Data` its decorator or reducer
/// produced (`None` if no callback was registered for it).
pub enum ParseItem<Data> {
  Terminal { index: usize, data: Option<Data> },
  Nonterminal { index: usize, data: Option<Data> },
}

type TerminalDecorator<Data> = Box<dyn Fn(&Token) -> Data>;
type Reducer<Data> = Box<dyn Fn(&[ParseItem<Data>]) -> Data>;
type MatchListener = Box<dyn Fn(usize)>;

/// A single predictive parse driven by an [`LlTable`], with user
/// callbacks hung off grammar rules and terminals by name. Build one
/// session per parser, register callbacks, then call
/// [`ParseSession::parse`] once per input stream.
pub struct ParseSession<'g, Data> {
  grammar: &'g Grammar,
  table: &'g LlTable,
  match_listeners: HashMap<usize, MatchListener>,
  terminal_decorators: HashMap<usize, TerminalDecorator<Data>>,
  reducers: HashMap<usize, Reducer<Data>>,
}

impl<'g, Data> ParseSession<'g, Data> {
  pub fn new(grammar: &'g Grammar, table: &'g LlTable) -> Self {
    ParseSession {
      grammar,
      table,
      match_listeners: HashMap::new(),
      terminal_decorators: HashMap::new(),
      reducers: HashMap::new(),
    }
  }

  /// Calls `listener(position)` with the index, within the current
  /// production's matched symbols so far, every time `rule` shifts a
  /// terminal.
  pub fn add_match_listener(&mut self, rule: &str, listener: impl Fn(usize) + 'static) {
    if let Some(index) = self.grammar.rule_index(rule) {
      self.match_listeners.insert(index, Box::new(listener));
    }
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

  /// Drives `stream` against the start rule. Returns `None` on any
  /// parse error: a terminal mismatch, or no table entry for the
  /// current rule and lookahead.
  pub fn parse(&self, stream: &mut Stream<'_, '_>) -> Option<Data> {
    enum SymbolItem {
      Terminal(usize),
      Nonterminal(usize),
      Reduce(usize),
    }
    struct RuleItem {
      rule: usize,
      parse_stack_start: usize,
    }

    let mut parse_stack: Vec<ParseItem<Data>> = Vec::new();
    let mut symbol_stack: Vec<SymbolItem> = vec![SymbolItem::Nonterminal(self.grammar.start_rule())];
    let mut rule_stack: Vec<RuleItem> = Vec::new();

    while let Some(symbol_item) = symbol_stack.pop() {
      match symbol_item {
        SymbolItem::Terminal(index) => {
          let current_rule = rule_stack.last()?.rule;
          let parse_stack_start = rule_stack.last()?.parse_stack_start;
          let current_symbol = parse_stack.len() - parse_stack_start;

          if stream.next_token().value != index {
            return None;
          }

          let data = self.terminal_decorators.get(&index).map(|decorate| decorate(stream.next_token()));
          parse_stack.push(ParseItem::Terminal { index, data });
          if let Some(listener) = self.match_listeners.get(&current_rule) {
            listener(current_symbol);
          }
          stream.consume_token();
        }

        SymbolItem::Nonterminal(next_rule) => {
          let next_rhs = self.table.rhs(next_rule, stream.next_token().value)?;

          // Always track the active rule, not just ones with a reducer:
          // match listeners need `current_rule`/`current_symbol` too.
          rule_stack.push(RuleItem { rule: next_rule, parse_stack_start: parse_stack.len() });
          symbol_stack.push(SymbolItem::Reduce(next_rule));

          let symbols = &self.grammar.rules()[next_rule].rhs[next_rhs];
          for symbol in symbols.iter().rev() {
            match symbol {
              Symbol::Terminal(t) => symbol_stack.push(SymbolItem::Terminal(*t)),
              Symbol::Nonterminal(n) => symbol_stack.push(SymbolItem::Nonterminal(*n)),
              Symbol::Epsilon => {}
            }
          }
        }

        SymbolItem::Reduce(current_rule) => {
          let parse_stack_start = rule_stack.last()?.parse_stack_start;
          if let Some(reducer) = self.reducers.get(&current_rule) {
            let data = reducer(&parse_stack[parse_stack_start..]);
            parse_stack.truncate(parse_stack_start);
            parse_stack.push(ParseItem::Nonterminal { index: current_rule, data: Some(data) });
          }
          rule_stack.pop();
        }
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
  use parsekit_grammar::{EbnfGrammar, EbnfRule, EbnfSymbol, Rule};
  use parsekit_lex::{Configuration, Pattern, Tokenizer};
  use std::cell::RefCell;
  use std::rc::Rc;

  fn build_anbn() -> (Grammar, LlTable) {
    // S : a S b | 0
    let grammar = Grammar::new(
      vec!["a".into(), "b".into(), "end".into()],
      vec![
        Rule {
          lhs: "S".into(),
          rhs: vec![
            vec![Symbol::Terminal(0), Symbol::Nonterminal(0), Symbol::Terminal(1)],
            vec![Symbol::Epsilon],
          ],
        },
      ],
      0,
    );
    let table = LlTable::build(&grammar).unwrap();
    (grammar, table)
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
  fn parses_balanced_nesting_to_end_of_input() {
    let (grammar, table) = build_anbn();
    let tok = tokenizer();
    let mut stream = tok.stream("aabb");
    let session: ParseSession<()> = ParseSession::new(&grammar, &table);
    session.parse(&mut stream);
    assert!(stream.next_token().is_end());
  }

  #[test]
  fn match_listener_reports_position_within_the_production() {
    // S : a b c, a flat production so positions count 0, 1, 2 in order.
    let grammar = Grammar::new(
      vec!["a".into(), "b".into(), "c".into()],
      vec![Rule {
        lhs: "S".into(),
        rhs: vec![vec![Symbol::Terminal(0), Symbol::Terminal(1), Symbol::Terminal(2)]],
      }],
      0,
    );
    let table = LlTable::build(&grammar).unwrap();
    let tok = Tokenizer::new(vec![Configuration {
      patterns: vec![
        Pattern { name: "a".into(), regex: "a".into(), value: Some(0) },
        Pattern { name: "b".into(), regex: "b".into(), value: Some(1) },
        Pattern { name: "c".into(), regex: "c".into(), value: Some(2) },
      ],
    }])
    .unwrap();
    let mut stream = tok.stream("abc");

    let positions = Rc::new(RefCell::new(Vec::new()));
    let positions_clone = positions.clone();
    let mut session: ParseSession<()> = ParseSession::new(&grammar, &table);
    session.add_match_listener("S", move |pos| positions_clone.borrow_mut().push(pos));

    session.parse(&mut stream);
    assert!(stream.next_token().is_end());
    assert_eq!(*positions.borrow(), vec![0, 1, 2]);
  }

  #[test]
  fn reducers_build_a_value_bottom_up() {
    let (grammar, table) = build_anbn();
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
    assert_eq!(result, Some(2)); // two "a"s counted, one per nesting level
  }

  #[test]
  fn an_unrecognized_token_fails_the_parse() {
    let (grammar, table) = build_anbn();
    let tok = tokenizer();
    let mut stream = tok.stream("ac"); // "c" matches no pattern at all
    let session: ParseSession<()> = ParseSession::new(&grammar, &table);
    assert!(session.parse(&mut stream).is_none());
  }

  #[test]
  fn normalized_ebnf_grammar_drives_the_same_ll1_table() {
    // S : a? b  -- normalizes to S : S.1 b ; S.1 : a | 0
    let ebnf = EbnfGrammar::new(
      vec!["a".into(), "b".into()],
      vec![EbnfRule {
        lhs: "S".into(),
        rhs: parsekit_grammar::Ebnf::Sequence(vec![
          parsekit_grammar::Ebnf::ZeroOrOne(Box::new(parsekit_grammar::Ebnf::Symbol(EbnfSymbol::Terminal(0)))),
          parsekit_grammar::Ebnf::Symbol(EbnfSymbol::Terminal(1)),
        ]),
      }],
      0,
    );
    let grammar = ebnf.normalize();
    let table = LlTable::build(&grammar).unwrap();

    let tok = Tokenizer::new(vec![Configuration {
      patterns: vec![
        Pattern { name: "a".into(), regex: "a".into(), value: Some(0) },
        Pattern { name: "b".into(), regex: "b".into(), value: Some(1) },
      ],
    }])
    .unwrap();

    let session: ParseSession<()> = ParseSession::new(&grammar, &table);
    let mut stream = tok.stream("ab");
    session.parse(&mut stream);
    assert!(stream.next_token().is_end());

    let mut stream = tok.stream("b");
    session.parse(&mut stream);
    assert!(stream.next_token().is_end());
  }
}
