use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use parsekit_grammar::{Grammar, Symbol};
use parsekit_lex::{Stream, Token};

use crate::table::{Action, GlrTable};

/// One slot produced along a graph-structured-stack edge: a shifted
/// terminal or a reduced nonterminal. `data` is `Rc`-wrapped so a node
/// shared by several forked derivations never needs to clone the
/// decorated/reduced value itself, only the handle to it.
#[derive(Clone)]
pub enum ParseItem<Data> {
  Terminal { index: usize, data: Option<Rc<Data>> },
  Nonterminal { index: usize, data: Option<Rc<Data>> },
}

type TerminalDecorator<Data> = Box<dyn Fn(&Token) -> Data>;
type Reducer<Data> = Box<dyn Fn(&[ParseItem<Data>]) -> Data>;

/// One node of the graph-structured stack: a parser state reached by
/// one or more alternative pasts (`parents`), carrying the item(s)
/// produced along the edge that created it.
struct GssNode<Data> {
  state: usize,
  parents: Vec<Rc<GssNode<Data>>>,
  items: Vec<ParseItem<Data>>,
}

/// An ambiguity-tolerant parse driven by a [`GlrTable`]: every
/// shift/reduce and reduce/reduce conflict forks a new stack instead
/// of failing, and stacks that reach the same state after shifting the
/// same token are merged back together. [`ParseSession::parse`]
/// returns one result per surviving derivation, not just the first.
pub struct ParseSession<'g, Data> {
  grammar: &'g Grammar,
  table: &'g GlrTable,
  terminal_decorators: HashMap<usize, TerminalDecorator<Data>>,
  reducers: HashMap<usize, Reducer<Data>>,
}

impl<'g, Data> ParseSession<'g, Data> {
  pub fn new(grammar: &'g Grammar, table: &'g GlrTable) -> Self {
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

  /// Drives every live stack against `stream` one lookahead token at a
  /// time, forking on ambiguous table cells and merging stacks that
  /// land on the same state after a shift. Returns one value per
  /// accepted derivation (empty if every stack died before acceptance).
  pub fn parse(&self, stream: &mut Stream<'_, '_>) -> Vec<Option<Rc<Data>>> {
    let root = Rc::new(GssNode { state: 0, parents: Vec::new(), items: Vec::new() });
    let mut frontier: Vec<Rc<GssNode<Data>>> = vec![root];

    loop {
      let token = stream.next_token().clone();
      // The table's end-terminal column stands for true end-of-input,
      // shiftable only once the whole input has reduced back to the
      // start symbol; a latched lexer error has no column at all, so
      // every live stack simply dies against it.
      let is_end = token.is_end();
      let column = if is_end {
        Some(self.table.end_terminal())
      } else if token.value >= self.table.end_terminal() {
        None
      } else {
        Some(token.value)
      };

      let mut queue: VecDeque<Rc<GssNode<Data>>> = frontier.into_iter().collect();
      let mut shifted: Vec<Rc<GssNode<Data>>> = Vec::new();
      let mut accepted: Vec<Rc<GssNode<Data>>> = Vec::new();

      while let Some(node) = queue.pop_front() {
        if self.table.is_accepting(node.state) {
          accepted.push(node);
          continue;
        }

        let actions: Vec<Action> = match column {
          Some(col) => self.table.actions(node.state, col).to_vec(),
          None => Vec::new(),
        };

        for action in actions {
          match action {
            Action::Shift(next_state) => {
              let col = column.expect("a shift action only ever exists for a real column");
              let data = self.terminal_decorators.get(&col).map(|decorate| Rc::new(decorate(&token)));
              let item = ParseItem::Terminal { index: col, data };
              shifted.push(Rc::new(GssNode { state: next_state, parents: vec![Rc::clone(&node)], items: vec![item] }));
            }
            Action::Reduce(reduction_index) => {
              let reduction = self.table.reduction(reduction_index);
              for new_node in self.apply_reduce(&node, reduction.rule, reduction.rhs) {
                queue.push_back(new_node);
              }
            }
          }
        }
      }

      if is_end || column.is_none() {
        accepted.extend(shifted.into_iter().filter(|node| self.table.is_accepting(node.state)));
        return accepted
          .into_iter()
          .map(|node| match node.items.first() {
            Some(ParseItem::Terminal { data, .. }) | Some(ParseItem::Nonterminal { data, .. }) => data.clone(),
            None => None,
          })
          .collect();
      }

      if shifted.is_empty() {
        return Vec::new();
      }

      stream.consume_token();
      frontier = merge_by_state(shifted);
    }
  }

  /// Walks every distinct path of `rhs`'s non-epsilon symbol count back
  /// from `node`, forking at any merge point, and returns the new node
  /// created on top of each path's root.
  fn apply_reduce(&self, node: &Rc<GssNode<Data>>, rule: usize, rhs: usize) -> Vec<Rc<GssNode<Data>>> {
    let symbol_count =
      self.grammar.rules()[rule].rhs[rhs].iter().filter(|s| !matches!(s, Symbol::Epsilon)).count();

    let mut new_nodes = Vec::new();
    for (root, items) in collect_paths(node, symbol_count) {
      let goto_col = self.table.num_terminals() + rule;
      let next_state = match self.table.actions(root.state, goto_col).first() {
        Some(Action::Shift(s)) => *s,
        _ => continue,
      };

      let new_items = if let Some(reducer) = self.reducers.get(&rule) {
        vec![ParseItem::Nonterminal { index: rule, data: Some(Rc::new(reducer(&items))) }]
      } else {
        items
      };

      new_nodes.push(Rc::new(GssNode { state: next_state, parents: vec![root], items: new_items }));
    }
    new_nodes
  }
}

/// Collects every `(root, items)` pair reachable by walking exactly
/// `steps` edges back from `node`, branching once per merge point
/// along the way. `items` is the root-to-node concatenation of each
/// visited node's own items, in order.
fn collect_paths<Data>(node: &Rc<GssNode<Data>>, steps: usize) -> Vec<(Rc<GssNode<Data>>, Vec<ParseItem<Data>>)> {
  if steps == 0 {
    return vec![(Rc::clone(node), Vec::new())];
  }
  let mut results = Vec::new();
  for parent in &node.parents {
    for (root, mut items) in collect_paths(parent, steps - 1) {
      items.extend(node.items.iter().cloned());
      results.push((root, items));
    }
  }
  results
}

/// Merges stacks that reached the same state after shifting the same
/// token into a single node whose `parents` is the union of theirs;
/// their (structurally identical) shifted item is kept as-is.
fn merge_by_state<Data>(nodes: Vec<Rc<GssNode<Data>>>) -> Vec<Rc<GssNode<Data>>> {
  let mut by_state: Vec<(usize, Rc<GssNode<Data>>)> = Vec::new();
  for node in nodes {
    if let Some(slot) = by_state.iter_mut().find(|(state, _)| *state == node.state) {
      let mut parents = slot.1.parents.clone();
      parents.extend(node.parents.iter().cloned());
      slot.1 = Rc::new(GssNode { state: node.state, parents, items: slot.1.items.clone() });
    } else {
      by_state.push((node.state, node));
    }
  }
  by_state.into_iter().map(|(_, node)| node).collect()
}
