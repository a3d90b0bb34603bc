use parsekit_regex::Matcher;
use parsekit_runtime::{PResult, Token, TokenValue, END_TOKEN, ERROR_TOKEN};

/// One lexical pattern within a [`Configuration`]: its regex, its name
/// (used for lookups via [`Tokenizer::pattern_value`]), and the token
/// value it produces. A pattern whose value is `None` is an `IGNORE`
/// pattern: it is matched and its text consumed, but it never reaches a
/// [`Stream`] caller as a token (whitespace, comments).
#[derive(Debug, Clone)]
pub struct Pattern {
  pub name: String,
  pub regex: String,
  pub value: Option<TokenValue>,
}

/// One lexer state: the ordered pattern list a [`Stream`] matches
/// against while in that configuration. Multiple configurations let a
/// grammar switch lexical modes (e.g. a string-literal body) via
/// [`Stream::set_configuration`].
#[derive(Debug, Clone, Default)]
pub struct Configuration {
  pub patterns: Vec<Pattern>,
}

/// A compiled multi-configuration tokenizer: one [`Matcher`] per
/// configuration, built once and then driven by any number of
/// independent [`Stream`]s.
#[derive(Debug)]
pub struct Tokenizer {
  configurations: Vec<Configuration>,
  matchers: Vec<Matcher>,
}

impl Tokenizer {
  pub fn new(configurations: Vec<Configuration>) -> PResult<Self> {
    let mut matchers = Vec::with_capacity(configurations.len());
    for config in &configurations {
      let asts: Vec<parsekit_regex::Ast> =
        config.patterns.iter().map(|p| parsekit_regex::parse(&p.regex)).collect::<PResult<_>>()?;
      matchers.push(Matcher::from_asts(&asts));
    }
    log::debug!(
      "tokenizer built with {} configuration(s), {} pattern(s) total",
      configurations.len(),
      configurations.iter().map(|c| c.patterns.len()).sum::<usize>()
    );
    Ok(Tokenizer { configurations, matchers })
  }

  /// The token value a named pattern in `configuration` produces, or
  /// `None` if no pattern by that name exists there or it is an
  /// `IGNORE` pattern.
  pub fn pattern_value(&self, name: &str, configuration: usize) -> Option<TokenValue> {
    self.configurations[configuration].patterns.iter().find(|p| p.name == name).and_then(|p| p.value)
  }

  pub fn stream<'t, 'i>(&'t self, input: &'i str) -> Stream<'t, 'i> {
    Stream::new(self, input)
  }
}

/// A lexing cursor over one input string. Holds a one-token lookahead:
/// [`Stream::next_token`] peeks it, [`Stream::consume_token`] advances
/// past it. Once an unmatched byte produces an error token, the stream
/// latches: it keeps returning that same error token forever rather
/// than attempt to resynchronize.
#[derive(Debug)]
pub struct Stream<'t, 'i> {
  tokenizer: &'t Tokenizer,
  input: &'i [u8],
  consumed: usize,
  line: usize,
  configuration: usize,
  /// The lookahead token, computed lazily so that a caller can still
  /// [`set_configuration`](Stream::set_configuration) before the very
  /// first token is scanned.
  next: Option<Token>,
  errored: bool,
}

impl<'t, 'i> Stream<'t, 'i> {
  fn new(tokenizer: &'t Tokenizer, input: &'i str) -> Self {
    Stream {
      tokenizer,
      input: input.as_bytes(),
      consumed: 0,
      line: 1,
      configuration: 0,
      next: None,
      errored: false,
    }
  }

  pub fn configuration(&self) -> usize {
    self.configuration
  }

  pub fn set_configuration(&mut self, configuration: usize) {
    self.configuration = configuration;
  }

  pub fn next_token(&mut self) -> &Token {
    if self.next.is_none() {
      self.advance();
    }
    self.next.as_ref().unwrap()
  }

  pub fn consume_token(&mut self) {
    self.next_token();
    if !self.errored {
      self.next = None;
    }
  }

  fn advance(&mut self) {
    loop {
      if self.consumed == self.input.len() {
        self.next = Some(Token { value: END_TOKEN, start: self.consumed, line: self.line, text: String::new() });
        return;
      }

      let matcher = &self.tokenizer.matchers[self.configuration];
      match matcher.matches(self.input, self.consumed) {
        None => {
          self.next =
            Some(Token { value: ERROR_TOKEN, start: self.consumed, line: self.line, text: String::new() });
          self.errored = true;
          return;
        }
        Some(found) => {
          let start = self.consumed;
          let line = self.line;
          let text = String::from_utf8_lossy(&self.input[start..start + found.length]).into_owned();
          self.line += text.bytes().filter(|&b| b == b'\n').count();
          self.consumed += found.length;

          let pattern = &self.tokenizer.configurations[self.configuration].patterns[found.pattern];
          match pattern.value {
            None => continue, // IGNORE pattern: consumed, not surfaced
            Some(value) => {
              self.next = Some(Token { value, start, line, text });
              return;
            }
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tokenizer() -> Tokenizer {
    Tokenizer::new(vec![Configuration {
      patterns: vec![
        Pattern { name: "IGNORE".into(), regex: "[ \\t\\n]+".into(), value: None },
        Pattern { name: "if".into(), regex: "if".into(), value: Some(0) },
        Pattern { name: "ident".into(), regex: "[a-z]+".into(), value: Some(1) },
      ],
    }])
    .unwrap()
  }

  #[test]
  fn skips_ignore_patterns_between_tokens() {
    let tok = tokenizer();
    let mut stream = tok.stream("if  foo");
    assert_eq!(stream.next_token().value, 0);
    assert_eq!(stream.next_token().text, "if");
    stream.consume_token();
    assert_eq!(stream.next_token().value, 1);
    assert_eq!(stream.next_token().text, "foo");
    stream.consume_token();
    assert!(stream.next_token().is_end());
  }

  #[test]
  fn tracks_line_number_across_ignored_newlines() {
    let tok = tokenizer();
    let mut stream = tok.stream("if\n\nfoo");
    assert_eq!(stream.next_token().line, 1);
    stream.consume_token();
    assert_eq!(stream.next_token().line, 3);
  }

  #[test]
  fn unmatched_byte_latches_an_error_token() {
    let tok = tokenizer();
    let mut stream = tok.stream("if $$$");
    stream.consume_token(); // consume "if"
    assert!(stream.next_token().is_error());
    let start = stream.next_token().start;
    stream.consume_token();
    assert!(stream.next_token().is_error());
    assert_eq!(stream.next_token().start, start);
  }

  #[test]
  fn pattern_value_looks_up_by_name() {
    let tok = tokenizer();
    assert_eq!(tok.pattern_value("if", 0), Some(0));
    assert_eq!(tok.pattern_value("IGNORE", 0), None);
    assert_eq!(tok.pattern_value("missing", 0), None);
  }

  #[test]
  fn configurations_can_be_switched_mid_stream() {
    let tok = Tokenizer::new(vec![
      Configuration { patterns: vec![Pattern { name: "a".into(), regex: "a".into(), value: Some(0) }] },
      Configuration { patterns: vec![Pattern { name: "b".into(), regex: "b".into(), value: Some(0) }] },
    ])
    .unwrap();
    let mut stream = tok.stream("ab");
    assert_eq!(stream.next_token().text, "a");
    stream.consume_token();
    assert!(stream.next_token().is_error()); // "b" isn't in configuration 0

    let mut stream = tok.stream("b");
    stream.set_configuration(1);
    assert_eq!(stream.next_token().text, "b");
  }
}
