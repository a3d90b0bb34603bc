//! Parser-construction toolkit: a text pattern compiles down through a
//! Thompson NFA and a minimized DFA into a longest-match [`Matcher`];
//! a [`Tokenizer`] built on top of it drives named, multi-configuration
//! lexical streams; an EBNF grammar normalizes to plain BNF and derives
//! FIRST/FOLLOW/nullable; and that BNF grammar feeds LL(1), SLR(1),
//! LALR(1) or GLR table builders and their matching drivers.

pub use parsekit_runtime::{Error, LrConflictKind, PResult, Table, Token, TokenValue, END_TOKEN, ERROR_TOKEN};

pub use parsekit_regex::{Ast, Dfa, Encoding, Match, Matcher, NfaState, INVALID_CODE_POINT};

pub use parsekit_lex::{Configuration, Pattern, Stream, Tokenizer};

pub use parsekit_grammar::{Ebnf, EbnfGrammar, EbnfRule, EbnfSymbol, Grammar, Rhs, Rule, Symbol, SymbolSets};

pub use parsekit_ll::{LlTable, ParseSession as LlParseSession};
pub use parsekit_ll::Metrics as LlMetrics;
pub use parsekit_ll::ParseItem as LlParseItem;

pub use parsekit_lr::{BuildConfig, LrTable, Metrics, ParseSession as LrParseSession};
pub use parsekit_lr::ParseItem as LrParseItem;

pub use parsekit_glr::{GlrTable, ParseSession as GlrParseSession};
pub use parsekit_glr::ParseItem as GlrParseItem;
