//! Regex parsing and compilation: text pattern -> AST -> Thompson NFA ->
//! minimized DFA -> longest-match multi-pattern [`Matcher`].

mod ast;
mod dfa;
mod encoding;
mod matcher;
mod nfa;
mod parser;

pub use ast::Ast;
pub use dfa::Dfa;
pub use encoding::{Encoding, INVALID_CODE_POINT};
pub use matcher::{Match, Matcher};
pub use nfa::{Nfa, State as NfaState};
pub use parser::parse;
