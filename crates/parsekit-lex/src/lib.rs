//! Multi-configuration tokenizer: named lexical patterns grouped into
//! configurations, each compiled to a [`parsekit_regex::Matcher`] and
//! driven lazily through a [`Stream`].

mod tokenizer;

pub use tokenizer::{Configuration, Pattern, Stream, Tokenizer};
pub use parsekit_runtime::{Token, TokenValue, END_TOKEN, ERROR_TOKEN};
