//! The BNF grammar model ([`Grammar`]), its FIRST/FOLLOW/nullable
//! fixed-point ([`Grammar::compute_sets`]), and the EBNF-to-BNF
//! normalizer ([`EbnfGrammar::normalize`]).

mod ebnf;
mod grammar;

pub use ebnf::{Ebnf, EbnfGrammar, EbnfRule, EbnfSymbol};
pub use grammar::{Grammar, Rhs, Rule, Symbol, SymbolSets};
