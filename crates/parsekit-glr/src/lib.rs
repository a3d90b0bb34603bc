//! A multi-entry GLR table ([`GlrTable`]) built over the same LR(0)
//! automaton [`parsekit_lr`] provides, and an ambiguity-tolerant,
//! graph-structured-stack driver that forks instead of failing on
//! shift/reduce and reduce/reduce conflicts.

mod driver;
mod table;

pub use driver::{ParseItem, ParseSession};
pub use table::{Action, GlrTable};
