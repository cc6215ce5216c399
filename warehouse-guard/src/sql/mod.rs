//! Query compilation.
//!
//! Expectations compile to the typed predicate nodes in [`ast`]. A
//! [`QueryRenderer`] turns those nodes, plus the report scaffolding around
//! them, into text for one [`Dialect`]. Everything dialect-specific lives in
//! [`dialect`]; nothing else in the crate writes SQL syntax.

pub mod ast;
pub mod dialect;
pub mod render;

pub use ast::{Aggregate, Operand, Predicate, RowCondition};
pub use dialect::Dialect;
pub use render::QueryRenderer;
