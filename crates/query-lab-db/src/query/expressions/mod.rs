//! Query expressions, aggregates and database functions.
//!
//! - [`core`] - F, Value, Func, Aggregate, Case/When, relation aggregates, arithmetic
//! - [`functions`] - Coalesce, Least, Greatest, Round and friends

pub mod core;
pub mod functions;

pub use self::core::{AggregateFunc, Expression, When};
pub use self::functions::*;
