//! Query building, compilation, and execution.
//!
//! - [`lookups`] - Q objects and lookup types for filtering
//! - [`expressions`] - F-objects, aggregates, and computed expressions
//! - [`relations`] - relation paths and many-to-many junction tables
//! - [`compiler`] - Query AST and SQL compilation
//! - [`queryset`] - QuerySet and Manager for lazy query building

pub mod compiler;
pub mod expressions;
pub mod lookups;
pub mod queryset;
pub mod relations;

pub use compiler::{DatabaseBackendType, OrderBy, Query, SelectColumn, SqlCompiler, WhereNode};
pub use expressions::{AggregateFunc, Expression, When};
pub use lookups::{Lookup, Q};
pub use queryset::{Annotated, Manager, QuerySet};
pub use relations::{ManyToMany, Relation};
