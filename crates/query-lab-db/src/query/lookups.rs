//! Query lookups and Q objects for building filters.
//!
//! [`Lookup`] is a single column comparison; [`Q`] combines lookups with AND,
//! OR and NOT and can test for related rows across a [`Relation`] path.
//!
//! # Examples
//!
//! ```
//! use query_lab_db::query::lookups::{Q, Lookup};
//! use query_lab_db::value::Value;
//!
//! // brand IN ('Asus', 'Lenovo') AND storage < 512
//! let q = Q::filter("brand", Lookup::In(vec!["Asus".into(), "Lenovo".into()]))
//!     & Q::filter("storage", Lookup::Lt(Value::from(512)));
//!
//! // NOT (title = 'no title')
//! let ranked = !Q::filter("title", Lookup::Exact(Value::from("no title")));
//! # let _ = (q, ranked);
//! ```

use std::ops;

use super::relations::Relation;
use crate::value::Value;

/// A column-level comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// `field = value`; `IS NULL` when the value is NULL.
    Exact(Value),
    /// Case-insensitive equality.
    IExact(Value),
    /// Case-sensitive substring match.
    Contains(String),
    /// Case-insensitive substring match.
    IContains(String),
    /// Membership test. An empty list matches nothing.
    In(Vec<Value>),
    /// `field > value`.
    Gt(Value),
    /// `field >= value`.
    Gte(Value),
    /// `field < value`.
    Lt(Value),
    /// `field <= value`.
    Lte(Value),
    /// Case-sensitive prefix match.
    StartsWith(String),
    /// Case-insensitive prefix match.
    IStartsWith(String),
    /// Case-sensitive suffix match.
    EndsWith(String),
    /// Case-insensitive suffix match.
    IEndsWith(String),
    /// Inclusive range (`BETWEEN low AND high`).
    Range(Value, Value),
    /// `IS NULL` when `true`, `IS NOT NULL` when `false`.
    IsNull(bool),
    /// Calendar year of a date or date-time column.
    Year(i32),
}

/// A composable query filter.
///
/// `Q` objects combine with `&` (AND), `|` (OR) and `!` (NOT).
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single column lookup. The field may name an annotation.
    Filter {
        /// The column or annotation name.
        field: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions.
    And(Vec<Q>),
    /// Logical OR of multiple conditions.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
    /// True when at least one row at the end of `path` matches `filter`.
    Related {
        /// Hops from the filtered table to the related table.
        path: Vec<Relation>,
        /// Condition on the related rows; `None` accepts any row.
        filter: Option<Box<Q>>,
    },
}

impl Q {
    /// Creates a new filter Q object.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// Requires a related row matching `filter` at the end of `path`.
    pub fn related(path: impl Into<Vec<Relation>>, filter: Self) -> Self {
        Self::Related {
            path: path.into(),
            filter: Some(Box::new(filter)),
        }
    }

    /// Requires any related row at the end of `path`.
    pub fn has_related(path: impl Into<Vec<Relation>>) -> Self {
        Self::Related {
            path: path.into(),
            filter: None,
        }
    }

    /// Returns `true` if this is an empty AND/OR.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
