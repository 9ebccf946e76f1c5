//! Query expressions, aggregates, and F-objects.
//!
//! # Examples
//!
//! ```
//! use query_lab_db::query::expressions::{Expression, AggregateFunc};
//!
//! // F("price") * 0.9
//! let discounted = Expression::f("price") * Expression::value(0.9);
//!
//! // AVG("rating")
//! let avg = Expression::aggregate(AggregateFunc::Avg, Expression::col("rating"));
//! # let _ = (discounted, avg);
//! ```

use std::ops;

use crate::query::lookups::Q;
use crate::query::relations::Relation;
use crate::value::Value;

/// A query expression that produces a value in the context of a SQL query.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A column of the queried table.
    Col(String),
    /// A literal value, always bound as a parameter.
    Value(Value),
    /// A reference to an annotation of the same queryset, or to a column.
    F(String),
    /// A database function call.
    Func {
        /// Function name (e.g. "COALESCE", "ROUND").
        name: String,
        /// Function arguments.
        args: Vec<Expression>,
    },
    /// An aggregate over the rows of the queryset itself.
    Aggregate {
        /// The aggregate operation.
        func: AggregateFunc,
        /// The expression being aggregated.
        field: Box<Expression>,
        /// Whether to apply DISTINCT.
        distinct: bool,
    },
    /// A CASE ... WHEN ... THEN ... ELSE ... END expression.
    Case {
        /// The WHEN/THEN branches.
        whens: Vec<When>,
        /// The ELSE value.
        default: Option<Box<Expression>>,
    },
    /// An aggregate over the rows reached through a relation path, computed
    /// per row of the queried table.
    Related {
        /// Hops from the queried table to the aggregated table.
        path: Vec<Relation>,
        /// The aggregate operation.
        func: AggregateFunc,
        /// Column of the last table to aggregate; `None` aggregates rows.
        field: Option<String>,
        /// Whether to apply DISTINCT.
        distinct: bool,
        /// Condition on the related rows.
        filter: Option<Box<Q>>,
    },
    /// A single column read through forward relations.
    RelatedField {
        /// Hops from the queried table to the table holding the column.
        path: Vec<Relation>,
        /// The column to read.
        field: String,
    },
    /// Addition.
    Add(Box<Expression>, Box<Expression>),
    /// Subtraction.
    Sub(Box<Expression>, Box<Expression>),
    /// Multiplication.
    Mul(Box<Expression>, Box<Expression>),
    /// Division.
    Div(Box<Expression>, Box<Expression>),
}

/// Aggregate function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    /// COUNT.
    Count,
    /// SUM.
    Sum,
    /// AVG.
    Avg,
    /// MIN.
    Min,
    /// MAX.
    Max,
}

impl AggregateFunc {
    /// Returns the SQL function name for this aggregate.
    pub const fn sql_name(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// A single WHEN/THEN branch in a CASE expression.
#[derive(Debug, Clone, PartialEq)]
pub struct When {
    /// The condition for this branch.
    pub condition: Q,
    /// The value to return when the condition is met.
    pub then: Expression,
}

impl When {
    /// Creates a branch.
    pub fn new(condition: Q, then: impl Into<Expression>) -> Self {
        Self {
            condition,
            then: then.into(),
        }
    }
}

impl Expression {
    /// Creates a column reference expression.
    pub fn col(name: impl Into<String>) -> Self {
        Self::Col(name.into())
    }

    /// Creates an F-expression referencing an annotation or a column.
    pub fn f(name: impl Into<String>) -> Self {
        Self::F(name.into())
    }

    /// Creates a literal value expression.
    pub fn value(v: impl Into<Value>) -> Self {
        Self::Value(v.into())
    }

    /// Creates a function call expression.
    pub fn func(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::Func {
            name: name.into(),
            args,
        }
    }

    /// Creates an aggregate expression.
    pub fn aggregate(func: AggregateFunc, field: Expression) -> Self {
        Self::Aggregate {
            func,
            field: Box::new(field),
            distinct: false,
        }
    }

    /// `COUNT(*)` over the queryset.
    pub fn count_all() -> Self {
        Self::aggregate(AggregateFunc::Count, Self::col("*"))
    }

    /// Creates a CASE expression.
    pub fn case(whens: Vec<When>, default: Option<Expression>) -> Self {
        Self::Case {
            whens,
            default: default.map(Box::new),
        }
    }

    /// Counts the rows at the end of `path`, per row of the queryset.
    pub fn related_count(path: impl Into<Vec<Relation>>) -> Self {
        Self::Related {
            path: path.into(),
            func: AggregateFunc::Count,
            field: None,
            distinct: false,
            filter: None,
        }
    }

    /// Aggregates `field` of the rows at the end of `path`.
    pub fn related_aggregate(
        func: AggregateFunc,
        path: impl Into<Vec<Relation>>,
        field: impl Into<String>,
    ) -> Self {
        Self::Related {
            path: path.into(),
            func,
            field: Some(field.into()),
            distinct: false,
            filter: None,
        }
    }

    /// Reads `field` of the single row reached through forward relations.
    pub fn related_field(path: impl Into<Vec<Relation>>, field: impl Into<String>) -> Self {
        Self::RelatedField {
            path: path.into(),
            field: field.into(),
        }
    }

    /// Marks an aggregate as DISTINCT. Other expressions are unchanged.
    #[must_use]
    pub fn distinct(self) -> Self {
        match self {
            Self::Aggregate { func, field, .. } => Self::Aggregate {
                func,
                field,
                distinct: true,
            },
            Self::Related {
                path,
                func,
                field,
                filter,
                ..
            } => Self::Related {
                path,
                func,
                field,
                distinct: true,
                filter,
            },
            other => other,
        }
    }

    /// Restricts a related aggregate to rows matching `q`.
    /// Other expressions are unchanged.
    #[must_use]
    pub fn filtered(self, q: Q) -> Self {
        match self {
            Self::Related {
                path,
                func,
                field,
                distinct,
                ..
            } => Self::Related {
                path,
                func,
                field,
                distinct,
                filter: Some(Box::new(q)),
            },
            other => other,
        }
    }
}

impl From<Value> for Expression {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<&str> for Expression {
    fn from(v: &str) -> Self {
        Self::Value(Value::from(v))
    }
}

impl From<i64> for Expression {
    fn from(v: i64) -> Self {
        Self::Value(Value::Int(v))
    }
}

impl From<i32> for Expression {
    fn from(v: i32) -> Self {
        Self::Value(Value::from(v))
    }
}

impl From<f64> for Expression {
    fn from(v: f64) -> Self {
        Self::Value(Value::Float(v))
    }
}

impl From<bool> for Expression {
    fn from(v: bool) -> Self {
        Self::Value(Value::Bool(v))
    }
}

impl ops::Add for Expression {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::Add(Box::new(self), Box::new(rhs))
    }
}

impl ops::Sub for Expression {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::Sub(Box::new(self), Box::new(rhs))
    }
}

impl ops::Mul for Expression {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self::Mul(Box::new(self), Box::new(rhs))
    }
}

impl ops::Div for Expression {
    type Output = Self;
    fn div(self, rhs: Self) -> Self::Output {
        Self::Div(Box::new(self), Box::new(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::lookups::Lookup;

    const MOVIES: [Relation; 1] = [Relation::Reverse {
        table: "movies_movie",
        fk: "director_id",
    }];

    #[test]
    fn test_simple_constructors() {
        assert!(matches!(Expression::col("name"), Expression::Col(ref s) if s == "name"));
        assert!(matches!(Expression::f("price"), Expression::F(ref s) if s == "price"));
        assert!(matches!(Expression::value(42), Expression::Value(Value::Int(42))));
        assert_eq!(Expression::from("Linux"), Expression::Value(Value::from("Linux")));
    }

    #[test]
    fn test_count_all() {
        match Expression::count_all() {
            Expression::Aggregate { func, field, distinct } => {
                assert_eq!(func, AggregateFunc::Count);
                assert_eq!(*field, Expression::col("*"));
                assert!(!distinct);
            }
            other => panic!("Expected Aggregate, got {other:?}"),
        }
    }

    #[test]
    fn test_related_count_builders() {
        let expr = Expression::related_count(MOVIES)
            .distinct()
            .filtered(Q::filter("is_classic", Lookup::Exact(Value::from(true))));
        match expr {
            Expression::Related {
                path,
                func,
                field,
                distinct,
                filter,
            } => {
                assert_eq!(path, MOVIES.to_vec());
                assert_eq!(func, AggregateFunc::Count);
                assert!(field.is_none());
                assert!(distinct);
                assert!(filter.is_some());
            }
            other => panic!("Expected Related, got {other:?}"),
        }
    }

    #[test]
    fn test_related_aggregate_field() {
        let expr = Expression::related_aggregate(AggregateFunc::Avg, MOVIES, "rating");
        assert!(matches!(expr, Expression::Related { field: Some(ref f), .. } if f == "rating"));
    }

    #[test]
    fn test_distinct_is_noop_for_columns() {
        assert_eq!(Expression::col("x").distinct(), Expression::col("x"));
    }

    #[test]
    fn test_case_expression() {
        let expr = Expression::case(
            vec![When::new(
                Q::filter("brand", Lookup::Exact(Value::from("Asus"))),
                "Windows",
            )],
            Some(Expression::col("operation_system")),
        );
        if let Expression::Case { whens, default } = &expr {
            assert_eq!(whens.len(), 1);
            assert_eq!(whens[0].then, Expression::value("Windows"));
            assert!(default.is_some());
        } else {
            panic!("Expected Case");
        }
    }

    #[test]
    fn test_arithmetic_operators() {
        assert!(matches!(Expression::f("power") - Expression::value(0.1), Expression::Sub(_, _)));
        assert!(matches!(Expression::f("a") + Expression::f("b"), Expression::Add(_, _)));
        assert!(matches!(Expression::f("price") * Expression::value(1.1), Expression::Mul(_, _)));
        assert!(matches!(Expression::f("year") / Expression::value(100), Expression::Div(_, _)));
    }

    #[test]
    fn test_aggregate_func_sql_names() {
        assert_eq!(AggregateFunc::Count.sql_name(), "COUNT");
        assert_eq!(AggregateFunc::Sum.sql_name(), "SUM");
        assert_eq!(AggregateFunc::Avg.sql_name(), "AVG");
        assert_eq!(AggregateFunc::Min.sql_name(), "MIN");
        assert_eq!(AggregateFunc::Max.sql_name(), "MAX");
    }
}
