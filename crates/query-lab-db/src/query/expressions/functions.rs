//! Database functions used in annotations and updates.
//!
//! Each builder returns an [`Expression::Func`]. `GREATEST`/`LEAST` are
//! rendered as the multi-argument `MAX`/`MIN` scalars on SQLite.
//!
//! # Examples
//!
//! ```
//! use query_lab_db::query::expressions::functions::*;
//! use query_lab_db::query::expressions::Expression;
//!
//! // COALESCE(SUM(spacewalks), 0)
//! let total = coalesce(vec![Expression::col("total"), Expression::value(0)]);
//!
//! // ROUND(price, 2)
//! let rounded = round(Expression::col("price"), Some(2));
//! # let _ = (total, rounded);
//! ```

use super::core::Expression;

// ── Comparison ─────────────────────────────────────────────────────────

/// COALESCE(expr1, expr2, ...) - returns the first non-NULL argument.
pub fn coalesce(args: Vec<Expression>) -> Expression {
    Expression::func("COALESCE", args)
}

/// GREATEST(expr1, expr2, ...) - returns the largest argument.
pub fn greatest(args: Vec<Expression>) -> Expression {
    Expression::func("GREATEST", args)
}

/// LEAST(expr1, expr2, ...) - returns the smallest argument.
pub fn least(args: Vec<Expression>) -> Expression {
    Expression::func("LEAST", args)
}

// ── Math ───────────────────────────────────────────────────────────────

/// ROUND(expr) or ROUND(expr, digits).
pub fn round(expr: Expression, digits: Option<i32>) -> Expression {
    let mut args = vec![expr];
    if let Some(d) = digits {
        args.push(Expression::value(d));
    }
    Expression::func("ROUND", args)
}
