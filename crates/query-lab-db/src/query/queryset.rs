//! QuerySet and Manager for building and executing database queries.
//!
//! A [`QuerySet`] is a lazy query: builder methods only change the [`Query`]
//! AST, and nothing touches the database until one of the `*_exec` methods
//! runs. [`Manager`] is the per-model entry point returned by
//! [`Model::objects`](crate::model::Model::objects).
//!
//! # Examples
//!
//! ```
//! use query_lab_db::query::compiler::{OrderBy, Query};
//! // Chaining only builds the AST; SQL is produced by `to_sql` or on execution.
//! let mut query = Query::new("movies_director");
//! query.order_by = vec![OrderBy::from("-years_of_experience")];
//! assert_eq!(query.order_by[0], OrderBy::desc("years_of_experience"));
//! ```

use std::marker::PhantomData;

use query_lab_core::{OrmError, OrmResult};

use super::compiler::{DatabaseBackendType, OrderBy, Query, SelectColumn, SqlCompiler, WhereNode};
use super::expressions::Expression;
use super::lookups::Q;
use crate::executor::DbExecutor;
use crate::model::Model;
use crate::row::{FromValue, Row};
use crate::value::Value;

/// The entry point for model-level query operations.
#[derive(Debug)]
pub struct Manager<M: Model> {
    _phantom: PhantomData<M>,
}

impl<M: Model> Default for Manager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Manager<M> {
    /// Creates a new manager.
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }

    /// Returns a new `QuerySet` over every row.
    pub fn all(&self) -> QuerySet<M> {
        QuerySet::new()
    }

    /// Returns a new `QuerySet` with the given filter applied.
    pub fn filter(&self, q: Q) -> QuerySet<M> {
        self.all().filter(q)
    }

    /// Returns a new `QuerySet` with the given exclusion applied.
    pub fn exclude(&self, q: Q) -> QuerySet<M> {
        self.all().exclude(q)
    }

    /// Returns an empty `QuerySet` that matches nothing.
    pub fn none(&self) -> QuerySet<M> {
        self.all().none()
    }
}

/// A model instance together with the full row it was read from, giving
/// access to annotation columns.
#[derive(Debug, Clone)]
pub struct Annotated<M> {
    /// The model instance.
    pub model: M,
    /// The raw row, annotations included.
    pub row: Row,
}

impl<M> Annotated<M> {
    /// Reads a column or annotation from the row.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing or has another type.
    pub fn get<T: FromValue>(&self, name: &str) -> OrmResult<T> {
        self.row.get(name)
    }
}

/// A lazy, composable database query.
///
/// Builder methods consume `self` and return the modified queryset.
pub struct QuerySet<M: Model> {
    model: PhantomData<M>,
    query: Query,
    /// Whether this queryset should return no results.
    is_none: bool,
    /// Pending update assignments.
    pending_update: Option<Vec<(String, Expression)>>,
    /// Whether this is a delete operation.
    pending_delete: bool,
}

impl<M: Model> Clone for QuerySet<M> {
    fn clone(&self) -> Self {
        Self {
            model: PhantomData,
            query: self.query.clone(),
            is_none: self.is_none,
            pending_update: self.pending_update.clone(),
            pending_delete: self.pending_delete,
        }
    }
}

impl<M: Model> std::fmt::Debug for QuerySet<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySet")
            .field("query", &self.query)
            .field("is_none", &self.is_none)
            .finish_non_exhaustive()
    }
}

impl<M: Model> QuerySet<M> {
    fn new() -> Self {
        let mut query = Query::new(M::table_name());
        query.pk = M::pk_field_name().to_string();
        Self {
            model: PhantomData,
            query,
            is_none: false,
            pending_update: None,
            pending_delete: false,
        }
    }

    /// Returns a reference to the underlying query AST.
    pub const fn query(&self) -> &Query {
        &self.query
    }

    // ── Filtering methods (lazy) ─────────────────────────────────────

    /// Adds a filter condition.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        self.query.add_where(WhereNode::from_q(&q));
        self
    }

    /// Adds an exclusion condition (NOT).
    #[must_use]
    pub fn exclude(mut self, q: Q) -> Self {
        self.query
            .add_where(WhereNode::Not(Box::new(WhereNode::from_q(&q))));
        self
    }

    /// Replaces the ordering.
    #[must_use]
    pub fn order_by(mut self, fields: Vec<OrderBy>) -> Self {
        self.query.order_by = fields;
        self
    }

    /// Reverses the current ordering, or the model's default ordering if
    /// none was set.
    #[must_use]
    pub fn reverse(mut self) -> Self {
        self.query.order_by = self.effective_ordering().iter().map(OrderBy::reversed).collect();
        self
    }

    /// Restricts the selected columns; rows are read with [`values_exec`](Self::values_exec).
    #[must_use]
    pub fn values(mut self, fields: &[&str]) -> Self {
        self.query.select = fields
            .iter()
            .map(|f| SelectColumn::Column((*f).to_string()))
            .collect();
        self
    }

    /// Adds DISTINCT to the query.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    /// Returns all objects (identity operation for chaining).
    #[must_use]
    pub fn all(self) -> Self {
        self
    }

    /// Returns an empty queryset.
    #[must_use]
    pub fn none(mut self) -> Self {
        self.is_none = true;
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.query.limit = Some(n);
        self
    }

    /// Sets the OFFSET.
    #[must_use]
    pub fn offset(mut self, n: usize) -> Self {
        self.query.offset = Some(n);
        self
    }

    /// Adds a named computed column. Filters, orderings and later
    /// annotations can refer to it by name; `F(name)` expands it.
    /// Re-using a name replaces the earlier expression.
    #[must_use]
    pub fn annotate(mut self, name: impl Into<String>, expr: Expression) -> Self {
        self.query.annotate(name, expr);
        self
    }

    /// Marks the queryset for an UPDATE of the given columns.
    #[must_use]
    pub fn update(mut self, fields: Vec<(&str, Expression)>) -> Self {
        self.pending_update = Some(
            fields
                .into_iter()
                .map(|(name, expr)| (name.to_string(), expr))
                .collect(),
        );
        self
    }

    /// Marks the queryset for deletion.
    #[must_use]
    pub fn delete(mut self) -> Self {
        self.pending_delete = true;
        self
    }

    /// The explicit ordering, else the model's default, else the primary key.
    fn effective_ordering(&self) -> Vec<OrderBy> {
        if !self.query.order_by.is_empty() {
            self.query.order_by.clone()
        } else if !M::meta().ordering.is_empty() {
            M::meta().ordering.clone()
        } else {
            vec![OrderBy::asc(M::pk_field_name())]
        }
    }

    fn none_sql(&self) -> (String, Vec<Value>) {
        let table = &self.query.table;
        (format!("SELECT \"{table}\".* FROM \"{table}\" WHERE 1=0"), vec![])
    }

    // ── SQL generation (for inspection/debugging) ────────────────────

    /// Compiles the queryset to SQL for the given backend.
    pub fn to_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        if self.is_none {
            return self.none_sql();
        }

        let compiler = SqlCompiler::new(backend);

        if let Some(ref fields) = self.pending_update {
            return compiler.compile_update(&self.query, fields);
        }

        if self.pending_delete {
            return compiler.compile_delete(&self.query);
        }

        compiler.compile_select(&self.query)
    }

    /// Compiles a COUNT query.
    ///
    /// Distinct or sliced querysets are counted through a subquery.
    pub fn count_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        let compiler = SqlCompiler::new(backend);
        if self.query.distinct || self.query.limit.is_some() || self.query.offset.is_some() {
            let (inner, params) = compiler.compile_select(&self.query);
            return (
                format!("SELECT COUNT(*) AS \"count\" FROM ({inner}) AS \"sub\""),
                params,
            );
        }
        let mut count_query = self.query.clone();
        count_query.select = vec![SelectColumn::Expression(
            Expression::count_all(),
            "count".to_string(),
        )];
        count_query.order_by.clear();
        compiler.compile_select(&count_query)
    }

    /// Compiles an EXISTS probe returning at most one row.
    pub fn exists_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        let mut exists_query = self.query.clone();
        exists_query.select = vec![SelectColumn::Expression(
            Expression::value(1),
            "__exists__".to_string(),
        )];
        exists_query.distinct = false;
        exists_query.order_by.clear();
        exists_query.limit = Some(self.query.limit.map_or(1, |l| l.min(1)));
        SqlCompiler::new(backend).compile_select(&exists_query)
    }

    /// Compiles a query to get the first result.
    pub fn first_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        let mut first_query = self.query.clone();
        first_query.order_by = self.effective_ordering();
        first_query.limit = Some(self.query.limit.map_or(1, |l| l.min(1)));
        SqlCompiler::new(backend).compile_select(&first_query)
    }

    /// Compiles a query to get the last result.
    pub fn last_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        let mut last_query = self.query.clone();
        last_query.order_by = self
            .effective_ordering()
            .iter()
            .map(OrderBy::reversed)
            .collect();
        last_query.limit = Some(1);
        SqlCompiler::new(backend).compile_select(&last_query)
    }

    /// Compiles a query for `.get()` (expects exactly one result).
    pub fn get_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        let mut get_query = self.query.clone();
        // two rows are enough to detect MultipleObjectsReturned
        get_query.limit = Some(self.query.limit.map_or(2, |l| l.min(2)));
        SqlCompiler::new(backend).compile_select(&get_query)
    }

    /// Compiles an aggregate query over the filtered rows.
    ///
    /// Ordering is dropped; aggregates may refer to annotations by name.
    pub fn aggregate_sql(
        &self,
        aggregates: Vec<(String, Expression)>,
        backend: DatabaseBackendType,
    ) -> (String, Vec<Value>) {
        let mut agg_query = self.query.clone();
        agg_query.select = aggregates
            .into_iter()
            .map(|(alias, expr)| SelectColumn::Expression(expr, alias))
            .collect();
        agg_query.order_by.clear();
        agg_query.distinct = false;
        SqlCompiler::new(backend).compile_select(&agg_query)
    }

    // ── Async execution methods ───────────────────────────────────────

    /// Executes the query and returns all matching model instances.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be converted.
    pub async fn execute_query(&self, db: &dyn DbExecutor) -> OrmResult<Vec<M>> {
        if self.is_none {
            return Ok(Vec::new());
        }

        let (sql, params) = self.to_sql(db.backend_type());
        let rows = db.query(&sql, &params).await?;
        rows.iter().map(M::from_row).collect()
    }

    /// Executes the query and keeps each row next to its model, so that
    /// annotations can be read.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be converted.
    pub async fn execute_annotated(&self, db: &dyn DbExecutor) -> OrmResult<Vec<Annotated<M>>> {
        if self.is_none {
            return Ok(Vec::new());
        }

        let (sql, params) = self.to_sql(db.backend_type());
        let rows = db.query(&sql, &params).await?;
        rows.into_iter()
            .map(|row| {
                Ok(Annotated {
                    model: M::from_row(&row)?,
                    row,
                })
            })
            .collect()
    }

    /// Executes a `.values(...)` query and returns the raw rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn values_exec(&self, db: &dyn DbExecutor) -> OrmResult<Vec<Row>> {
        if self.is_none {
            return Ok(Vec::new());
        }

        let (sql, params) = self.to_sql(db.backend_type());
        db.query(&sql, &params).await
    }

    /// Returns the count of matching records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_exec(&self, db: &dyn DbExecutor) -> OrmResult<i64> {
        if self.is_none {
            return Ok(0);
        }

        let (sql, params) = self.count_sql(db.backend_type());
        let rows = db.query(&sql, &params).await?;
        match rows.into_iter().next() {
            Some(row) => row.get_by_index::<i64>(0),
            None => Ok(0),
        }
    }

    /// Returns whether any records match the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn exists_exec(&self, db: &dyn DbExecutor) -> OrmResult<bool> {
        if self.is_none {
            return Ok(false);
        }

        let (sql, params) = self.exists_sql(db.backend_type());
        let rows = db.query(&sql, &params).await?;
        Ok(!rows.is_empty())
    }

    /// Returns the first record in order, or `None` if no records match.
    ///
    /// Unordered querysets use the model's default ordering, then the
    /// primary key.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be converted.
    pub async fn first_exec(&self, db: &dyn DbExecutor) -> OrmResult<Option<M>> {
        Ok(self.first_annotated(db).await?.map(|a| a.model))
    }

    /// Like [`first_exec`](Self::first_exec), keeping the row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be converted.
    pub async fn first_annotated(&self, db: &dyn DbExecutor) -> OrmResult<Option<Annotated<M>>> {
        if self.is_none {
            return Ok(None);
        }

        let (sql, params) = self.first_sql(db.backend_type());
        let rows = db.query(&sql, &params).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(Annotated {
                model: M::from_row(&row)?,
                row,
            })),
            None => Ok(None),
        }
    }

    /// Returns the last record in order, or `None` if no records match.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be converted.
    pub async fn last_exec(&self, db: &dyn DbExecutor) -> OrmResult<Option<M>> {
        if self.is_none {
            return Ok(None);
        }

        let (sql, params) = self.last_sql(db.backend_type());
        let rows = db.query(&sql, &params).await?;
        rows.first().map(M::from_row).transpose()
    }

    /// Returns the single matching record.
    ///
    /// # Errors
    ///
    /// Returns `DoesNotExist` if no records match, or
    /// `MultipleObjectsReturned` if more than one record matches.
    pub async fn get_exec(&self, db: &dyn DbExecutor) -> OrmResult<M> {
        let model_name = M::meta().model_name;
        let not_found =
            || OrmError::DoesNotExist(format!("{model_name} matching query does not exist."));
        if self.is_none {
            return Err(not_found());
        }

        let (sql, params) = self.get_sql(db.backend_type());
        let rows = db.query(&sql, &params).await?;
        match rows.len() {
            0 => Err(not_found()),
            1 => M::from_row(&rows[0]),
            n => Err(OrmError::MultipleObjectsReturned(format!(
                "get() returned more than one {model_name} -- it returned {n}!"
            ))),
        }
    }

    /// Computes aggregates over the matching rows and returns them as one row
    /// keyed by alias.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn aggregate_exec(
        &self,
        db: &dyn DbExecutor,
        aggregates: Vec<(&str, Expression)>,
    ) -> OrmResult<Row> {
        let aggregates: Vec<(String, Expression)> = aggregates
            .into_iter()
            .map(|(alias, expr)| (alias.to_string(), expr))
            .collect();
        if self.is_none {
            let (names, values): (Vec<String>, Vec<Value>) = aggregates
                .iter()
                .map(|(alias, _)| (alias.clone(), Value::Null))
                .unzip();
            return Ok(Row::new(names, values));
        }

        let (sql, params) = self.aggregate_sql(aggregates, db.backend_type());
        db.query_one(&sql, &params).await
    }

    /// Runs an UPDATE and returns the number of rows affected.
    ///
    /// The queryset must have been prepared with `.update(fields)`.
    ///
    /// # Errors
    ///
    /// Returns an error if no update is pending or the statement fails.
    pub async fn update_exec(&self, db: &dyn DbExecutor) -> OrmResult<u64> {
        if self.is_none {
            return Ok(0);
        }

        if self.pending_update.is_none() {
            return Err(OrmError::DatabaseError(
                "No pending update fields. Call .update(fields) before .update_exec()".to_string(),
            ));
        }

        let (sql, params) = self.to_sql(db.backend_type());
        db.execute_sql(&sql, &params).await
    }

    /// Runs a DELETE and returns the number of rows affected.
    ///
    /// The queryset must have been prepared with `.delete()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the queryset is not marked for deletion or the
    /// statement fails.
    pub async fn delete_exec(&self, db: &dyn DbExecutor) -> OrmResult<u64> {
        if self.is_none {
            return Ok(0);
        }

        if !self.pending_delete {
            return Err(OrmError::DatabaseError(
                "QuerySet is not marked for deletion. Call .delete() before .delete_exec()"
                    .to_string(),
            ));
        }

        let (sql, params) = self.to_sql(db.backend_type());
        db.execute_sql(&sql, &params).await
    }
}
