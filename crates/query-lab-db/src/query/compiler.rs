//! SQL query AST and compiler.
//!
//! [`Query`] is the AST a [`QuerySet`](super::QuerySet) builds; [`SqlCompiler`]
//! turns it into parameterized SQL. Parameters are collected in the order
//! their `?` placeholders appear in the text.
//!
//! Columns are always qualified with the table name. When a query carries
//! annotations the table is replaced by a derived table of the same name:
//!
//! ```text
//! SELECT "t".* FROM (SELECT "t".*, <expr> AS "alias" FROM "t") AS "t" WHERE "t"."alias" > ?
//! ```
//!
//! so filters and orderings can use annotation names like ordinary columns.

use super::expressions::Expression;
use super::lookups::{Lookup, Q};
use super::relations::Relation;
use crate::value::Value;

/// The type of database backend, used by the compiler to generate
/// backend-specific SQL syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackendType {
    /// SQLite (uses `?` placeholders).
    SQLite,
}

/// A column ordering direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The column or annotation to order by.
    pub column: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl OrderBy {
    /// Creates an ascending order.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Creates a descending order.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            column: self.column.clone(),
            descending: !self.descending,
        }
    }
}

/// `"name"` is ascending, `"-name"` descending.
impl From<&str> for OrderBy {
    fn from(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(column) => Self::desc(column),
            None => Self::asc(spec),
        }
    }
}

/// A column to select in a query.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectColumn {
    /// A column or annotation name.
    Column(String),
    /// An expression with an alias.
    Expression(Expression, String),
    /// All columns, annotations included.
    Star,
}

/// A WHERE clause node in the query AST.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereNode {
    /// A single condition.
    Condition {
        /// The column or annotation name.
        column: String,
        /// The lookup type.
        lookup: Lookup,
    },
    /// Logical AND of conditions.
    And(Vec<WhereNode>),
    /// Logical OR of conditions.
    Or(Vec<WhereNode>),
    /// Logical NOT of a condition.
    Not(Box<WhereNode>),
    /// EXISTS over the rows at the end of a relation path.
    Related {
        /// Hops from the current table.
        path: Vec<Relation>,
        /// Condition on the related rows.
        filter: Option<Box<WhereNode>>,
    },
}

impl WhereNode {
    /// Converts a `Q` object into a `WhereNode`.
    pub fn from_q(q: &Q) -> Self {
        match q {
            Q::Filter { field, lookup } => Self::Condition {
                column: field.clone(),
                lookup: lookup.clone(),
            },
            Q::And(children) => Self::And(children.iter().map(Self::from_q).collect()),
            Q::Or(children) => Self::Or(children.iter().map(Self::from_q).collect()),
            Q::Not(inner) => Self::Not(Box::new(Self::from_q(inner))),
            Q::Related { path, filter } => Self::Related {
                path: path.clone(),
                filter: filter.as_deref().map(|f| Box::new(Self::from_q(f))),
            },
        }
    }
}

/// The query AST behind a queryset.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The main table name.
    pub table: String,
    /// The primary key column, used by filtered UPDATE/DELETE subselects.
    pub pk: String,
    /// Columns to select.
    pub select: Vec<SelectColumn>,
    /// WHERE clause.
    pub where_clause: Option<WhereNode>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT.
    pub limit: Option<usize>,
    /// OFFSET.
    pub offset: Option<usize>,
    /// DISTINCT flag.
    pub distinct: bool,
    /// Named computed columns, in the order they were added.
    pub annotations: Vec<(String, Expression)>,
}

impl Query {
    /// Creates a new query for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            pk: "id".to_string(),
            select: vec![SelectColumn::Star],
            where_clause: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            annotations: Vec::new(),
        }
    }

    /// Adds or replaces an annotation.
    pub fn annotate(&mut self, name: impl Into<String>, expr: Expression) {
        let name = name.into();
        match self.annotations.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = expr,
            None => self.annotations.push((name, expr)),
        }
    }

    /// ANDs a condition onto the WHERE clause.
    pub fn add_where(&mut self, node: WhereNode) {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => WhereNode::And(vec![existing, node]),
            None => node,
        });
    }

    /// Returns `true` if UPDATE/DELETE must select target rows by primary key
    /// instead of filtering the table directly.
    fn needs_pk_subselect(&self) -> bool {
        !self.annotations.is_empty() || self.limit.is_some() || self.offset.is_some()
    }
}

/// Per-statement compilation state.
struct Ctx {
    params: Vec<Value>,
    next_alias: usize,
}

impl Ctx {
    const fn new() -> Self {
        Self {
            params: Vec::new(),
            next_alias: 0,
        }
    }

    fn alias(&mut self) -> String {
        let alias = format!("r{}", self.next_alias);
        self.next_alias += 1;
        alias
    }
}

/// Where column references resolve: the table alias, and the annotations
/// that names expand into instead of being read as derived-table columns.
#[derive(Clone, Copy)]
struct Scope<'s> {
    alias: &'s str,
    inline: &'s [(String, Expression)],
}

impl<'s> Scope<'s> {
    const fn table(alias: &'s str) -> Self {
        Self { alias, inline: &[] }
    }
}

/// The SQL compiler translates a [`Query`] AST into parameterized SQL.
pub struct SqlCompiler {
    backend: DatabaseBackendType,
}

impl SqlCompiler {
    /// Creates a new compiler for the given backend type.
    pub const fn new(backend: DatabaseBackendType) -> Self {
        Self { backend }
    }

    /// Returns the backend's positional parameter placeholder.
    pub const fn placeholder(&self) -> &'static str {
        match self.backend {
            DatabaseBackendType::SQLite => "?",
        }
    }

    fn bind(&self, ctx: &mut Ctx, value: Value) -> String {
        ctx.params.push(value);
        self.placeholder().to_string()
    }

    // ── Statements ───────────────────────────────────────────────────

    /// Compiles a SELECT query into SQL and parameters.
    pub fn compile_select(&self, query: &Query) -> (String, Vec<Value>) {
        let mut ctx = Ctx::new();
        let sql = self.select_sql(&mut ctx, query);
        (sql, ctx.params)
    }

    /// Compiles an INSERT statement.
    pub fn compile_insert(&self, table: &str, fields: &[(&str, Value)]) -> (String, Vec<Value>) {
        if fields.is_empty() {
            return (format!("INSERT INTO \"{table}\" DEFAULT VALUES"), Vec::new());
        }
        let mut ctx = Ctx::new();
        let columns: Vec<String> = fields.iter().map(|(name, _)| quote(name)).collect();
        let placeholders: Vec<String> = fields
            .iter()
            .map(|(_, val)| self.bind(&mut ctx, val.clone()))
            .collect();
        let sql = format!(
            "INSERT INTO \"{table}\" ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        (sql, ctx.params)
    }

    /// Compiles a multi-row INSERT returning the primary key of every row.
    pub fn compile_bulk_insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<Value>],
        returning: &str,
    ) -> (String, Vec<Value>) {
        let (sql, params) = self.multi_row_insert("INSERT INTO", table, columns, rows);
        (format!("{sql} RETURNING \"{returning}\""), params)
    }

    /// Compiles an INSERT of junction rows that skips rows already present.
    pub fn compile_link_insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<Value>],
    ) -> (String, Vec<Value>) {
        self.multi_row_insert("INSERT OR IGNORE INTO", table, columns, rows)
    }

    fn multi_row_insert(
        &self,
        verb: &str,
        table: &str,
        columns: &[&str],
        rows: &[Vec<Value>],
    ) -> (String, Vec<Value>) {
        let mut ctx = Ctx::new();
        let cols: Vec<String> = columns.iter().map(|c| quote(c)).collect();
        let tuples: Vec<String> = rows
            .iter()
            .map(|row| {
                let phs: Vec<String> = row.iter().map(|v| self.bind(&mut ctx, v.clone())).collect();
                format!("({})", phs.join(", "))
            })
            .collect();
        let sql = format!(
            "{verb} \"{table}\" ({}) VALUES {}",
            cols.join(", "),
            tuples.join(", ")
        );
        (sql, ctx.params)
    }

    /// Compiles an UPDATE of the rows `query` selects.
    ///
    /// SET expressions may reference annotations through `F`; those are
    /// expanded in place since the table being updated has no such columns.
    pub fn compile_update(
        &self,
        query: &Query,
        fields: &[(String, Expression)],
    ) -> (String, Vec<Value>) {
        let mut ctx = Ctx::new();
        let scope = Scope {
            alias: &query.table,
            inline: &query.annotations,
        };
        let set_parts: Vec<String> = fields
            .iter()
            .map(|(name, expr)| format!("{} = {}", quote(name), self.expr(&mut ctx, scope, expr)))
            .collect();
        let mut sql = format!("UPDATE \"{}\" SET {}", query.table, set_parts.join(", "));
        self.push_row_filter(&mut ctx, query, &mut sql);
        (sql, ctx.params)
    }

    /// Compiles a DELETE of the rows `query` selects.
    pub fn compile_delete(&self, query: &Query) -> (String, Vec<Value>) {
        let mut ctx = Ctx::new();
        let mut sql = format!("DELETE FROM \"{}\"", query.table);
        self.push_row_filter(&mut ctx, query, &mut sql);
        (sql, ctx.params)
    }

    /// Appends the WHERE clause of an UPDATE or DELETE.
    fn push_row_filter(&self, ctx: &mut Ctx, query: &Query, sql: &mut String) {
        let table = &query.table;
        if query.needs_pk_subselect() {
            let mut ids = query.clone();
            ids.select = vec![SelectColumn::Column(query.pk.clone())];
            ids.distinct = false;
            if ids.limit.is_none() && ids.offset.is_none() {
                ids.order_by.clear();
            }
            let inner = self.select_sql(ctx, &ids);
            sql.push_str(&format!(" WHERE \"{table}\".\"{}\" IN ({inner})", query.pk));
        } else if let Some(ref where_clause) = query.where_clause {
            sql.push_str(" WHERE ");
            self.where_node(ctx, Scope::table(table), where_clause, sql);
        }
    }

    fn select_sql(&self, ctx: &mut Ctx, query: &Query) -> String {
        let table = &query.table;
        let scope = Scope::table(table);
        let mut sql = String::from("SELECT ");
        if query.distinct {
            sql.push_str("DISTINCT ");
        }

        let select_parts: Vec<String> = if query.select.is_empty() {
            vec![format!("\"{table}\".*")]
        } else {
            query
                .select
                .iter()
                .map(|col| match col {
                    SelectColumn::Column(name) => qualify(table, name),
                    SelectColumn::Expression(expr, alias) => {
                        format!("{} AS {}", self.expr(ctx, scope, expr), quote(alias))
                    }
                    SelectColumn::Star => format!("\"{table}\".*"),
                })
                .collect()
        };
        sql.push_str(&select_parts.join(", "));

        sql.push_str(" FROM ");
        let source = self.source_sql(ctx, query);
        sql.push_str(&source);

        if let Some(ref where_clause) = query.where_clause {
            sql.push_str(" WHERE ");
            self.where_node(ctx, scope, where_clause, &mut sql);
        }

        if !query.order_by.is_empty() {
            let orders: Vec<String> = query
                .order_by
                .iter()
                .map(|o| {
                    let dir = if o.descending { "DESC" } else { "ASC" };
                    format!("{} {dir}", qualify(table, &o.column))
                })
                .collect();
            sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
        }

        match (query.limit, query.offset) {
            (Some(limit), offset) => {
                sql.push_str(&format!(" LIMIT {limit}"));
                if let Some(offset) = offset {
                    sql.push_str(&format!(" OFFSET {offset}"));
                }
            }
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        sql
    }

    /// The FROM source: the bare table, or the annotated derived table.
    fn source_sql(&self, ctx: &mut Ctx, query: &Query) -> String {
        let table = &query.table;
        if query.annotations.is_empty() {
            return quote(table);
        }
        let mut parts = vec![format!("\"{table}\".*")];
        for (i, (alias, expr)) in query.annotations.iter().enumerate() {
            let scope = Scope {
                alias: table,
                inline: &query.annotations[..i],
            };
            let expr_sql = self.expr(ctx, scope, expr);
            parts.push(format!("{expr_sql} AS {}", quote(alias)));
        }
        format!("(SELECT {} FROM \"{table}\") AS \"{table}\"", parts.join(", "))
    }

    // ── WHERE ────────────────────────────────────────────────────────

    fn where_node(&self, ctx: &mut Ctx, scope: Scope<'_>, node: &WhereNode, sql: &mut String) {
        match node {
            WhereNode::Condition { column, lookup } => {
                let col = self.column(ctx, scope, column);
                self.lookup(ctx, &col, lookup, sql);
            }
            WhereNode::And(children) => self.junction(ctx, scope, children, " AND ", "1=1", sql),
            WhereNode::Or(children) => self.junction(ctx, scope, children, " OR ", "1=0", sql),
            WhereNode::Not(inner) => {
                sql.push_str("NOT (");
                self.where_node(ctx, scope, inner, sql);
                sql.push(')');
            }
            WhereNode::Related { path, filter } => {
                let hops = self.hops(ctx, scope.alias, path);
                sql.push_str(&format!("EXISTS (SELECT 1 FROM {}", hops.from));
                self.push_hop_conditions(ctx, &hops, filter.as_deref(), sql);
                sql.push(')');
            }
        }
    }

    fn junction(
        &self,
        ctx: &mut Ctx,
        scope: Scope<'_>,
        children: &[WhereNode],
        op: &str,
        empty: &str,
        sql: &mut String,
    ) {
        if children.is_empty() {
            sql.push_str(empty);
            return;
        }
        sql.push('(');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                sql.push_str(op);
            }
            self.where_node(ctx, scope, child, sql);
        }
        sql.push(')');
    }

    /// Compiles a single lookup against an already-rendered column.
    fn lookup(&self, ctx: &mut Ctx, col: &str, lookup: &Lookup, sql: &mut String) {
        match lookup {
            Lookup::Exact(val) if val.is_null() => sql.push_str(&format!("{col} IS NULL")),
            Lookup::Exact(val) => {
                let ph = self.bind(ctx, val.clone());
                sql.push_str(&format!("{col} = {ph}"));
            }
            Lookup::IExact(val) => {
                let ph = self.bind(ctx, val.clone());
                sql.push_str(&format!("LOWER({col}) = LOWER({ph})"));
            }
            Lookup::Contains(s) => self.pattern(ctx, col, s, true, true, false, sql),
            Lookup::IContains(s) => self.pattern(ctx, col, s, true, true, true, sql),
            Lookup::StartsWith(s) => self.pattern(ctx, col, s, false, true, false, sql),
            Lookup::IStartsWith(s) => self.pattern(ctx, col, s, false, true, true, sql),
            Lookup::EndsWith(s) => self.pattern(ctx, col, s, true, false, false, sql),
            Lookup::IEndsWith(s) => self.pattern(ctx, col, s, true, false, true, sql),
            Lookup::In(vals) if vals.is_empty() => sql.push_str("1=0"),
            Lookup::In(vals) => {
                let phs: Vec<String> = vals.iter().map(|v| self.bind(ctx, v.clone())).collect();
                sql.push_str(&format!("{col} IN ({})", phs.join(", ")));
            }
            Lookup::Gt(val) => {
                let ph = self.bind(ctx, val.clone());
                sql.push_str(&format!("{col} > {ph}"));
            }
            Lookup::Gte(val) => {
                let ph = self.bind(ctx, val.clone());
                sql.push_str(&format!("{col} >= {ph}"));
            }
            Lookup::Lt(val) => {
                let ph = self.bind(ctx, val.clone());
                sql.push_str(&format!("{col} < {ph}"));
            }
            Lookup::Lte(val) => {
                let ph = self.bind(ctx, val.clone());
                sql.push_str(&format!("{col} <= {ph}"));
            }
            Lookup::Range(low, high) => {
                let ph_low = self.bind(ctx, low.clone());
                let ph_high = self.bind(ctx, high.clone());
                sql.push_str(&format!("{col} BETWEEN {ph_low} AND {ph_high}"));
            }
            Lookup::IsNull(true) => sql.push_str(&format!("{col} IS NULL")),
            Lookup::IsNull(false) => sql.push_str(&format!("{col} IS NOT NULL")),
            Lookup::Year(year) => {
                let ph = self.bind(ctx, Value::from(*year));
                sql.push_str(&format!("CAST(strftime('%Y', {col}) AS INTEGER) = {ph}"));
            }
        }
    }

    /// Substring/prefix/suffix matching.
    ///
    /// SQLite's LIKE ignores ASCII case, so case-sensitive matches use GLOB;
    /// case-insensitive ones lower both sides.
    #[allow(clippy::fn_params_excessive_bools, clippy::too_many_arguments)]
    fn pattern(
        &self,
        ctx: &mut Ctx,
        col: &str,
        needle: &str,
        any_prefix: bool,
        any_suffix: bool,
        case_insensitive: bool,
        sql: &mut String,
    ) {
        let glob = !case_insensitive;
        let (escaped, wildcard) = if glob {
            (glob_escape(needle), "*")
        } else {
            (like_escape(needle), "%")
        };
        let pattern = format!(
            "{}{escaped}{}",
            if any_prefix { wildcard } else { "" },
            if any_suffix { wildcard } else { "" }
        );
        let ph = self.bind(ctx, Value::String(pattern));
        let clause = if glob {
            format!("{col} GLOB {ph}")
        } else {
            format!("LOWER({col}) LIKE LOWER({ph}) ESCAPE '\\'")
        };
        sql.push_str(&clause);
    }

    // ── Expressions ──────────────────────────────────────────────────

    /// Renders a column reference, expanding inline annotations.
    fn column(&self, ctx: &mut Ctx, scope: Scope<'_>, name: &str) -> String {
        if let Some(pos) = scope.inline.iter().position(|(alias, _)| alias == name) {
            let inner = Scope {
                alias: scope.alias,
                inline: &scope.inline[..pos],
            };
            return format!("({})", self.expr(ctx, inner, &scope.inline[pos].1));
        }
        qualify(scope.alias, name)
    }

    fn expr(&self, ctx: &mut Ctx, scope: Scope<'_>, expr: &Expression) -> String {
        match expr {
            Expression::Col(name) if name == "*" => "*".to_string(),
            Expression::Col(name) => qualify(scope.alias, name),
            Expression::F(name) => self.column(ctx, scope, name),
            Expression::Value(val) => self.bind(ctx, val.clone()),
            Expression::Func { name, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(ctx, scope, a)).collect();
                format!("{}({})", self.func_name(name), args.join(", "))
            }
            Expression::Aggregate {
                func,
                field,
                distinct,
            } => {
                let distinct_str = if *distinct { "DISTINCT " } else { "" };
                let field_sql = self.expr(ctx, scope, field);
                format!("{}({distinct_str}{field_sql})", func.sql_name())
            }
            Expression::Case { whens, default } => {
                let mut sql = "CASE".to_string();
                for when in whens {
                    sql.push_str(" WHEN ");
                    let node = WhereNode::from_q(&when.condition);
                    self.where_node(ctx, scope, &node, &mut sql);
                    sql.push_str(" THEN ");
                    sql.push_str(&self.expr(ctx, scope, &when.then));
                }
                if let Some(default) = default {
                    sql.push_str(" ELSE ");
                    sql.push_str(&self.expr(ctx, scope, default));
                }
                sql.push_str(" END");
                sql
            }
            Expression::Related {
                path,
                func,
                field,
                distinct,
                filter,
            } => {
                let hops = self.hops(ctx, scope.alias, path);
                let distinct_str = if *distinct { "DISTINCT " } else { "" };
                let target = match (field, distinct) {
                    (Some(f), _) => format!("{distinct_str}{}", qualify(&hops.last, f)),
                    (None, true) => format!("DISTINCT {}", qualify(&hops.last, "id")),
                    (None, false) => "*".to_string(),
                };
                let mut sql = format!("(SELECT {}({target}) FROM {}", func.sql_name(), hops.from);
                let filter = filter.as_deref().map(WhereNode::from_q);
                self.push_hop_conditions(ctx, &hops, filter.as_ref(), &mut sql);
                sql.push(')');
                sql
            }
            Expression::RelatedField { path, field } => {
                let hops = self.hops(ctx, scope.alias, path);
                let mut sql = format!("(SELECT {} FROM {}", qualify(&hops.last, field), hops.from);
                self.push_hop_conditions(ctx, &hops, None, &mut sql);
                sql.push_str(" LIMIT 1)");
                sql
            }
            Expression::Add(left, right) => self.binary(ctx, scope, left, "+", right),
            Expression::Sub(left, right) => self.binary(ctx, scope, left, "-", right),
            Expression::Mul(left, right) => self.binary(ctx, scope, left, "*", right),
            Expression::Div(left, right) => self.binary(ctx, scope, left, "/", right),
        }
    }

    fn binary(
        &self,
        ctx: &mut Ctx,
        scope: Scope<'_>,
        left: &Expression,
        op: &str,
        right: &Expression,
    ) -> String {
        let l = self.expr(ctx, scope, left);
        let r = self.expr(ctx, scope, right);
        format!("({l} {op} {r})")
    }

    fn func_name<'n>(&self, name: &'n str) -> &'n str {
        match (self.backend, name) {
            (DatabaseBackendType::SQLite, "GREATEST") => "MAX",
            (DatabaseBackendType::SQLite, "LEAST") => "MIN",
            _ => name,
        }
    }

    // ── Relation paths ───────────────────────────────────────────────

    /// Lays out the FROM list and join conditions of a relation path.
    fn hops(&self, ctx: &mut Ctx, outer: &str, path: &[Relation]) -> Hops {
        let mut from = Vec::new();
        let mut conditions = Vec::new();
        let mut prev = outer.to_string();
        for hop in path {
            match *hop {
                Relation::Forward { table, fk } => {
                    let a = ctx.alias();
                    from.push(format!("\"{table}\" AS \"{a}\""));
                    conditions.push(format!("{} = {}", qualify(&a, "id"), qualify(&prev, fk)));
                    prev = a;
                }
                Relation::Reverse { table, fk } => {
                    let a = ctx.alias();
                    from.push(format!("\"{table}\" AS \"{a}\""));
                    conditions.push(format!("{} = {}", qualify(&a, fk), qualify(&prev, "id")));
                    prev = a;
                }
                Relation::ManyToMany {
                    table,
                    through,
                    source,
                    target,
                } => {
                    let j = ctx.alias();
                    let a = ctx.alias();
                    from.push(format!("\"{through}\" AS \"{j}\""));
                    from.push(format!("\"{table}\" AS \"{a}\""));
                    conditions.push(format!("{} = {}", qualify(&j, source), qualify(&prev, "id")));
                    conditions.push(format!("{} = {}", qualify(&a, "id"), qualify(&j, target)));
                    prev = a;
                }
            }
        }
        Hops {
            from: from.join(", "),
            conditions,
            last: prev,
        }
    }

    fn push_hop_conditions(
        &self,
        ctx: &mut Ctx,
        hops: &Hops,
        filter: Option<&WhereNode>,
        sql: &mut String,
    ) {
        let mut first = true;
        for cond in &hops.conditions {
            sql.push_str(if first { " WHERE " } else { " AND " });
            sql.push_str(cond);
            first = false;
        }
        if let Some(filter) = filter {
            sql.push_str(if first { " WHERE " } else { " AND " });
            self.where_node(ctx, Scope::table(&hops.last), filter, sql);
        }
    }
}

struct Hops {
    from: String,
    conditions: Vec<String>,
    last: String,
}

fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

fn qualify(alias: &str, column: &str) -> String {
    format!("\"{alias}\".\"{column}\"")
}

fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn glob_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '*' | '?' | '[' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expressions::{AggregateFunc, When};

    fn sqlite() -> SqlCompiler {
        SqlCompiler::new(DatabaseBackendType::SQLite)
    }

    fn cond(column: &str, lookup: Lookup) -> WhereNode {
        WhereNode::Condition {
            column: column.to_string(),
            lookup,
        }
    }

    const MOVIES: Relation = Relation::Reverse {
        table: "movie",
        fk: "director_id",
    };

    // ── SELECT ───────────────────────────────────────────────────────

    #[test]
    fn test_simple_select() {
        let (sql, params) = sqlite().compile_select(&Query::new("pet"));
        assert_eq!(sql, "SELECT \"pet\".* FROM \"pet\"");
        assert!(params.is_empty());
    }

    #[test]
    fn test_select_with_where_collects_params_in_order() {
        let mut query = Query::new("laptop");
        query.where_clause = Some(WhereNode::And(vec![
            cond("brand", Lookup::In(vec!["Asus".into(), "Lenovo".into()])),
            cond("storage", Lookup::Lt(Value::from(512))),
        ]));
        let (sql, params) = sqlite().compile_select(&query);
        assert_eq!(
            sql,
            "SELECT \"laptop\".* FROM \"laptop\" WHERE (\"laptop\".\"brand\" IN (?, ?) AND \"laptop\".\"storage\" < ?)"
        );
        assert_eq!(
            params,
            vec![Value::from("Asus"), Value::from("Lenovo"), Value::from(512)]
        );
    }

    #[test]
    fn test_select_or_and_not() {
        let mut query = Query::new("meal");
        query.where_clause = Some(WhereNode::Not(Box::new(WhereNode::Or(vec![
            cond("meal_type", Lookup::Exact("Lunch".into())),
            cond("meal_type", Lookup::Exact("Snack".into())),
        ]))));
        let (sql, _) = sqlite().compile_select(&query);
        assert_eq!(
            sql,
            "SELECT \"meal\".* FROM \"meal\" WHERE NOT ((\"meal\".\"meal_type\" = ? OR \"meal\".\"meal_type\" = ?))"
        );
    }

    #[test]
    fn test_select_order_limit_offset() {
        let mut query = Query::new("art");
        query.order_by = vec![OrderBy::from("-rating"), OrderBy::from("id")];
        query.limit = Some(1);
        query.offset = Some(2);
        let (sql, _) = sqlite().compile_select(&query);
        assert_eq!(
            sql,
            "SELECT \"art\".* FROM \"art\" ORDER BY \"art\".\"rating\" DESC, \"art\".\"id\" ASC LIMIT 1 OFFSET 2"
        );
    }

    #[test]
    fn test_offset_without_limit() {
        let mut query = Query::new("art");
        query.offset = Some(3);
        assert_eq!(
            sqlite().compile_select(&query).0,
            "SELECT \"art\".* FROM \"art\" LIMIT -1 OFFSET 3"
        );
    }

    #[test]
    fn test_select_distinct_columns() {
        let mut query = Query::new("workout");
        query.distinct = true;
        query.select = vec![SelectColumn::Column("instructor".into())];
        assert_eq!(
            sqlite().compile_select(&query).0,
            "SELECT DISTINCT \"workout\".\"instructor\" FROM \"workout\""
        );
    }

    #[test]
    fn test_select_aggregate_expression() {
        let mut query = Query::new("dragon");
        query.select = vec![SelectColumn::Expression(
            Expression::aggregate(AggregateFunc::Min, Expression::col("power")),
            "min_power".into(),
        )];
        assert_eq!(
            sqlite().compile_select(&query).0,
            "SELECT MIN(\"dragon\".\"power\") AS \"min_power\" FROM \"dragon\""
        );
    }

    // ── Lookups ──────────────────────────────────────────────────────

    fn where_sql(compiler: &SqlCompiler, node: WhereNode) -> (String, Vec<Value>) {
        let mut query = Query::new("t");
        query.select = vec![SelectColumn::Column("id".into())];
        query.where_clause = Some(node);
        let (sql, params) = compiler.compile_select(&query);
        let prefix = "SELECT \"t\".\"id\" FROM \"t\" WHERE ";
        (sql[prefix.len()..].to_string(), params)
    }

    #[test]
    fn test_lookup_exact_null() {
        let (sql, params) = where_sql(&sqlite(), cond("motto", Lookup::Exact(Value::Null)));
        assert_eq!(sql, "\"t\".\"motto\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_lookup_is_null_false() {
        let (sql, _) = where_sql(&sqlite(), cond("motto", Lookup::IsNull(false)));
        assert_eq!(sql, "\"t\".\"motto\" IS NOT NULL");
    }

    #[test]
    fn test_lookup_contains_sqlite_uses_glob() {
        let (sql, params) = where_sql(&sqlite(), cond("name", Lookup::Contains("a*b".into())));
        assert_eq!(sql, "\"t\".\"name\" GLOB ?");
        assert_eq!(params, vec![Value::from("*a[*]b*")]);
    }

    #[test]
    fn test_lookup_icontains_sqlite() {
        let (sql, params) = where_sql(&sqlite(), cond("name", Lookup::IContains("50%".into())));
        assert_eq!(sql, "LOWER(\"t\".\"name\") LIKE LOWER(?) ESCAPE '\\'");
        assert_eq!(params, vec![Value::from("%50\\%%")]);
    }

    #[test]
    fn test_lookup_prefix_and_suffix() {
        let (sql, params) = where_sql(&sqlite(), cond("location", Lookup::StartsWith("E".into())));
        assert_eq!(sql, "\"t\".\"location\" GLOB ?");
        assert_eq!(params, vec![Value::from("E*")]);
        let (_, params) = where_sql(&sqlite(), cond("location", Lookup::EndsWith("s".into())));
        assert_eq!(params, vec![Value::from("*s")]);
        let (sql, params) = where_sql(&sqlite(), cond("name", Lookup::IStartsWith("st".into())));
        assert_eq!(sql, "LOWER(\"t\".\"name\") LIKE LOWER(?) ESCAPE '\\'");
        assert_eq!(params, vec![Value::from("st%")]);
    }

    #[test]
    fn test_lookup_empty_in_matches_nothing() {
        let (sql, _) = where_sql(&sqlite(), cond("id", Lookup::In(vec![])));
        assert_eq!(sql, "1=0");
    }

    #[test]
    fn test_lookup_range_and_iexact() {
        let (sql, params) = where_sql(
            &sqlite(),
            cond("rating", Lookup::Range(Value::from(2300), Value::from(2399))),
        );
        assert_eq!(sql, "\"t\".\"rating\" BETWEEN ? AND ?");
        assert_eq!(params.len(), 2);
        let (sql, _) = where_sql(&sqlite(), cond("title", Lookup::IExact("gm".into())));
        assert_eq!(sql, "LOWER(\"t\".\"title\") = LOWER(?)");
    }

    #[test]
    fn test_lookup_year() {
        let (sql, params) = where_sql(&sqlite(), cond("publication_date", Lookup::Year(2025)));
        assert_eq!(sql, "CAST(strftime('%Y', \"t\".\"publication_date\") AS INTEGER) = ?");
        assert_eq!(params, vec![Value::Int(2025)]);
    }

    #[test]
    fn test_empty_and_or() {
        assert_eq!(where_sql(&sqlite(), WhereNode::And(vec![])).0, "1=1");
        assert_eq!(where_sql(&sqlite(), WhereNode::Or(vec![])).0, "1=0");
    }

    #[test]
    fn test_related_exists() {
        let node = WhereNode::from_q(&Q::related(
            [MOVIES],
            Q::filter("is_classic", Lookup::Exact(Value::from(true))),
        ));
        let mut query = Query::new("director");
        query.where_clause = Some(node);
        let (sql, params) = sqlite().compile_select(&query);
        assert_eq!(
            sql,
            "SELECT \"director\".* FROM \"director\" WHERE EXISTS (SELECT 1 FROM \"movie\" AS \"r0\" \
             WHERE \"r0\".\"director_id\" = \"director\".\"id\" AND \"r0\".\"is_classic\" = ?)"
        );
        assert_eq!(params, vec![Value::Bool(true)]);
    }

    // ── Annotations ──────────────────────────────────────────────────

    #[test]
    fn test_annotation_wraps_source() {
        let mut query = Query::new("director");
        query.annotate("movies_count", Expression::related_count([MOVIES]));
        query.order_by = vec![OrderBy::desc("movies_count"), OrderBy::asc("full_name")];
        let (sql, _) = sqlite().compile_select(&query);
        assert_eq!(
            sql,
            "SELECT \"director\".* FROM (SELECT \"director\".*, (SELECT COUNT(*) FROM \"movie\" AS \"r0\" \
             WHERE \"r0\".\"director_id\" = \"director\".\"id\") AS \"movies_count\" FROM \"director\") AS \"director\" \
             ORDER BY \"director\".\"movies_count\" DESC, \"director\".\"full_name\" ASC"
        );
    }

    #[test]
    fn test_annotation_references_earlier_annotation() {
        let mut query = Query::new("book");
        query.annotate("authors", Expression::value(1) + Expression::col("co"));
        query.annotate("index", Expression::col("rating") + Expression::f("authors"));
        query.where_clause = Some(cond("index", Lookup::Gt(Value::from(5))));
        let (sql, params) = sqlite().compile_select(&query);
        assert_eq!(
            sql,
            "SELECT \"book\".* FROM (SELECT \"book\".*, (? + \"book\".\"co\") AS \"authors\", \
             (\"book\".\"rating\" + ((? + \"book\".\"co\"))) AS \"index\" FROM \"book\") AS \"book\" \
             WHERE \"book\".\"index\" > ?"
        );
        assert_eq!(params, vec![Value::Int(1), Value::Int(1), Value::Int(5)]);
    }

    #[test]
    fn test_self_referencing_annotation_reads_column() {
        let mut query = Query::new("t");
        query.annotate("rating", Expression::f("rating") * Expression::value(2));
        let (sql, _) = sqlite().compile_select(&query);
        assert!(sql.contains("(\"t\".\"rating\" * ?) AS \"rating\""));
    }

    #[test]
    fn test_many_to_many_hop_uses_two_aliases() {
        let cast = Relation::ManyToMany {
            table: "actor",
            through: "movie_actors",
            source: "movie_id",
            target: "actor_id",
        };
        let mut query = Query::new("movie");
        query.select = vec![SelectColumn::Expression(
            Expression::related_aggregate(AggregateFunc::Avg, [cast], "age"),
            "avg_age".into(),
        )];
        assert_eq!(
            sqlite().compile_select(&query).0,
            "SELECT (SELECT AVG(\"r1\".\"age\") FROM \"movie_actors\" AS \"r0\", \"actor\" AS \"r1\" \
             WHERE \"r0\".\"movie_id\" = \"movie\".\"id\" AND \"r1\".\"id\" = \"r0\".\"actor_id\") AS \"avg_age\" FROM \"movie\""
        );
    }

    #[test]
    fn test_related_count_distinct_without_field() {
        let mut query = Query::new("director");
        query.select = vec![SelectColumn::Expression(
            Expression::related_count([MOVIES]).distinct(),
            "n".into(),
        )];
        assert!(sqlite()
            .compile_select(&query)
            .0
            .starts_with("SELECT (SELECT COUNT(DISTINCT \"r0\".\"id\") FROM \"movie\" AS \"r0\""));
    }

    #[test]
    fn test_related_field_limits_to_one() {
        let publisher = Relation::Forward {
            table: "publisher",
            fk: "publisher_id",
        };
        let mut query = Query::new("book");
        query.select = vec![SelectColumn::Expression(
            Expression::related_field([publisher], "rating"),
            "publisher_rating".into(),
        )];
        assert_eq!(
            sqlite().compile_select(&query).0,
            "SELECT (SELECT \"r0\".\"rating\" FROM \"publisher\" AS \"r0\" WHERE \"r0\".\"id\" = \"book\".\"publisher_id\" LIMIT 1) \
             AS \"publisher_rating\" FROM \"book\""
        );
    }

    #[test]
    fn test_least_maps_to_min_on_sqlite() {
        let mut query = Query::new("movie");
        query.select = vec![SelectColumn::Expression(
            crate::query::expressions::least(vec![Expression::col("rating"), Expression::value(10.0)]),
            "capped".into(),
        )];
        assert!(sqlite().compile_select(&query).0.starts_with("SELECT MIN(\"movie\".\"rating\", ?)"));
    }

    // ── INSERT / UPDATE / DELETE ─────────────────────────────────────

    #[test]
    fn test_insert() {
        let (sql, params) = sqlite().compile_insert(
            "pet",
            &[("name", Value::from("Rex")), ("species", Value::from("dog"))],
        );
        assert_eq!(sql, "INSERT INTO \"pet\" (\"name\", \"species\") VALUES (?, ?)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_insert_default_values() {
        assert_eq!(
            sqlite().compile_insert("pet", &[]).0,
            "INSERT INTO \"pet\" DEFAULT VALUES"
        );
    }

    #[test]
    fn test_bulk_insert_returning() {
        let rows = vec![
            vec![Value::from("a"), Value::Int(1)],
            vec![Value::from("b"), Value::Int(2)],
        ];
        let (sql, params) = sqlite().compile_bulk_insert("art", &["name", "rating"], &rows, "id");
        assert_eq!(
            sql,
            "INSERT INTO \"art\" (\"name\", \"rating\") VALUES (?, ?), (?, ?) RETURNING \"id\""
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_link_insert_ignores_duplicates() {
        let rows = vec![vec![Value::Int(1), Value::Int(2)]];
        assert_eq!(
            sqlite().compile_link_insert("m2m", &["a_id", "b_id"], &rows).0,
            "INSERT OR IGNORE INTO \"m2m\" (\"a_id\", \"b_id\") VALUES (?, ?)"
        );
    }

    #[test]
    fn test_update_with_case() {
        let mut query = Query::new("laptop");
        query.where_clause = Some(cond("price", Lookup::Gt(Value::from(0))));
        let os = Expression::case(
            vec![
                When::new(Q::filter("brand", Lookup::Exact("Asus".into())), "Windows"),
                When::new(Q::filter("brand", Lookup::Exact("Apple".into())), "MacOS"),
            ],
            Some(Expression::col("operation_system")),
        );
        let (sql, params) = sqlite().compile_update(&query, &[("operation_system".into(), os)]);
        assert_eq!(
            sql,
            "UPDATE \"laptop\" SET \"operation_system\" = CASE WHEN \"laptop\".\"brand\" = ? THEN ? \
             WHEN \"laptop\".\"brand\" = ? THEN ? ELSE \"laptop\".\"operation_system\" END \
             WHERE \"laptop\".\"price\" > ?"
        );
        assert_eq!(
            params,
            vec![
                Value::from("Asus"),
                Value::from("Windows"),
                Value::from("Apple"),
                Value::from("MacOS"),
                Value::Int(0),
            ]
        );
    }

    #[test]
    fn test_update_without_filter() {
        let query = Query::new("player");
        let (sql, _) = sqlite().compile_update(&query, &[("games_drawn".into(), Expression::value(10))]);
        assert_eq!(sql, "UPDATE \"player\" SET \"games_drawn\" = ?");
    }

    #[test]
    fn test_update_with_annotation_filter_uses_pk_subselect() {
        let mut query = Query::new("director");
        query.annotate("movies_count", Expression::related_count([MOVIES]));
        query.where_clause = Some(cond("movies_count", Lookup::Gt(Value::from(2))));
        let (sql, params) = sqlite().compile_update(
            &query,
            &[("years_of_experience".into(), Expression::f("movies_count"))],
        );
        assert_eq!(
            sql,
            "UPDATE \"director\" SET \"years_of_experience\" = ((SELECT COUNT(*) FROM \"movie\" AS \"r0\" \
             WHERE \"r0\".\"director_id\" = \"director\".\"id\")) WHERE \"director\".\"id\" IN \
             (SELECT \"director\".\"id\" FROM (SELECT \"director\".*, (SELECT COUNT(*) FROM \"movie\" AS \"r1\" \
             WHERE \"r1\".\"director_id\" = \"director\".\"id\") AS \"movies_count\" FROM \"director\") AS \"director\" \
             WHERE \"director\".\"movies_count\" > ?)"
        );
        assert_eq!(params, vec![Value::Int(2)]);
    }

    #[test]
    fn test_delete() {
        let mut query = Query::new("art");
        query.where_clause = Some(cond("rating", Lookup::Lt(Value::from(0))));
        let (sql, params) = sqlite().compile_delete(&query);
        assert_eq!(sql, "DELETE FROM \"art\" WHERE \"art\".\"rating\" < ?");
        assert_eq!(params, vec![Value::Int(0)]);
    }

    #[test]
    fn test_delete_with_limit_uses_pk_subselect() {
        let mut query = Query::new("room");
        query.order_by = vec![OrderBy::desc("id")];
        query.limit = Some(1);
        let (sql, _) = sqlite().compile_delete(&query);
        assert_eq!(
            sql,
            "DELETE FROM \"room\" WHERE \"room\".\"id\" IN (SELECT \"room\".\"id\" FROM \"room\" \
             ORDER BY \"room\".\"id\" DESC LIMIT 1)"
        );
    }

    #[test]
    fn test_order_by_from_str() {
        assert_eq!(OrderBy::from("-price"), OrderBy::desc("price"));
        assert_eq!(OrderBy::from("name"), OrderBy::asc("name"));
        assert_eq!(OrderBy::desc("x").reversed(), OrderBy::asc("x"));
    }

    #[test]
    fn test_query_annotate_replaces() {
        let mut query = Query::new("t");
        query.annotate("a", Expression::value(1));
        query.annotate("a", Expression::value(2));
        assert_eq!(query.annotations, vec![("a".to_string(), Expression::value(2))]);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(like_escape("a_b%c\\"), "a\\_b\\%c\\\\");
        assert_eq!(glob_escape("a?[b"), "a[?][[]b");
    }
}
