//! Relation hops and many-to-many junction tables.
//!
//! A relation path is a slice of [`Relation`] hops starting at the queried
//! table. The compiler turns a path into a correlated subquery: each hop adds
//! one aliased table (two for a many-to-many hop) joined to the previous one.
//!
//! [`ManyToMany`] describes one junction table and performs the writes on it.

use query_lab_core::{OrmError, OrmResult};

use super::compiler::SqlCompiler;
use super::lookups::{Lookup, Q};
use super::queryset::QuerySet;
use crate::executor::DbExecutor;
use crate::model::Model;
use crate::value::Value;

/// One hop from a table to related rows of another table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Follows a foreign key column of the current table to `table.id`.
    Forward {
        /// The referenced table.
        table: &'static str,
        /// The foreign key column on the current table.
        fk: &'static str,
    },
    /// Rows of `table` whose `fk` column points at the current row.
    Reverse {
        /// The referencing table.
        table: &'static str,
        /// The foreign key column on `table`.
        fk: &'static str,
    },
    /// Rows of `table` linked to the current row through a junction table.
    ManyToMany {
        /// The far table.
        table: &'static str,
        /// The junction table.
        through: &'static str,
        /// Junction column pointing at the current table.
        source: &'static str,
        /// Junction column pointing at `table`.
        target: &'static str,
    },
}

impl Relation {
    /// The table this hop arrives at.
    pub const fn table(&self) -> &'static str {
        match self {
            Self::Forward { table, .. }
            | Self::Reverse { table, .. }
            | Self::ManyToMany { table, .. } => table,
        }
    }
}

/// A many-to-many relation between `owner` and `table` through a junction
/// table holding `(source, target)` id pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManyToMany {
    /// The table owning the relation.
    pub owner: &'static str,
    /// The related table.
    pub table: &'static str,
    /// The junction table.
    pub through: &'static str,
    /// Junction column pointing at `owner`.
    pub source: &'static str,
    /// Junction column pointing at `table`.
    pub target: &'static str,
}

impl ManyToMany {
    /// Describes a junction table.
    pub const fn new(
        owner: &'static str,
        table: &'static str,
        through: &'static str,
        source: &'static str,
        target: &'static str,
    ) -> Self {
        Self {
            owner,
            table,
            through,
            source,
            target,
        }
    }

    /// The hop from `owner` rows to `table` rows.
    pub const fn forward(&self) -> Relation {
        Relation::ManyToMany {
            table: self.table,
            through: self.through,
            source: self.source,
            target: self.target,
        }
    }

    /// The hop from `table` rows back to `owner` rows.
    pub const fn reverse(&self) -> Relation {
        Relation::ManyToMany {
            table: self.owner,
            through: self.through,
            source: self.target,
            target: self.source,
        }
    }

    /// Links `owner_id` to each of `target_ids`. Existing links are kept.
    ///
    /// Returns the number of links created.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced row does not exist or the statement fails.
    pub async fn add(
        &self,
        db: &dyn DbExecutor,
        owner_id: i64,
        target_ids: &[i64],
    ) -> OrmResult<u64> {
        if target_ids.is_empty() {
            return Ok(0);
        }
        let compiler = SqlCompiler::new(db.backend_type());
        let rows: Vec<Vec<Value>> = target_ids
            .iter()
            .map(|id| vec![Value::Int(owner_id), Value::Int(*id)])
            .collect();
        let (sql, params) =
            compiler.compile_link_insert(self.through, &[self.source, self.target], &rows);
        db.execute_sql(&sql, &params).await
    }

    /// Unlinks `owner_id` from each of `target_ids`.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn remove(
        &self,
        db: &dyn DbExecutor,
        owner_id: i64,
        target_ids: &[i64],
    ) -> OrmResult<u64> {
        if target_ids.is_empty() {
            return Ok(0);
        }
        let compiler = SqlCompiler::new(db.backend_type());
        let mut params = vec![Value::Int(owner_id)];
        let owner_ph = compiler.placeholder();
        let target_phs: Vec<&str> = target_ids
            .iter()
            .map(|id| {
                params.push(Value::Int(*id));
                compiler.placeholder()
            })
            .collect();
        let sql = format!(
            "DELETE FROM \"{}\" WHERE \"{}\" = {owner_ph} AND \"{}\" IN ({})",
            self.through,
            self.source,
            self.target,
            target_phs.join(", ")
        );
        db.execute_sql(&sql, &params).await
    }

    /// Removes every link of `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn clear(&self, db: &dyn DbExecutor, owner_id: i64) -> OrmResult<u64> {
        let compiler = SqlCompiler::new(db.backend_type());
        let sql = format!(
            "DELETE FROM \"{}\" WHERE \"{}\" = {}",
            self.through,
            self.source,
            compiler.placeholder()
        );
        db.execute_sql(&sql, &[Value::Int(owner_id)]).await
    }

    /// Returns the ids linked to `owner_id`, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or an id is not an integer.
    pub async fn target_ids(&self, db: &dyn DbExecutor, owner_id: i64) -> OrmResult<Vec<i64>> {
        let compiler = SqlCompiler::new(db.backend_type());
        let sql = format!(
            "SELECT \"{target}\" FROM \"{}\" WHERE \"{}\" = {} ORDER BY \"{target}\"",
            self.through,
            self.source,
            compiler.placeholder(),
            target = self.target,
        );
        let rows = db.query(&sql, &[Value::Int(owner_id)]).await?;
        rows.iter()
            .map(|row| {
                row.get_by_index::<i64>(0).map_err(|e| {
                    OrmError::SerializationError(format!("{} id: {e}", self.through))
                })
            })
            .collect()
    }

    /// A lazy queryset over the `table` rows linked to `owner_id`.
    pub fn targets<M: Model>(&self, owner_id: i64) -> QuerySet<M> {
        M::objects().filter(Q::related(
            [self.reverse()],
            Q::filter("id", Lookup::Exact(Value::Int(owner_id))),
        ))
    }
}
