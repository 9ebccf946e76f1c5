//! Database executor trait and model CRUD operations.
//!
//! [`DbExecutor`] is the minimal async interface that
//! [`QuerySet`](crate::query::queryset::QuerySet) execution and the free
//! CRUD functions below run against. Backends in `query-lab-db-backends`
//! implement it.
//!
//! Writes go through [`FieldDef::get_prep_value`](crate::fields::FieldDef::get_prep_value),
//! and `auto_now` / `auto_now_add` columns are stamped with the current time.
//! The stamped value is only written to the database; call [`refresh_model`]
//! to read it back into the instance.

use chrono::Utc;
use query_lab_core::{OrmError, OrmResult};

use crate::fields::FieldType;
use crate::model::Model;
use crate::query::compiler::{DatabaseBackendType, Query, SqlCompiler, WhereNode};
use crate::query::expressions::Expression;
use crate::query::lookups::Lookup;
use crate::row::Row;
use crate::value::Value;

/// Minimal async database executor trait.
#[async_trait::async_trait]
pub trait DbExecutor: Send + Sync {
    /// Returns the backend type for SQL compilation.
    fn backend_type(&self) -> DatabaseBackendType;

    /// Runs a SQL statement that does not return rows.
    /// Returns the number of rows affected.
    async fn execute_sql(&self, sql: &str, params: &[Value]) -> OrmResult<u64>;

    /// Runs a SQL query and returns all result rows.
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>>;

    /// Runs a SQL query and returns exactly one row.
    /// Returns `DoesNotExist` if no rows, `MultipleObjectsReturned` if more than one.
    async fn query_one(&self, sql: &str, params: &[Value]) -> OrmResult<Row> {
        let mut rows = self.query(sql, params).await?;
        match rows.len() {
            0 => Err(OrmError::DoesNotExist("Query returned no rows".to_string())),
            1 => Ok(rows.remove(0)),
            n => Err(OrmError::MultipleObjectsReturned(format!(
                "Query returned {n} rows"
            ))),
        }
    }

    /// Executes an INSERT and returns the generated primary key.
    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Value>;
}

/// The non-pk `(column, value)` pairs of `model` as they should be written.
fn prepared_values<M: Model>(model: &M, inserting: bool) -> Vec<(&'static str, Value)> {
    let meta = M::meta();
    let now = Utc::now().naive_utc();
    model
        .non_pk_field_values()
        .into_iter()
        .map(|(name, value)| match meta.get_field(name) {
            Some(field) if field.auto_now || (inserting && field.auto_now_add) => {
                let stamp = if field.field_type == FieldType::DateField {
                    Value::Date(now.date())
                } else {
                    Value::DateTime(now)
                };
                (field.column.as_str(), stamp)
            }
            Some(field) => (field.column.as_str(), field.get_prep_value(value)),
            None => (name, value),
        })
        .collect()
}

fn pk_query<M: Model>(pk: Value) -> Query {
    let mut query = Query::new(M::table_name());
    query.pk = M::pk_field_name().to_string();
    query.where_clause = Some(WhereNode::Condition {
        column: M::pk_field_name().to_string(),
        lookup: Lookup::Exact(pk),
    });
    query
}

fn as_assignments(values: Vec<(&'static str, Value)>) -> Vec<(String, Expression)> {
    values
        .into_iter()
        .map(|(name, value)| (name.to_string(), Expression::Value(value)))
        .collect()
}

// ── Model CRUD free functions ──────────────────────────────────────────

/// Saves a model instance to the database.
///
/// If the primary key is set, performs an UPDATE of all fields. Otherwise
/// performs an INSERT and sets the primary key from the generated value.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn save_model<M: Model>(model: &mut M, db: &dyn DbExecutor) -> OrmResult<()> {
    let Some(pk_value) = model.pk() else {
        return create_model(model, db).await;
    };

    let fields = prepared_values(model, false);
    if fields.is_empty() {
        return Ok(());
    }
    let compiler = SqlCompiler::new(db.backend_type());
    let (sql, params) = compiler.compile_update(&pk_query::<M>(pk_value), &as_assignments(fields));
    db.execute_sql(&sql, &params).await?;
    Ok(())
}

/// Inserts a new row for `model` and sets its primary key.
///
/// Always performs an INSERT regardless of whether the PK is set.
///
/// # Errors
///
/// Returns an error if the INSERT fails.
pub async fn create_model<M: Model>(model: &mut M, db: &dyn DbExecutor) -> OrmResult<()> {
    let compiler = SqlCompiler::new(db.backend_type());
    let fields = prepared_values(model, true);
    let (sql, params) = compiler.compile_insert(M::table_name(), &fields);
    let pk = db.insert_returning_id(&sql, &params).await?;
    model.set_pk(pk);
    Ok(())
}

/// Inserts every instance with one multi-row INSERT and assigns the
/// generated primary keys in order.
///
/// # Errors
///
/// Returns an error if the INSERT fails or returns a different number of
/// keys than rows.
pub async fn bulk_create<M: Model>(models: &mut [M], db: &dyn DbExecutor) -> OrmResult<u64> {
    let Some(first) = models.first() else {
        return Ok(0);
    };
    let columns: Vec<&str> = prepared_values(first, true)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    if columns.is_empty() {
        for model in models.iter_mut() {
            create_model(model, db).await?;
        }
        return Ok(models.len() as u64);
    }
    let rows: Vec<Vec<Value>> = models
        .iter()
        .map(|m| {
            prepared_values(m, true)
                .into_iter()
                .map(|(_, value)| value)
                .collect()
        })
        .collect();

    let compiler = SqlCompiler::new(db.backend_type());
    let (sql, params) =
        compiler.compile_bulk_insert(M::table_name(), &columns, &rows, M::pk_field_name());
    let returned = db.query(&sql, &params).await?;
    if returned.len() != models.len() {
        return Err(OrmError::DatabaseError(format!(
            "bulk insert into {} returned {} keys for {} rows",
            M::table_name(),
            returned.len(),
            models.len()
        )));
    }
    for (model, row) in models.iter_mut().zip(&returned) {
        model.set_pk(row.get_by_index::<Value>(0)?);
    }
    Ok(returned.len() as u64)
}

/// Writes the named columns of each saved instance back to its row.
///
/// Instances without a primary key are skipped. Returns the number of rows
/// updated.
///
/// # Errors
///
/// Returns an error if an UPDATE fails.
pub async fn bulk_update<M: Model>(
    models: &[M],
    fields: &[&str],
    db: &dyn DbExecutor,
) -> OrmResult<u64> {
    let compiler = SqlCompiler::new(db.backend_type());
    let mut updated = 0;
    for model in models {
        let Some(pk_value) = model.pk() else {
            continue;
        };
        let values: Vec<(&'static str, Value)> = prepared_values(model, false)
            .into_iter()
            .filter(|(name, _)| fields.contains(name))
            .collect();
        if values.is_empty() {
            continue;
        }
        let (sql, params) = compiler.compile_update(&pk_query::<M>(pk_value), &as_assignments(values));
        updated += db.execute_sql(&sql, &params).await?;
    }
    Ok(updated)
}

/// Deletes a model instance from the database.
///
/// # Errors
///
/// Returns an error if the PK is not set or the DELETE fails.
pub async fn delete_model<M: Model>(model: &M, db: &dyn DbExecutor) -> OrmResult<u64> {
    let pk_value = model.pk().ok_or_else(|| {
        OrmError::DatabaseError("Cannot delete a model without a primary key".to_string())
    })?;
    let compiler = SqlCompiler::new(db.backend_type());
    let (sql, params) = compiler.compile_delete(&pk_query::<M>(pk_value));
    db.execute_sql(&sql, &params).await
}

/// Reloads a model instance from its row.
///
/// # Errors
///
/// Returns an error if the PK is not set or the record does not exist.
pub async fn refresh_model<M: Model>(model: &mut M, db: &dyn DbExecutor) -> OrmResult<()> {
    let pk_value = model.pk().ok_or_else(|| {
        OrmError::DatabaseError("Cannot refresh a model without a primary key".to_string())
    })?;
    let compiler = SqlCompiler::new(db.backend_type());
    let mut query = pk_query::<M>(pk_value);
    query.limit = Some(1);

    let (sql, params) = compiler.compile_select(&query);
    let row = db.query_one(&sql, &params).await?;
    *model = M::from_row(&row)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use chrono::NaiveDateTime;

    use super::*;
    use crate::fields::{FieldDef, FieldType};
    use crate::model::ModelMeta;

    // DbExecutor must stay object-safe
    fn _assert_object_safe(_: &dyn DbExecutor) {}

    struct Task {
        id: i64,
        price: f64,
        created_on: Option<NaiveDateTime>,
        updated_on: Option<NaiveDateTime>,
    }

    impl Model for Task {
        fn meta() -> &'static ModelMeta {
            static META: LazyLock<ModelMeta> = LazyLock::new(|| {
                ModelMeta::new("test", "task", "test_task").fields(vec![
                    FieldDef::auto_id(),
                    FieldDef::new(
                        "price",
                        FieldType::DecimalField {
                            max_digits: 10,
                            decimal_places: 2,
                        },
                    ),
                    FieldDef::new("created_on", FieldType::DateTimeField).auto_now_add(),
                    FieldDef::new("updated_on", FieldType::DateTimeField).auto_now(),
                ])
            });
            &META
        }

        fn pk(&self) -> Option<Value> {
            (self.id != 0).then_some(Value::Int(self.id))
        }

        fn set_pk(&mut self, value: Value) {
            if let Value::Int(id) = value {
                self.id = id;
            }
        }

        fn field_values(&self) -> Vec<(&'static str, Value)> {
            vec![
                ("id", Value::Int(self.id)),
                ("price", Value::Float(self.price)),
                ("created_on", Value::from(self.created_on)),
                ("updated_on", Value::from(self.updated_on)),
            ]
        }

        fn from_row(row: &Row) -> OrmResult<Self> {
            Ok(Self {
                id: row.get("id")?,
                price: row.get("price")?,
                created_on: row.get("created_on")?,
                updated_on: row.get("updated_on")?,
            })
        }
    }

    fn task() -> Task {
        Task {
            id: 0,
            price: 19.999,
            created_on: None,
            updated_on: None,
        }
    }

    #[test]
    fn test_insert_stamps_both_timestamps() {
        let values = prepared_values(&task(), true);
        assert!(matches!(values[1], ("created_on", Value::DateTime(_))));
        assert!(matches!(values[2], ("updated_on", Value::DateTime(_))));
    }

    #[test]
    fn test_update_keeps_creation_time() {
        let values = prepared_values(&task(), false);
        assert_eq!(values[1], ("created_on", Value::Null));
        assert!(matches!(values[2], ("updated_on", Value::DateTime(_))));
    }

    #[test]
    fn test_prepared_values_round_decimals() {
        let values = prepared_values(&task(), true);
        assert_eq!(values[0].0, "price");
        assert_eq!(values[0].1, Value::Float(20.0));
    }

    #[test]
    fn test_pk_query_sql() {
        let compiler = SqlCompiler::new(DatabaseBackendType::SQLite);
        let (sql, params) = compiler.compile_delete(&pk_query::<Task>(Value::Int(3)));
        assert_eq!(sql, "DELETE FROM \"test_task\" WHERE \"test_task\".\"id\" = ?");
        assert_eq!(params, vec![Value::Int(3)]);
    }
}
