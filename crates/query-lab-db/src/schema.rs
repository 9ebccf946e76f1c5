//! Table DDL generated from [`ModelMeta`].
//!
//! Every exercise creates its tables straight from model metadata, so there
//! is no migration history: `CREATE TABLE IF NOT EXISTS` for the model's own
//! table, plus one junction table per many-to-many field.

use query_lab_core::OrmResult;

use crate::executor::DbExecutor;
use crate::fields::{FieldDef, FieldType};
use crate::model::ModelMeta;

/// Generates the SQL fragment for a column definition (type, constraints).
fn column_sql(field: &FieldDef) -> String {
    let type_str = field.field_type.sql_type(field.max_length);
    let mut sql = format!("\"{}\" {type_str}", field.column);
    if field.primary_key {
        sql.push_str(" PRIMARY KEY");
        if field.field_type.is_auto() {
            sql.push_str(" AUTOINCREMENT");
        }
        return sql;
    }
    if !field.null {
        sql.push_str(" NOT NULL");
    }
    if field.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(ref default) = field.default {
        sql.push_str(&format!(" DEFAULT {}", default.to_sql_literal()));
    }
    if field.field_type.is_positive() {
        sql.push_str(&format!(" CHECK (\"{}\" >= 0)", field.column));
    }
    sql
}

/// `CREATE TABLE` for the model's own table.
pub fn create_table_sql(meta: &ModelMeta) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut constraints: Vec<String> = Vec::new();

    for field in meta.concrete_fields() {
        parts.push(column_sql(field));
        if let FieldType::ForeignKey {
            ref to, on_delete, ..
        } = field.field_type
        {
            constraints.push(format!(
                "FOREIGN KEY (\"{}\") REFERENCES \"{to}\" (\"id\") ON DELETE {}",
                field.column,
                on_delete.as_sql()
            ));
        }
    }

    parts.extend(constraints);
    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
        meta.db_table,
        parts.join(", ")
    )
}

/// `CREATE TABLE` for each many-to-many junction table of the model.
pub fn many_to_many_sql(meta: &ModelMeta) -> Vec<String> {
    meta.many_to_many_fields()
        .filter_map(|field| match field.field_type {
            FieldType::ManyToManyField {
                ref to,
                ref through,
                ref source,
                ref target,
                ..
            } => Some(format!(
                "CREATE TABLE IF NOT EXISTS \"{through}\" (\
                 \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
                 \"{source}\" INTEGER NOT NULL, \
                 \"{target}\" INTEGER NOT NULL, \
                 FOREIGN KEY (\"{source}\") REFERENCES \"{owner}\" (\"id\") ON DELETE CASCADE, \
                 FOREIGN KEY (\"{target}\") REFERENCES \"{to}\" (\"id\") ON DELETE CASCADE, \
                 UNIQUE (\"{source}\", \"{target}\"))",
                owner = meta.db_table,
            )),
            _ => None,
        })
        .collect()
}

/// Creates the tables of every model, in order, then their junction tables.
///
/// Referenced tables must come before the models pointing at them.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub async fn create_tables(db: &dyn DbExecutor, metas: &[&ModelMeta]) -> OrmResult<()> {
    for meta in metas {
        tracing::debug!(table = meta.db_table, "creating table");
        db.execute_sql(&create_table_sql(meta), &[]).await?;
    }
    for meta in metas {
        for sql in many_to_many_sql(meta) {
            db.execute_sql(&sql, &[]).await?;
        }
    }
    Ok(())
}
