//! SQLite database backend using `rusqlite`.
//!
//! [`SqliteBackend`] implements [`DbExecutor`] on a single `rusqlite`
//! connection. Every statement runs inside `tokio::task::spawn_blocking`
//! while holding the connection mutex, so callers never block the runtime.
//!
//! - WAL journal mode for file databases
//! - `PRAGMA foreign_keys=ON` unless configured otherwise
//! - constraint failures surface as [`OrmError::IntegrityError`]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use query_lab_core::{OrmError, OrmResult};
use query_lab_db::{DatabaseBackendType, DbExecutor, Row, Value};
use tokio::sync::Mutex;

/// A SQLite database backend.
pub struct SqliteBackend {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    /// The connection, guarded by an async mutex.
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens a SQLite database at the given path with foreign keys enforced.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> OrmResult<Self> {
        Self::open_with(path, true)
    }

    /// Opens a SQLite database, choosing whether foreign keys are enforced.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or configured.
    pub fn open_with(path: impl Into<PathBuf>, foreign_keys: bool) -> OrmResult<Self> {
        let path = path.into();
        let in_memory = path.to_str() == Some(":memory:");
        let conn = if in_memory {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| OrmError::OperationalError(format!("SQLite open failed: {e}")))?;

        let mut pragmas = String::new();
        if !in_memory {
            pragmas.push_str("PRAGMA journal_mode=WAL; ");
        }
        pragmas.push_str(if foreign_keys {
            "PRAGMA foreign_keys=ON;"
        } else {
            "PRAGMA foreign_keys=OFF;"
        });
        conn.execute_batch(&pragmas)
            .map_err(|e| OrmError::OperationalError(format!("Failed to set pragmas: {e}")))?;

        tracing::debug!(path = %path.display(), foreign_keys, "opened SQLite database");
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn memory() -> OrmResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Binds ORM `Value` types to a `rusqlite` statement.
    fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> OrmResult<()> {
        for (i, param) in params.iter().enumerate() {
            let idx = i + 1;
            match param {
                Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
                Value::Bool(b) => stmt.raw_bind_parameter(idx, i64::from(*b)),
                Value::Int(v) => stmt.raw_bind_parameter(idx, v),
                Value::Float(v) => stmt.raw_bind_parameter(idx, v),
                Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
                Value::Date(_) | Value::DateTime(_) => {
                    stmt.raw_bind_parameter(idx, param.to_string().as_str())
                }
                Value::List(_) => {
                    return Err(OrmError::SerializationError(format!(
                        "Cannot bind a list as parameter {idx}"
                    )))
                }
            }
            .map_err(|e| OrmError::DatabaseError(format!("Bind error: {e}")))?;
        }
        Ok(())
    }

    /// Converts a `rusqlite::Row` to our generic `Row`.
    fn convert_row(sqlite_row: &rusqlite::Row<'_>, column_names: &[String]) -> OrmResult<Row> {
        let values = (0..column_names.len())
            .map(|i| {
                let val_ref = sqlite_row.get_ref(i).map_err(map_error)?;
                Ok(match val_ref {
                    rusqlite::types::ValueRef::Null => Value::Null,
                    rusqlite::types::ValueRef::Integer(v) => Value::Int(v),
                    rusqlite::types::ValueRef::Real(v) => Value::Float(v),
                    rusqlite::types::ValueRef::Text(b) => {
                        Value::String(String::from_utf8_lossy(b).into_owned())
                    }
                    rusqlite::types::ValueRef::Blob(b) => {
                        Value::String(String::from_utf8_lossy(b).into_owned())
                    }
                })
            })
            .collect::<OrmResult<Vec<Value>>>()?;

        Ok(Row::new(column_names.to_vec(), values))
    }

    /// Runs `f` on the connection in a blocking task.
    async fn with_conn<T, F>(&self, f: F) -> OrmResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> OrmResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(|e| OrmError::OperationalError(format!("Task join error: {e}")))?
    }

    /// Executes a statement that does not return rows.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation, binding or execution fails.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        tracing::debug!(sql, params = params.len(), "execute");
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(map_error)?;
            Self::bind_params(&mut stmt, &params)?;
            let count = stmt.raw_execute().map_err(map_error)?;
            Ok(count as u64)
        })
        .await
    }

    /// Runs several `;`-separated statements without parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub async fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        tracing::debug!(sql, "execute batch");
        let sql = sql.to_string();
        self.with_conn(move |conn| conn.execute_batch(&sql).map_err(map_error))
            .await
    }

    /// Runs a query and returns all result rows.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation, binding or stepping fails.
    pub async fn fetch_all(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        tracing::debug!(sql, params = params.len(), "query");
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(map_error)?;
            let column_names: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();
            Self::bind_params(&mut stmt, &params)?;

            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows.next().map_err(map_error)? {
                rows.push(Self::convert_row(row, &column_names)?);
            }
            Ok(rows)
        })
        .await
    }
}

/// Maps a `rusqlite` error, separating constraint violations.
fn map_error(e: rusqlite::Error) -> OrmError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            OrmError::IntegrityError(e.to_string())
        }
        other => OrmError::DatabaseError(other.to_string()),
    }
}

#[async_trait::async_trait]
impl DbExecutor for SqliteBackend {
    fn backend_type(&self) -> DatabaseBackendType {
        DatabaseBackendType::SQLite
    }

    async fn execute_sql(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.execute(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.fetch_all(sql, params).await
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Value> {
        tracing::debug!(sql, params = params.len(), "insert");
        let sql = sql.to_string();
        let params = params.to_vec();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(map_error)?;
            Self::bind_params(&mut stmt, &params)?;
            stmt.raw_execute().map_err(map_error)?;
            Ok(Value::Int(conn.last_insert_rowid()))
        })
        .await
    }
}
