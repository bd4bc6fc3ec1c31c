use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::SqliteOptions;
use crate::error::SqlSessionError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::Params;
use super::query::build_result_set;

type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// One `SQLite` connection owned by a session. Every call runs on tokio's blocking
/// pool; prepared statements and cursors never outlive the call that created them.
pub struct SqliteConnection {
    handle: SharedSqliteConnection,
    db_path: String,
}

impl SqliteConnection {
    /// Open the database and apply the configured pragmas.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if the file cannot be opened or a pragma fails.
    pub async fn open(opts: &SqliteOptions) -> Result<Self, SqlSessionError> {
        let opts = opts.clone();
        let db_path = opts.db_path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<_, SqlSessionError> {
            let conn = if opts.is_in_memory() {
                rusqlite::Connection::open_in_memory()?
            } else {
                rusqlite::Connection::open(&opts.db_path)?
            };
            conn.busy_timeout(opts.busy_timeout)?;
            if opts.foreign_keys {
                conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            }
            if opts.wal && !opts.is_in_memory() {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            Ok(conn)
        })
        .await
        .map_err(join_error)??;

        tracing::debug!(db_path = %db_path, "opened sqlite connection");
        Ok(Self {
            handle: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    async fn run_blocking<F, R>(&self, func: F) -> Result<R, SqlSessionError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlSessionError> + Send + 'static,
        R: Send + 'static,
    {
        let handle = Arc::clone(&self.handle);
        tokio::task::spawn_blocking(move || {
            let mut guard = handle.blocking_lock();
            func(&mut guard)
        })
        .await
        .map_err(join_error)?
    }

    /// Execute one or more statements without parameters.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if any statement fails.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlSessionError> {
        let sql_owned = sql.to_owned();
        self.run_blocking(move |conn| {
            conn.execute_batch(&sql_owned)?;
            Ok(())
        })
        .await
    }

    /// Execute a DML statement and return rows affected.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if preparing, binding or executing fails.
    pub async fn execute_dml(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlSessionError> {
        let sql_owned = query.to_owned();
        let params_owned = Params::convert(params);
        self.run_blocking(move |conn| {
            let mut stmt = conn.prepare_cached(&sql_owned)?;
            let affected = stmt.execute(rusqlite::params_from_iter(params_owned.as_values()))?;
            Ok(affected)
        })
        .await
    }

    /// Execute an INSERT and return the generated rowid, or `None` when no row was
    /// inserted.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if preparing, binding or executing fails.
    pub async fn execute_insert(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<Option<i64>, SqlSessionError> {
        let sql_owned = query.to_owned();
        let params_owned = Params::convert(params);
        self.run_blocking(move |conn| {
            let changed = {
                let mut stmt = conn.prepare_cached(&sql_owned)?;
                stmt.execute(rusqlite::params_from_iter(params_owned.as_values()))?
            };
            Ok((changed > 0).then(|| conn.last_insert_rowid()))
        })
        .await
    }

    /// Execute a SELECT and collect its rows.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if preparing or executing fails.
    pub async fn execute_select(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlSessionError> {
        let sql_owned = query.to_owned();
        let params_owned = Params::convert(params);
        self.run_blocking(move |conn| {
            let mut stmt = conn.prepare_cached(&sql_owned)?;
            build_result_set(&mut stmt, params_owned.as_values())
        })
        .await
    }

    /// Leave autocommit mode.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if `BEGIN` fails.
    pub async fn begin(&mut self) -> Result<(), SqlSessionError> {
        self.execute_batch("BEGIN").await
    }

    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if `COMMIT` fails; the transaction stays open.
    pub async fn commit(&mut self) -> Result<(), SqlSessionError> {
        self.execute_batch("COMMIT").await
    }

    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if `ROLLBACK` fails.
    pub async fn rollback(&mut self) -> Result<(), SqlSessionError> {
        self.execute_batch("ROLLBACK").await
    }

    /// Make sure no transaction is left open, rolling back whatever is pending.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if the rollback fails.
    pub async fn reset_autocommit(&mut self) -> Result<(), SqlSessionError> {
        self.run_blocking(|conn| {
            if !conn.is_autocommit() {
                conn.execute_batch("ROLLBACK")?;
            }
            Ok(())
        })
        .await
    }

    /// Whether the underlying connection is outside any transaction.
    ///
    /// # Errors
    /// Returns an error if the blocking task fails.
    pub async fn is_autocommit(&self) -> Result<bool, SqlSessionError> {
        self.run_blocking(|conn| Ok(conn.is_autocommit())).await
    }

    /// Close the connection, reporting the driver's close error.
    ///
    /// # Errors
    /// Returns `SqlSessionError::SqliteError` if `SQLite` refuses to close.
    pub async fn close(self) -> Result<(), SqlSessionError> {
        let db_path = self.db_path;
        let handle = self.handle;
        tokio::task::spawn_blocking(move || match Arc::try_unwrap(handle) {
            Ok(mutex) => mutex
                .into_inner()
                .close()
                .map_err(|(_conn, err)| SqlSessionError::SqliteError(err)),
            // a blocking task still holds a clone; the last clone closes on drop
            Err(_) => Ok(()),
        })
        .await
        .map_err(join_error)??;
        tracing::debug!(db_path = %db_path, "closed sqlite connection");
        Ok(())
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

fn join_error(err: tokio::task::JoinError) -> SqlSessionError {
    SqlSessionError::ExecutionError(format!("sqlite spawn_blocking join error: {err}"))
}
