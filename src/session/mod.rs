//! Transaction-scoped sessions: one lazily opened connection per session, with explicit
//! transaction demarcation.

mod sql;

use std::sync::Arc;

pub use sql::Sql;

use crate::builder::{QueryAndParams, StatementBuilder};
use crate::config::ConnectOptions;
use crate::error::SqlSessionError;
use crate::executor::{SessionConnection, StatementExecutor};
use crate::placeholders::PlaceholderStyle;
use crate::types::{DatabaseType, RowValues};

/// Connection options plus the dev-mode flag. Cheap to clone; hand one to every task
/// that needs to open sessions.
///
/// ```rust,no_run
/// use sql_session::prelude::*;
///
/// # async fn demo() -> Result<(), SqlSessionError> {
/// let db = Database::new(SqliteOptions::new("board.db")).with_dev_mode(true);
/// let mut session = db.session();
/// let count = session
///     .gen_sql()
///     .append("SELECT COUNT(*) FROM article")
///     .append_with("WHERE isBlind = ?", [false])
///     .select_long()
///     .await?;
/// session.close().await?;
/// # let _ = count;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    options: Arc<ConnectOptions>,
    dev_mode: bool,
}

impl Database {
    #[must_use]
    pub fn new(options: impl Into<ConnectOptions>) -> Self {
        Self {
            options: Arc::new(options.into()),
            dev_mode: false,
        }
    }

    /// Log every statement (text, parameters, outcome, elapsed time) at info level.
    #[must_use]
    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    /// A new, unconnected session. The connection opens on first use.
    #[must_use]
    pub fn session(&self) -> Session {
        Session {
            options: Arc::clone(&self.options),
            dev_mode: self.dev_mode,
            conn: None,
            in_transaction: false,
        }
    }

    #[must_use]
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.options.database_type()
    }

    #[must_use]
    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Autocommit,
    InTransaction,
}

/// A unit of work owning at most one connection.
///
/// Statements run in autocommit mode until [`start_transaction`](Self::start_transaction);
/// the transaction then spans every statement until [`commit`](Self::commit) or
/// [`rollback`](Self::rollback). [`close`](Self::close) commits a transaction left open;
/// dropping the session instead releases its connection, which rolls it back.
#[derive(Debug)]
pub struct Session {
    options: Arc<ConnectOptions>,
    dev_mode: bool,
    conn: Option<SessionConnection>,
    in_transaction: bool,
}

impl Session {
    #[must_use]
    pub fn state(&self) -> SessionState {
        match (&self.conn, self.in_transaction) {
            (None, _) => SessionState::Unconnected,
            (Some(_), false) => SessionState::Autocommit,
            (Some(_), true) => SessionState::InTransaction,
        }
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.options.database_type()
    }

    #[must_use]
    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Open the connection now instead of on the first statement.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConfigError` for unusable options or the driver error
    /// if connecting fails.
    pub async fn connect(&mut self) -> Result<(), SqlSessionError> {
        self.connection().await.map(|_| ())
    }

    async fn connection(&mut self) -> Result<&mut SessionConnection, SqlSessionError> {
        if self.conn.is_none() {
            self.conn = Some(SessionConnection::open(&self.options).await?);
        }
        self.conn.as_mut().ok_or_else(|| {
            SqlSessionError::ConnectionError("session connection was not established".to_string())
        })
    }

    /// Borrow an executor over this session's connection, connecting if needed.
    ///
    /// # Errors
    /// Returns the connect error when the session was unconnected and opening failed.
    pub async fn executor(&mut self) -> Result<StatementExecutor<'_>, SqlSessionError> {
        let dev_mode = self.dev_mode;
        let conn = self.connection().await?;
        Ok(StatementExecutor::new(conn, dev_mode))
    }

    /// A fresh statement builder bound to this session.
    pub fn gen_sql(&mut self) -> Sql<'_> {
        let style = PlaceholderStyle::for_database(self.database_type());
        Sql::new(self, StatementBuilder::new(style))
    }

    /// Execute raw SQL (one or more statements) and discard any result.
    ///
    /// # Errors
    /// Returns the connect error or the driver error of the failing statement.
    pub async fn run(&mut self, sql: &str) -> Result<(), SqlSessionError> {
        self.executor().await?.execute_batch(sql).await
    }

    /// Execute one statement written with the backend's own placeholders (`?1` on
    /// `SQLite`, `$1` on Postgres) and return the affected-row count.
    ///
    /// # Errors
    /// Returns the connect error or the driver error.
    pub async fn run_with(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlSessionError> {
        let statement = QueryAndParams::new(sql, params.to_vec());
        self.executor().await?.execute_update(&statement).await
    }

    /// Leave autocommit mode; every following statement joins the transaction.
    ///
    /// # Errors
    /// `SqlSessionError::ExecutionError` if a transaction is already open, otherwise the
    /// connect or `BEGIN` error.
    pub async fn start_transaction(&mut self) -> Result<(), SqlSessionError> {
        if self.in_transaction {
            return Err(SqlSessionError::ExecutionError(
                "a transaction is already open on this session".to_string(),
            ));
        }
        self.connection().await?.begin().await?;
        self.in_transaction = true;
        Ok(())
    }

    /// Commit the open transaction and return to autocommit.
    ///
    /// A failed commit rolls the transaction back before its error is returned.
    ///
    /// # Errors
    /// `SqlSessionError::ExecutionError` without a transaction, otherwise the driver's
    /// commit error.
    pub async fn commit(&mut self) -> Result<(), SqlSessionError> {
        let conn = self.transaction_connection("commit")?;
        let result = commit_or_roll_back(conn).await;
        self.in_transaction = false;
        result
    }

    /// Discard the open transaction and return to autocommit.
    ///
    /// # Errors
    /// `SqlSessionError::ExecutionError` without a transaction, otherwise the driver's
    /// rollback error. The session is back in autocommit either way.
    pub async fn rollback(&mut self) -> Result<(), SqlSessionError> {
        let conn = self.transaction_connection("roll back")?;
        let result = conn.rollback().await;
        if result.is_err() {
            if let Err(reset_err) = conn.reset_autocommit().await {
                tracing::warn!(error = %reset_err, "could not restore autocommit");
            }
        }
        self.in_transaction = false;
        result
    }

    fn transaction_connection(
        &mut self,
        action: &str,
    ) -> Result<&mut SessionConnection, SqlSessionError> {
        match self.conn.as_mut() {
            Some(conn) if self.in_transaction => Ok(conn),
            _ => Err(SqlSessionError::ExecutionError(format!(
                "no open transaction to {action}"
            ))),
        }
    }

    /// Release the connection. An open transaction is committed first, or rolled back if
    /// that commit fails; a session without a connection closes as a no-op. The session
    /// can be used again and will reconnect on demand.
    ///
    /// # Errors
    /// Returns the commit error of an open transaction, else the driver's close error.
    /// The session is unconnected regardless.
    pub async fn close(&mut self) -> Result<(), SqlSessionError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        let committed = if std::mem::take(&mut self.in_transaction) {
            commit_or_roll_back(&mut conn).await
        } else {
            Ok(())
        };
        let closed = conn.close().await;
        committed.and(closed)
    }
}

/// `COMMIT`; on failure roll back, falling back to a forced autocommit reset, and return
/// the commit error.
async fn commit_or_roll_back(conn: &mut SessionConnection) -> Result<(), SqlSessionError> {
    let result = conn.commit().await;
    if let Err(commit_err) = &result {
        tracing::debug!(error = %commit_err, "commit failed, rolling back");
        if let Err(rollback_err) = conn.rollback().await {
            tracing::warn!(error = %rollback_err, "rollback after failed commit also failed");
            if let Err(reset_err) = conn.reset_autocommit().await {
                tracing::warn!(error = %reset_err, "could not restore autocommit");
            }
        }
    }
    result
}
