mod dispatch;
mod query_log;

pub use dispatch::SessionConnection;
pub(crate) use query_log::QueryLog;

use crate::builder::QueryAndParams;
use crate::error::SqlSessionError;
use crate::results::ResultSet;

/// Runs statements against the connection of one session.
///
/// Borrowed through [`Session::executor`](crate::session::Session::executor) for as long
/// as the caller needs it; every call waits for the driver before returning.
#[derive(Debug)]
pub struct StatementExecutor<'c> {
    conn: &'c mut SessionConnection,
    dev_mode: bool,
}

impl<'c> StatementExecutor<'c> {
    pub(crate) fn new(conn: &'c mut SessionConnection, dev_mode: bool) -> Self {
        Self { conn, dev_mode }
    }

    /// Execute an UPDATE/DELETE (or any DML) and return the affected-row count.
    ///
    /// # Errors
    /// Returns the backend's driver error if preparing, binding or executing fails.
    pub async fn execute_update(
        &mut self,
        statement: &QueryAndParams,
    ) -> Result<usize, SqlSessionError> {
        let mut log = QueryLog::start(self.dev_mode, statement);
        let result = self
            .conn
            .execute_dml(&statement.query, &statement.params)
            .await;
        log.finish(&result);
        result
    }

    /// Execute an INSERT and return the first generated key, or `-1` when the statement
    /// generated none.
    ///
    /// On Postgres the key is read from the statement's own result, so write
    /// `INSERT ... RETURNING id`.
    ///
    /// # Errors
    /// Returns the backend's driver error if preparing, binding or executing fails.
    pub async fn execute_insert(
        &mut self,
        statement: &QueryAndParams,
    ) -> Result<i64, SqlSessionError> {
        let mut log = QueryLog::start(self.dev_mode, statement);
        let result = self
            .conn
            .execute_insert(&statement.query, &statement.params)
            .await
            .map(|key| key.unwrap_or(-1));
        log.finish(&result);
        result
    }

    /// Run a query and hand the materialised rows to `extractor`.
    ///
    /// # Errors
    /// Returns the driver error if the query fails, otherwise whatever the extractor
    /// returns.
    pub async fn query<T, F>(
        &mut self,
        statement: &QueryAndParams,
        extractor: F,
    ) -> Result<T, SqlSessionError>
    where
        F: FnOnce(ResultSet) -> Result<T, SqlSessionError>,
    {
        let mut log = QueryLog::start(self.dev_mode, statement);
        let result = self
            .conn
            .execute_select(&statement.query, &statement.params)
            .await
            .and_then(extractor);
        log.finish(&result);
        result
    }

    /// Execute raw SQL, possibly several statements, without parameters.
    ///
    /// # Errors
    /// Returns the backend's driver error if any statement fails.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlSessionError> {
        let statement = QueryAndParams::new(sql, Vec::new());
        let mut log = QueryLog::start(self.dev_mode, &statement);
        let result = self.conn.execute_batch(sql).await;
        log.finish(&result);
        result
    }
}
