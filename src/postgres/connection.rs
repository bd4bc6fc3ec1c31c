use std::borrow::Cow;
use std::fmt;

use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use crate::config::PostgresOptions;
use crate::error::SqlSessionError;
use crate::placeholders::{PlaceholderStyle, contains_keyword};
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::Params;
use super::query::{build_result_set, postgres_extract_value};

/// One Postgres client owned by a session, plus the task driving its socket.
pub struct PostgresConnection {
    client: Client,
    driver: JoinHandle<()>,
    target: String,
}

impl PostgresConnection {
    /// Connect and spawn the connection driver onto the current runtime.
    ///
    /// # Errors
    /// Returns `SqlSessionError::PostgresError` if the server rejects the connection.
    pub async fn open(opts: &PostgresOptions) -> Result<Self, SqlSessionError> {
        let mut cfg = tokio_postgres::Config::new();
        cfg.host(&opts.host)
            .port(opts.port)
            .user(&opts.user)
            .dbname(&opts.dbname);
        if !opts.password.is_empty() {
            cfg.password(&opts.password);
        }

        let (client, connection) = cfg.connect(NoTls).await?;
        let target = opts.target();
        let driver_target = target.clone();
        let driver = tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::warn!(target = %driver_target, error = %err, "postgres connection ended with error");
            }
        });

        tracing::debug!(target = %target, "opened postgres connection");
        Ok(Self {
            client,
            driver,
            target,
        })
    }

    /// Execute one or more statements without parameters.
    ///
    /// # Errors
    /// Returns `SqlSessionError::PostgresError` if any statement fails.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlSessionError> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    /// Execute a DML statement and return rows affected.
    ///
    /// # Errors
    /// Returns `SqlSessionError::PostgresError` if preparing or executing fails.
    pub async fn execute_dml(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlSessionError> {
        let stmt = self.client.prepare(query).await?;
        let converted = Params::convert(params);
        let rows = self.client.execute(&stmt, converted.as_refs()).await?;
        usize::try_from(rows).map_err(|e| {
            SqlSessionError::ExecutionError(format!("postgres affected rows conversion error: {e}"))
        })
    }

    /// Execute an INSERT; the generated key is the first column of the first row the
    /// statement returns. A statement without its own `RETURNING` clause gets
    /// `RETURNING *` appended, so the key is the table's first column.
    ///
    /// # Errors
    /// Returns `SqlSessionError::PostgresError` if preparing or executing fails.
    pub async fn execute_insert(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<Option<i64>, SqlSessionError> {
        let query = returning_generated_keys(query);
        let stmt = self.client.prepare(&query).await?;
        let converted = Params::convert(params);
        let rows = self.client.query(&stmt, converted.as_refs()).await?;
        match rows.first() {
            Some(row) if !row.is_empty() => Ok(postgres_extract_value(row, 0)?.as_int().copied()),
            _ => Ok(None),
        }
    }

    /// Execute a SELECT and collect its rows.
    ///
    /// # Errors
    /// Returns `SqlSessionError::PostgresError` if preparing or executing fails.
    pub async fn execute_select(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlSessionError> {
        let stmt = self.client.prepare(query).await?;
        let converted = Params::convert(params);
        let rows = self.client.query(&stmt, converted.as_refs()).await?;
        build_result_set(&stmt, &rows)
    }

    /// # Errors
    /// Returns `SqlSessionError::PostgresError` if `BEGIN` fails.
    pub async fn begin(&mut self) -> Result<(), SqlSessionError> {
        self.execute_batch("BEGIN").await
    }

    /// # Errors
    /// Returns `SqlSessionError::PostgresError` if `COMMIT` fails.
    pub async fn commit(&mut self) -> Result<(), SqlSessionError> {
        self.execute_batch("COMMIT").await
    }

    /// # Errors
    /// Returns `SqlSessionError::PostgresError` if `ROLLBACK` fails.
    pub async fn rollback(&mut self) -> Result<(), SqlSessionError> {
        self.execute_batch("ROLLBACK").await
    }

    /// Postgres answers a stray `ROLLBACK` with a warning only, so this always issues one.
    ///
    /// # Errors
    /// Returns `SqlSessionError::PostgresError` if the connection is gone.
    pub async fn reset_autocommit(&mut self) -> Result<(), SqlSessionError> {
        self.execute_batch("ROLLBACK").await
    }

    /// Drop the client and wait for the driver task to finish.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConnectionError` if the driver task panicked.
    pub async fn close(self) -> Result<(), SqlSessionError> {
        let Self {
            client,
            driver,
            target,
        } = self;
        drop(client);
        driver.await.map_err(|e| {
            SqlSessionError::ConnectionError(format!("postgres connection task failed: {e}"))
        })?;
        tracing::debug!(target = %target, "closed postgres connection");
        Ok(())
    }
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

fn returning_generated_keys(query: &str) -> Cow<'_, str> {
    if contains_keyword(query, PlaceholderStyle::Postgres, "RETURNING") {
        return Cow::Borrowed(query);
    }
    let body = query.trim_end();
    let body = body.strip_suffix(';').unwrap_or(body).trim_end();
    // newline so a trailing line comment cannot swallow the clause
    Cow::Owned(format!("{body}\nRETURNING *"))
}
