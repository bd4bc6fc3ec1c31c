use crate::config::ConnectOptions;
use crate::error::SqlSessionError;
use crate::results::ResultSet;
use crate::types::{DatabaseType, RowValues};

#[cfg(feature = "postgres")]
use crate::postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteConnection;

/// The single driver connection a session owns, one variant per enabled backend.
#[derive(Debug)]
pub enum SessionConnection {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
    #[cfg(feature = "postgres")]
    Postgres(PostgresConnection),
}

impl SessionConnection {
    /// Validate the options and open a connection for the selected backend.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConfigError` for unusable options, or the backend's
    /// driver error when connecting fails.
    pub async fn open(options: &ConnectOptions) -> Result<Self, SqlSessionError> {
        options.validate()?;
        match options {
            #[cfg(feature = "sqlite")]
            ConnectOptions::Sqlite(opts) => Ok(Self::Sqlite(SqliteConnection::open(opts).await?)),
            #[cfg(feature = "postgres")]
            ConnectOptions::Postgres(opts) => {
                Ok(Self::Postgres(PostgresConnection::open(opts).await?))
            }
        }
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => DatabaseType::Postgres,
        }
    }

    /// # Errors
    /// Returns the backend's error if any statement in the batch fails.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.execute_batch(sql).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.execute_batch(sql).await,
        }
    }

    /// # Errors
    /// Returns the backend's error if the statement fails.
    pub async fn execute_dml(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.execute_dml(query, params).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.execute_dml(query, params).await,
        }
    }

    /// # Errors
    /// Returns the backend's error if the statement fails.
    pub async fn execute_insert(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<Option<i64>, SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.execute_insert(query, params).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.execute_insert(query, params).await,
        }
    }

    /// # Errors
    /// Returns the backend's error if the query fails.
    pub async fn execute_select(
        &mut self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.execute_select(query, params).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.execute_select(query, params).await,
        }
    }

    /// # Errors
    /// Returns the backend's error if `BEGIN` fails.
    pub async fn begin(&mut self) -> Result<(), SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.begin().await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.begin().await,
        }
    }

    /// # Errors
    /// Returns the backend's error if `COMMIT` fails.
    pub async fn commit(&mut self) -> Result<(), SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.commit().await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.commit().await,
        }
    }

    /// # Errors
    /// Returns the backend's error if `ROLLBACK` fails.
    pub async fn rollback(&mut self) -> Result<(), SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.rollback().await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.rollback().await,
        }
    }

    /// # Errors
    /// Returns the backend's error if the connection cannot be put back in autocommit.
    pub async fn reset_autocommit(&mut self) -> Result<(), SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.reset_autocommit().await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.reset_autocommit().await,
        }
    }

    /// # Errors
    /// Returns the backend's error if the driver refuses to close.
    pub async fn close(self) -> Result<(), SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.close().await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.close().await,
        }
    }
}
