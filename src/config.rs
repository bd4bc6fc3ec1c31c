use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SqlSessionError;
use crate::types::DatabaseType;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_POSTGRES_PORT: u16 = 5432;

/// Where and how a session connects.
///
/// Deserialises from a tagged table so hosts can keep it in their own config files:
/// ```rust
/// use sql_session::prelude::*;
///
/// let opts: ConnectOptions =
///     serde_json::from_str(r#"{ "backend": "sqlite", "db_path": "app.db" }"#).unwrap();
/// assert_eq!(opts.database_type(), DatabaseType::Sqlite);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ConnectOptions {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteOptions),
    #[cfg(feature = "postgres")]
    Postgres(PostgresOptions),
}

impl ConnectOptions {
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "sqlite")]
            ConnectOptions::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            ConnectOptions::Postgres(_) => DatabaseType::Postgres,
        }
    }

    /// Reject options that cannot possibly connect.
    ///
    /// # Errors
    /// Returns `SqlSessionError::ConfigError` naming the missing field.
    pub fn validate(&self) -> Result<(), SqlSessionError> {
        match self {
            #[cfg(feature = "sqlite")]
            ConnectOptions::Sqlite(opts) => {
                if opts.db_path.trim().is_empty() {
                    return Err(SqlSessionError::ConfigError(
                        "db_path is required".to_string(),
                    ));
                }
            }
            #[cfg(feature = "postgres")]
            ConnectOptions::Postgres(opts) => {
                if opts.host.trim().is_empty() {
                    return Err(SqlSessionError::ConfigError("host is required".to_string()));
                }
                if opts.dbname.trim().is_empty() {
                    return Err(SqlSessionError::ConfigError(
                        "dbname is required".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Options for opening a `SQLite` database. `:memory:` opens a private in-memory
/// database per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteOptions {
    pub db_path: String,
    #[serde(with = "duration_millis")]
    pub busy_timeout: Duration,
    pub foreign_keys: bool,
    /// Switch file databases to WAL journaling on connect.
    pub wal: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            db_path: String::new(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            foreign_keys: true,
            wal: true,
        }
    }
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path == ":memory:"
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn wal(mut self, enabled: bool) -> Self {
        self.opts.wal = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }
}

#[cfg(feature = "sqlite")]
impl From<SqliteOptions> for ConnectOptions {
    fn from(opts: SqliteOptions) -> Self {
        ConnectOptions::Sqlite(opts)
    }
}

/// Options for connecting to a Postgres server.
#[derive(Clone, Serialize, Deserialize)]
pub struct PostgresOptions {
    pub host: String,
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    pub dbname: String,
}

fn default_postgres_port() -> u16 {
    DEFAULT_POSTGRES_PORT
}

impl PostgresOptions {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_POSTGRES_PORT,
            user: user.into(),
            password: password.into(),
            dbname: dbname.into(),
        }
    }

    #[must_use]
    pub fn builder(host: impl Into<String>, dbname: impl Into<String>) -> PostgresOptionsBuilder {
        PostgresOptionsBuilder::new(host, dbname)
    }

    /// `host:port/dbname`, the form used in log lines.
    #[must_use]
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.dbname)
    }
}

impl fmt::Debug for PostgresOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .finish()
    }
}

/// Fluent builder for Postgres options.
#[derive(Debug, Clone)]
pub struct PostgresOptionsBuilder {
    opts: PostgresOptions,
}

impl PostgresOptionsBuilder {
    #[must_use]
    pub fn new(host: impl Into<String>, dbname: impl Into<String>) -> Self {
        Self {
            opts: PostgresOptions::new(host, "", "", dbname),
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.opts.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.opts.password = password.into();
        self
    }

    #[must_use]
    pub fn finish(self) -> PostgresOptions {
        self.opts
    }
}

#[cfg(feature = "postgres")]
impl From<PostgresOptions> for ConnectOptions {
    fn from(opts: PostgresOptions) -> Self {
        ConnectOptions::Postgres(opts)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_builder_overrides_defaults() {
        let opts = SqliteOptions::builder("app.db")
            .busy_timeout(Duration::from_millis(250))
            .foreign_keys(false)
            .wal(false)
            .finish();
        assert_eq!(opts.db_path, "app.db");
        assert_eq!(opts.busy_timeout, Duration::from_millis(250));
        assert!(!opts.foreign_keys);
        assert!(!opts.wal);
    }

    #[test]
    fn postgres_debug_redacts_password() {
        let opts = PostgresOptions::builder("localhost", "board")
            .user("app")
            .password("hunter2")
            .port(5433)
            .finish();
        let printed = format!("{opts:?}");
        assert!(!printed.contains("hunter2"));
        assert_eq!(opts.target(), "localhost:5433/board");
    }

    #[cfg(feature = "sqlite")]
    #[test]
    #[allow(irrefutable_let_patterns)]
    fn sqlite_options_deserialize_with_defaults() {
        let opts: ConnectOptions =
            serde_json::from_str(r#"{ "backend": "sqlite", "db_path": "x.db", "busy_timeout": 100 }"#)
                .unwrap();
        let ConnectOptions::Sqlite(sqlite) = &opts else {
            panic!("expected sqlite options");
        };
        assert_eq!(sqlite.busy_timeout, Duration::from_millis(100));
        assert!(sqlite.foreign_keys);
        assert!(opts.validate().is_ok());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn empty_sqlite_path_is_rejected() {
        let err = ConnectOptions::from(SqliteOptions::new(" ")).validate().unwrap_err();
        assert!(matches!(err, SqlSessionError::ConfigError(_)));
    }
}
