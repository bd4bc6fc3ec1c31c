//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to open sessions, build
//! statements and map their results.

pub use crate::builder::{QueryAndParams, StatementBuilder};
pub use crate::config::{
    ConnectOptions, PostgresOptions, PostgresOptionsBuilder, SqliteOptions, SqliteOptionsBuilder,
};
pub use crate::error::SqlSessionError;
pub use crate::executor::StatementExecutor;
pub use crate::mapping::{FromRowValue, Record, RowMap};
pub use crate::placeholders::PlaceholderStyle;
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::session::{Database, Session, SessionState, Sql};
pub use crate::types::{DatabaseType, RowValues};
