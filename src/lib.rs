//! Minimal SQL access layer: build statements with `?` markers, run them through a
//! session that owns one connection, and map rows onto maps, scalars or records.
//!
//! ```rust,no_run
//! use sql_session::prelude::*;
//!
//! sql_session::record! {
//!     #[derive(Debug, Default)]
//!     pub struct Article {
//!         pub id: i64,
//!         pub title: String,
//!     }
//! }
//!
//! # async fn demo() -> Result<(), SqlSessionError> {
//! let db = Database::new(SqliteOptions::new("board.db"));
//! let mut session = db.session();
//! session.start_transaction().await?;
//! let id = session
//!     .gen_sql()
//!     .append_with("INSERT INTO article (title) VALUES (?)", ["hello"])
//!     .insert()
//!     .await?;
//! let articles: Vec<Article> = session
//!     .gen_sql()
//!     .append("SELECT id, title FROM article")
//!     .append_in("WHERE id IN (?)", [id])
//!     .select_rows_as()
//!     .await?;
//! session.commit().await?;
//! session.close().await?;
//! # let _ = articles;
//! # Ok(()) }
//! ```

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one backend feature: `sqlite` or `postgres`");

pub mod builder;
pub mod config;
pub mod error;
pub mod executor;
pub mod mapping;
pub mod placeholders;
pub mod prelude;
pub mod results;
pub mod session;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use builder::{QueryAndParams, StatementBuilder};
pub use error::SqlSessionError;
pub use session::{Database, Session, SessionState, Sql};
pub use types::{DatabaseType, RowValues};
