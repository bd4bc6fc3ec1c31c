// Postgres backend
//
// - connection: client/driver-task lifecycle, statement execution, transaction control
// - params: `ToSql` for `RowValues`
// - query: result extraction and building

pub mod connection;
pub mod params;
pub mod query;

pub use connection::PostgresConnection;
pub use params::Params;
pub use query::build_result_set;
