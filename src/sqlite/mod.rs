// SQLite backend
//
// - connection: opening, blocking execution and transaction control
// - params: conversion from `RowValues` to rusqlite values
// - query: result extraction and building

pub mod connection;
pub mod params;
pub mod query;

pub use connection::SqliteConnection;
pub use params::Params;
pub use query::build_result_set;
