use chrono::NaiveDateTime;

use crate::builder::{QueryAndParams, StatementBuilder};
use crate::error::SqlSessionError;
use crate::mapping::{self, Record, RowMap};
use crate::results::ResultSet;
use crate::types::RowValues;

use super::Session;

/// One statement under construction, bound to the session that will run it.
///
/// Fragments are appended fluently with bare `?` markers; a terminal method consumes
/// the builder and executes the statement on the session's connection.
#[derive(Debug)]
pub struct Sql<'s> {
    session: &'s mut Session,
    builder: StatementBuilder,
}

impl<'s> Sql<'s> {
    pub(super) fn new(session: &'s mut Session, builder: StatementBuilder) -> Self {
        Self { session, builder }
    }

    #[must_use]
    pub fn append(mut self, fragment: &str) -> Self {
        self.builder.append(fragment);
        self
    }

    #[must_use]
    pub fn append_with<I, V>(mut self, fragment: &str, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RowValues>,
    {
        self.builder.append_with(fragment, params);
        self
    }

    #[must_use]
    pub fn append_in<I, V>(mut self, fragment: &str, params: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RowValues>,
    {
        self.builder.append_in(fragment, params);
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.builder.text()
    }

    #[must_use]
    pub fn params(&self) -> &[RowValues] {
        self.builder.params()
    }

    fn into_parts(self) -> (&'s mut Session, QueryAndParams) {
        (self.session, self.builder.build())
    }

    /// Run the INSERT and return the generated key, `-1` when there is none.
    ///
    /// # Errors
    /// Returns the connect or driver error.
    pub async fn insert(self) -> Result<i64, SqlSessionError> {
        let (session, statement) = self.into_parts();
        session.executor().await?.execute_insert(&statement).await
    }

    /// # Errors
    /// Returns the connect or driver error.
    pub async fn update(self) -> Result<usize, SqlSessionError> {
        let (session, statement) = self.into_parts();
        session.executor().await?.execute_update(&statement).await
    }

    /// # Errors
    /// Returns the connect or driver error.
    pub async fn delete(self) -> Result<usize, SqlSessionError> {
        self.update().await
    }

    /// Run the query and pass its rows to a caller-supplied extractor.
    ///
    /// # Errors
    /// Returns the connect or driver error, or the extractor's error.
    pub async fn select_with<T, F>(self, extractor: F) -> Result<T, SqlSessionError>
    where
        F: FnOnce(ResultSet) -> Result<T, SqlSessionError>,
    {
        let (session, statement) = self.into_parts();
        session.executor().await?.query(&statement, extractor).await
    }

    /// # Errors
    /// Returns the connect or driver error.
    pub async fn select_rows(self) -> Result<Vec<RowMap>, SqlSessionError> {
        self.select_with(mapping::rows_as_maps).await
    }

    /// # Errors
    /// Returns the connect or driver error.
    pub async fn select_row(self) -> Result<Option<RowMap>, SqlSessionError> {
        self.select_with(mapping::first_row_as_map).await
    }

    /// # Errors
    /// Returns the connect or driver error, or the first mapping error.
    pub async fn select_rows_as<T: Record>(self) -> Result<Vec<T>, SqlSessionError> {
        self.select_with(mapping::rows_as_records::<T>).await
    }

    /// # Errors
    /// Returns the connect or driver error, or a mapping error.
    pub async fn select_row_as<T: Record>(self) -> Result<Option<T>, SqlSessionError> {
        self.select_with(mapping::first_record::<T>).await
    }

    /// First column of the first row as an integer; `-1` when nothing was found. Floats
    /// truncate toward zero and numeric text is parsed.
    ///
    /// # Errors
    /// Returns the connect or driver error, or a mapping error for values that cannot be
    /// read as an integer.
    pub async fn select_long(self) -> Result<i64, SqlSessionError> {
        self.select_with(mapping::first_long).await
    }

    /// # Errors
    /// Returns the connect or driver error, or a mapping error for values that cannot be
    /// read as an integer.
    pub async fn select_longs(self) -> Result<Vec<i64>, SqlSessionError> {
        self.select_with(mapping::first_column_longs).await
    }

    /// # Errors
    /// Returns the connect or driver error, or a mapping error.
    pub async fn select_string(self) -> Result<Option<String>, SqlSessionError> {
        self.select_with(mapping::first_string).await
    }

    /// # Errors
    /// Returns the connect or driver error, or a mapping error.
    pub async fn select_boolean(self) -> Result<Option<bool>, SqlSessionError> {
        self.select_with(mapping::first_bool).await
    }

    /// # Errors
    /// Returns the connect or driver error, or a mapping error.
    pub async fn select_datetime(self) -> Result<Option<NaiveDateTime>, SqlSessionError> {
        self.select_with(mapping::first_datetime).await
    }
}
