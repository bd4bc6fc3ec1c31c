//! Extractors that turn a [`ResultSet`] into caller-facing shapes.
//!
//! Every function here has the `FnOnce(ResultSet) -> Result<T, SqlSessionError>` shape
//! expected by [`StatementExecutor::query`](crate::executor::StatementExecutor::query).

mod record;

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::error::SqlSessionError;
use crate::results::ResultSet;
use crate::types::RowValues;

pub use record::{FromRowValue, Record, first_record, map_record, rows_as_records};

/// One row as column name → value.
pub type RowMap = HashMap<String, RowValues>;

/// Every row as a column-name map. Column names are read once from the result metadata.
///
/// # Errors
/// Never fails; the `Result` keeps the extractor signature uniform.
pub fn rows_as_maps(rs: ResultSet) -> Result<Vec<RowMap>, SqlSessionError> {
    let columns = rs.column_names().to_vec();
    Ok(rs
        .into_iter()
        .map(|row| columns.iter().cloned().zip(row.values).collect())
        .collect())
}

/// The first row as a column-name map, or `None` for an empty result.
///
/// # Errors
/// Never fails; the `Result` keeps the extractor signature uniform.
pub fn first_row_as_map(rs: ResultSet) -> Result<Option<RowMap>, SqlSessionError> {
    let columns = rs.column_names().to_vec();
    Ok(rs
        .into_first()
        .map(|row| columns.into_iter().zip(row.values).collect()))
}

/// First column of the first row, or `None` when there is no row or the value is NULL.
fn first_value(rs: ResultSet) -> Option<RowValues> {
    rs.into_first()
        .and_then(|row| row.values.into_iter().next())
        .filter(|value| !value.is_null())
}

/// First column of the first row as an integer; `-1` when the result is empty.
///
/// # Errors
/// Returns `SqlSessionError::MappingError` if the value cannot be read as an integer.
/// Floats truncate toward zero and numeric text is parsed.
pub fn first_long(rs: ResultSet) -> Result<i64, SqlSessionError> {
    first_value(rs).map_or(Ok(-1), |value| value_to_long(&value))
}

/// First column of every row as integers.
///
/// # Errors
/// Returns `SqlSessionError::MappingError` if any value is NULL or cannot be read as an
/// integer (same coercions as [`first_long`]).
pub fn first_column_longs(rs: ResultSet) -> Result<Vec<i64>, SqlSessionError> {
    rs.into_iter()
        .map(|row| match row.values.first() {
            Some(value) => value_to_long(value),
            None => Err(SqlSessionError::MappingError(
                "row has no columns".to_string(),
            )),
        })
        .collect()
}

/// First column of the first row rendered as text; `None` when the result is empty.
///
/// # Errors
/// Returns `SqlSessionError::MappingError` for binary values.
pub fn first_string(rs: ResultSet) -> Result<Option<String>, SqlSessionError> {
    first_value(rs)
        .map(|value| match value {
            RowValues::Text(s) => Ok(s),
            RowValues::Int(i) => Ok(i.to_string()),
            RowValues::Float(f) => Ok(f.to_string()),
            RowValues::Bool(b) => Ok(b.to_string()),
            RowValues::Timestamp(ts) => Ok(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            RowValues::JSON(json) => Ok(json.to_string()),
            other => Err(SqlSessionError::MappingError(format!(
                "cannot read {} as text",
                other.kind()
            ))),
        })
        .transpose()
}

/// First column of the first row as a boolean; `None` when the result is empty.
///
/// Any non-zero integer reads as `true`.
///
/// # Errors
/// Returns `SqlSessionError::MappingError` if the value is neither boolean nor integer.
pub fn first_bool(rs: ResultSet) -> Result<Option<bool>, SqlSessionError> {
    first_value(rs)
        .map(|value| match value {
            RowValues::Bool(b) => Ok(b),
            RowValues::Int(i) => Ok(i != 0),
            other => Err(SqlSessionError::MappingError(format!(
                "cannot read {} as boolean",
                other.kind()
            ))),
        })
        .transpose()
}

/// First column of the first row as a local date-time; `None` when the result is empty.
///
/// # Errors
/// Returns `SqlSessionError::MappingError` if the value is not a timestamp.
pub fn first_datetime(rs: ResultSet) -> Result<Option<NaiveDateTime>, SqlSessionError> {
    first_value(rs)
        .map(|value| {
            value.as_timestamp().ok_or_else(|| {
                SqlSessionError::MappingError(format!("cannot read {} as timestamp", value.kind()))
            })
        })
        .transpose()
}

/// 2^63; every `f64` strictly below it (and at or above its negation) fits an `i64`.
const LONG_LIMIT: f64 = 9_223_372_036_854_775_808.0;

fn value_to_long(value: &RowValues) -> Result<i64, SqlSessionError> {
    match value {
        RowValues::Int(i) => Ok(*i),
        RowValues::Bool(b) => Ok(i64::from(*b)),
        RowValues::Float(f) => float_to_long(*f),
        RowValues::Text(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(i);
            }
            match s.parse::<f64>() {
                Ok(f) => float_to_long(f),
                Err(_) => Err(SqlSessionError::MappingError(format!(
                    "cannot read text {s:?} as integer"
                ))),
            }
        }
        other => Err(SqlSessionError::MappingError(format!(
            "cannot read {} as integer",
            other.kind()
        ))),
    }
}

/// Truncate toward zero.
fn float_to_long(f: f64) -> Result<i64, SqlSessionError> {
    let truncated = f.trunc();
    if truncated.is_finite() && (-LONG_LIMIT..LONG_LIMIT).contains(&truncated) {
        #[allow(clippy::cast_possible_truncation)]
        Ok(truncated as i64)
    } else {
        Err(SqlSessionError::MappingError(format!(
            "{f} is out of range for an integer"
        )))
    }
}
