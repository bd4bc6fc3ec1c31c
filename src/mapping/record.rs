use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SqlSessionError;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Conversion from a raw column value into a record field type.
///
/// The error is a short reason; [`Record::bind_column`] wraps it with the column and
/// record names.
pub trait FromRowValue: Sized {
    /// # Errors
    /// Returns the reason the value does not fit `Self`.
    fn from_row_value(value: RowValues) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &RowValues) -> String {
    format!("expected {expected}, found {}", value.kind())
}

impl FromRowValue for RowValues {
    fn from_row_value(value: RowValues) -> Result<Self, String> {
        Ok(value)
    }
}

impl FromRowValue for i64 {
    fn from_row_value(value: RowValues) -> Result<Self, String> {
        match value {
            RowValues::Int(i) => Ok(i),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl FromRowValue for i32 {
    fn from_row_value(value: RowValues) -> Result<Self, String> {
        let wide = i64::from_row_value(value)?;
        i32::try_from(wide).map_err(|e| format!("{wide} does not fit in i32: {e}"))
    }
}

impl FromRowValue for f64 {
    fn from_row_value(value: RowValues) -> Result<Self, String> {
        value.as_float().ok_or_else(|| mismatch("float", &value))
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: RowValues) -> Result<Self, String> {
        value.as_bool().ok_or_else(|| mismatch("boolean", &value))
    }
}

impl FromRowValue for String {
    fn from_row_value(value: RowValues) -> Result<Self, String> {
        match value {
            RowValues::Text(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl FromRowValue for NaiveDateTime {
    fn from_row_value(value: RowValues) -> Result<Self, String> {
        value.as_timestamp().ok_or_else(|| mismatch("timestamp", &value))
    }
}

impl FromRowValue for Vec<u8> {
    fn from_row_value(value: RowValues) -> Result<Self, String> {
        match value {
            RowValues::Blob(bytes) => Ok(bytes),
            other => Err(mismatch("blob", &other)),
        }
    }
}

impl FromRowValue for JsonValue {
    fn from_row_value(value: RowValues) -> Result<Self, String> {
        match value {
            RowValues::JSON(json) => Ok(json),
            RowValues::Text(s) => serde_json::from_str(&s).map_err(|e| format!("invalid json: {e}")),
            other => Err(mismatch("json", &other)),
        }
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: RowValues) -> Result<Self, String> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_row_value(value).map(Some)
        }
    }
}

/// A caller-declared row shape, bound column by column through an explicit field table.
///
/// Usually generated with [`record!`](crate::record); a manual impl looks like:
/// ```rust
/// use sql_session::prelude::*;
///
/// #[derive(Default)]
/// struct Tag {
///     name: String,
/// }
///
/// impl Record for Tag {
///     const NAME: &'static str = "Tag";
///     const COLUMNS: &'static [&'static str] = &["name"];
///
///     fn bind_column(&mut self, column: &str, value: RowValues) -> Result<(), SqlSessionError> {
///         match column {
///             "name" => {
///                 self.name = String::from_row_value(value).map_err(|reason| {
///                     SqlSessionError::FieldConversion {
///                         column: column.to_string(),
///                         record: Self::NAME,
///                         reason,
///                     }
///                 })?;
///                 Ok(())
///             }
///             _ => Err(SqlSessionError::UnmappedColumn {
///                 column: column.to_string(),
///                 record: Self::NAME,
///             }),
///         }
///     }
/// }
/// ```
pub trait Record: Default {
    /// Type name used in mapping errors.
    const NAME: &'static str;
    /// Column names this record can bind, in declaration order.
    const COLUMNS: &'static [&'static str];

    /// Assign `value` to the field bound to `column` (exact, case-sensitive match).
    ///
    /// # Errors
    /// `SqlSessionError::UnmappedColumn` when no field is bound to `column`,
    /// `SqlSessionError::FieldConversion` when the value does not fit the field type.
    fn bind_column(&mut self, column: &str, value: RowValues) -> Result<(), SqlSessionError>;
}

/// Build a fresh `T` from one row, binding every returned column once.
///
/// # Errors
/// `SqlSessionError::MappingError` when two columns share a name, otherwise the first
/// mapping error from [`Record::bind_column`].
pub fn map_record<T: Record>(row: CustomDbRow) -> Result<T, SqlSessionError> {
    let mut record = T::default();
    let mut bound = HashSet::new();
    for (column, value) in row.into_columns() {
        if bound.contains(&column) {
            return Err(SqlSessionError::MappingError(format!(
                "column `{column}` appears more than once in the row mapped onto {}",
                T::NAME
            )));
        }
        record.bind_column(&column, value)?;
        bound.insert(column);
    }
    Ok(record)
}

/// Map every row onto `T`; the first failing row aborts the whole mapping.
///
/// # Errors
/// Propagates the first mapping error.
pub fn rows_as_records<T: Record>(rs: ResultSet) -> Result<Vec<T>, SqlSessionError> {
    rs.into_iter().map(map_record).collect()
}

/// Map the first row onto `T`, or `None` for an empty result.
///
/// # Errors
/// Propagates any mapping error.
pub fn first_record<T: Record>(rs: ResultSet) -> Result<Option<T>, SqlSessionError> {
    rs.into_first().map(map_record).transpose()
}

/// Declare a struct together with its [`Record`] field table.
///
/// Fields bind the column with their own name unless a column name is given after `=>`.
/// ```rust
/// use sql_session::record;
///
/// record! {
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct Article {
///         pub id: i64,
///         pub title: String,
///         pub body: Option<String>,
///         pub is_blind: bool => "isBlind",
///     }
/// }
///
/// use sql_session::mapping::Record;
/// assert_eq!(Article::COLUMNS, &["id", "title", "body", "isBlind"]);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(=> $column:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::mapping::Record for $name {
            const NAME: &'static str = stringify!($name);
            const COLUMNS: &'static [&'static str] =
                &[$($crate::__record_column!($field $(, $column)?)),*];

            fn bind_column(
                &mut self,
                column: &str,
                value: $crate::RowValues,
            ) -> ::std::result::Result<(), $crate::SqlSessionError> {
                $(
                    if column == $crate::__record_column!($field $(, $column)?) {
                        self.$field = <$ty as $crate::mapping::FromRowValue>::from_row_value(value)
                            .map_err(|reason| $crate::SqlSessionError::FieldConversion {
                                column: column.to_string(),
                                record: <Self as $crate::mapping::Record>::NAME,
                                reason,
                            })?;
                        return Ok(());
                    }
                )*
                let _ = value;
                Err($crate::SqlSessionError::UnmappedColumn {
                    column: column.to_string(),
                    record: <Self as $crate::mapping::Record>::NAME,
                })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_column {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $column:literal) => {
        $column
    };
}
