use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlSessionError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    /// A result column has no field with the same name on the target record.
    #[error("Mapping error: column `{column}` has no matching field on {record}")]
    UnmappedColumn { column: String, record: &'static str },

    /// A column value could not be converted into the type of its record field.
    #[error("Mapping error: column `{column}` cannot be assigned to {record}: {reason}")]
    FieldConversion {
        column: String,
        record: &'static str,
        reason: String,
    },

    #[error("Mapping error: {0}")]
    MappingError(String),
}

impl SqlSessionError {
    /// True for failures raised by the driver while connecting, preparing, executing,
    /// committing, rolling back or closing.
    #[must_use]
    pub fn is_driver_error(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            Self::SqliteError(_) => true,
            #[cfg(feature = "postgres")]
            Self::PostgresError(_) => true,
            Self::ConnectionError(_) | Self::ExecutionError(_) => true,
            _ => false,
        }
    }

    /// True for failures raised while turning result rows into caller types.
    #[must_use]
    pub fn is_mapping_error(&self) -> bool {
        matches!(
            self,
            Self::UnmappedColumn { .. } | Self::FieldConversion { .. } | Self::MappingError(_)
        )
    }
}
