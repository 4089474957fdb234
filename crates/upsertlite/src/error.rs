//! Types for working with errors produced by upsertlite.

use std::io;
use std::num::TryFromIntError;

use crate::{StorageClass, sqlite::error::SqliteError};

/// A specialized `Result` type for upsertlite.
pub type Result<T> = std::result::Result<T, Error>;

/// A value could not be projected onto a storage class, or a column could not be read back
/// into the requested type.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConversionError {
    /// The value does not fit the target representation.
    #[error("value {value} is out of range for {type_name}")]
    OutOfRange {
        type_name: &'static str,
        value: String,
    },

    /// A NULL column was read into a type that has no empty state.
    #[error("unexpected NULL while decoding {type_name}")]
    UnexpectedNull { type_name: &'static str },

    /// The column holds a storage class the target type does not accept.
    #[error("cannot decode {type_name} from a {found} value")]
    DataType {
        type_name: &'static str,
        found: StorageClass,
    },

    /// A TEXT column holds bytes that are not valid UTF-8.
    #[error("invalid UTF-8 in text value: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A borrowing type was decoded from a value that does not borrow a column buffer.
    #[error("cannot borrow {type_name} from a column value that is not borrowed")]
    NotBorrowed { type_name: &'static str },

    #[error("conversion error: {0}")]
    Custom(String),
}

impl ConversionError {
    pub(crate) fn out_of_range(type_name: &'static str, value: impl ToString) -> Self {
        ConversionError::OutOfRange {
            type_name,
            value: value.to_string(),
        }
    }
}

impl From<TryFromIntError> for ConversionError {
    fn from(err: TryFromIntError) -> Self {
        ConversionError::Custom(err.to_string())
    }
}

impl From<String> for ConversionError {
    fn from(err: String) -> Self {
        ConversionError::Custom(err)
    }
}

/// Represents all the ways a method can fail within upsertlite.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error returned from the database. Code and message are kept verbatim.
    #[error("error returned from database: {0}")]
    Sqlite(#[source] SqliteError),

    /// I/O error while opening the database.
    #[error("error communicating with database: {0}")]
    Io(#[from] io::Error),

    /// Unexpected or invalid data, e.g. SQL text containing a nul byte.
    #[error("encountered unexpected or invalid data: {0}")]
    Protocol(String),

    /// A value could not be converted to or from its storage class.
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// Error occurred while decoding a value from a specific column.
    #[error("error occurred while decoding column {index}: {source}")]
    ColumnDecode {
        index: String,

        #[source]
        source: ConversionError,
    },

    /// A record references a column that does not exist in the table.
    #[error("table {table:?} has no field named {field:?}")]
    UnknownField { table: String, field: String },

    /// Upsert was requested on a table that has no single-column primary key.
    #[error("table {table:?} has no primary key")]
    NoPrimaryKey { table: String },

    /// A record passed to an upsert does not carry the primary key.
    #[error("record for table {table:?} is missing primary key {pk:?}")]
    RecordMissingPk { table: String, pk: String },

    /// The table is not present in the database.
    #[error("no table named {0:?}")]
    TableNotFound(String),

    /// No named parameter matches the given name.
    #[error("no parameter named {0:?}")]
    NoSuchParameter(String),

    /// No row was returned by a query that expected one.
    #[error("no rows returned by a query that expected to return at least one row")]
    RowNotFound,

    /// Column index was out of bounds.
    #[error("column index out of bounds: the len is {len}, but the index is {index}")]
    ColumnIndexOutOfBounds { index: usize, len: usize },

    /// No column found for the given name.
    #[error("no column found for name: {0}")]
    ColumnNotFound(String),
}

impl Error {
    pub fn into_sqlite_error(self) -> Option<SqliteError> {
        match self {
            Error::Sqlite(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_sqlite_error(&self) -> Option<&SqliteError> {
        match self {
            Error::Sqlite(err) => Some(err),
            _ => None,
        }
    }

    /// The conversion failure behind this error, whether or not it was tied to a column.
    pub fn as_conversion_error(&self) -> Option<&ConversionError> {
        match self {
            Error::Conversion(err) | Error::ColumnDecode { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

impl From<SqliteError> for Error {
    fn from(error: SqliteError) -> Self {
        Error::Sqlite(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_carries_type_and_value() {
        let err = ConversionError::out_of_range("i64", u64::MAX);
        assert_eq!(
            err.to_string(),
            "value 18446744073709551615 is out of range for i64"
        );
    }

    #[test]
    fn conversion_errors_lift_into_error() {
        let err: Error = ConversionError::UnexpectedNull { type_name: "i32" }.into();
        assert!(matches!(
            err,
            Error::Conversion(ConversionError::UnexpectedNull { .. })
        ));
        assert!(err.into_sqlite_error().is_none());
    }
}
