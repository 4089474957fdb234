pub use connection::{Connection, InterruptHandle};
pub use error::SqliteError;
pub use statement::{MappedRows, Statement};
pub use type_info::Affinity;

/// SQLite connection handling.
pub(crate) mod connection;
/// SQLite error types and helpers.
pub mod error;
/// Raw FFI bindings.
pub(crate) mod ffi;
/// Prepared statements.
mod statement;
/// Column affinity derived from declared types.
mod type_info;
