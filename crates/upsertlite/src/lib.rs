//! A synchronous SQLite layer with typed parameter binding and a bulk upsert engine.
//!
//! ```
//! use upsertlite::{Connection, Record, batch_upsert, load_table_meta};
//!
//! # fn main() -> upsertlite::Result<()> {
//! let conn = Connection::open_in_memory()?;
//! conn.exec("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)")?;
//! let meta = load_table_meta(&conn, "people")?;
//!
//! let records = vec![
//!     Record::new().with("id", 1i64).with("name", "Ada"),
//!     Record::new().with("id", 2i64).with("age", 36i32),
//! ];
//! let summary = batch_upsert(&records, &conn, &meta)?;
//! assert_eq!(summary.inserted, 2);
//!
//! let (name,): (String,) = conn.prepare("SELECT name FROM people WHERE id = 1")?.fetch_one()?;
//! assert_eq!(name, "Ada");
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod enum_mode;

mod batch;
pub mod decode;
pub mod encode;
mod error;
mod logger;
mod options;
mod record;
mod row;
pub mod schema;
mod slot;
pub mod sql;
mod sqlite;
mod transaction;
pub mod types;
mod value;

pub use either::Either;

pub use upsertlite_macros::*;

pub use crate::{
    batch::{
        CacheStats, InsertSummary, UpsertSummary, Upserted, batch_insert, batch_insert_with,
        batch_upsert, batch_upsert_with, insert_record, update_record, upsert_record,
    },
    decode::Decode,
    encode::{Encode, Null},
    error::{ConversionError, Error, Result},
    logger::LogSettings,
    options::{
        BatchOptions, DEFAULT_CACHE_CAPACITY, FieldOrder, JournalMode, Options, Synchronous,
        TransactionBehavior,
    },
    record::{FieldName, FieldSet, Record},
    row::{BindAll, FromRow},
    schema::{FieldMeta, TableMeta, load_all_table_meta, load_table_meta},
    slot::{AutoBinder, AutoGetter, ColumnSlot, ParamSlot},
    sql::quote_identifier,
    sqlite::{
        Affinity, Connection, InterruptHandle, MappedRows, SqliteError, Statement,
        error::{ExtendedErrCode, PrimaryErrCode},
    },
    transaction::Transaction,
    value::{StorageClass, StorageValue},
};
