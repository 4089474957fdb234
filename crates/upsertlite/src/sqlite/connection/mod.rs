use std::{
    cell::Cell,
    fmt::{self, Debug, Formatter},
    path::Path,
};

use libsqlite3_sys::sqlite3;

use crate::{
    BatchOptions, Options, Result, Statement, TransactionBehavior,
    logger::{LogSettings, QueryLogger},
    row::BindAll,
    sqlite::ffi,
    transaction::Transaction,
};

pub(crate) use handle::ConnectionHandle;
pub use handle::InterruptHandle;
use handle::SharedInterrupt;

pub(crate) mod establish;
mod handle;

/// A connection to an open SQLite database.
///
/// All calls block the current thread. The connection can be moved to another thread but not
/// shared between threads; use an [`InterruptHandle`] to abort a running statement from
/// elsewhere.
///
/// Statements borrow the connection and are finalized before it closes.
pub struct Connection {
    pub(crate) handle: ConnectionHandle,
    pub(crate) log_settings: LogSettings,
    pub(crate) batch_options: BatchOptions,
    pub(crate) transaction_depth: Cell<usize>,
    pub(crate) interrupt: SharedInterrupt,
}

impl Debug for Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("transaction_depth", &self.transaction_depth.get())
            .field("autocommit", &self.is_autocommit())
            .field("batch_options", &self.batch_options)
            .finish()
    }
}

impl Connection {
    /// Open or create the database file at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Options::new().filename(path).create_if_missing(true).open()
    }

    /// Open a private in-memory database with default options.
    pub fn open_in_memory() -> Result<Self> {
        Options::new().in_memory(true).open()
    }

    pub(crate) fn as_ptr(&self) -> *mut sqlite3 {
        self.handle.as_ptr()
    }

    /// Compile a single SQL statement.
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        Statement::prepare(self, sql, false)
    }

    /// Compile a statement that is expected to be kept and reused many times.
    pub(crate) fn prepare_persistent(&self, sql: &str) -> Result<Statement<'_>> {
        Statement::prepare(self, sql, true)
    }

    /// Run one or more semicolon-separated statements that take no parameters.
    pub fn exec(&self, sql: &str) -> Result<()> {
        let _logger = QueryLogger::new(sql, &self.log_settings);
        self.handle.exec(sql)
    }

    /// Prepare `sql`, bind `params` to its parameters in order, and run it to completion.
    /// Returns the number of rows changed.
    pub fn execute<P>(&self, sql: &str, params: &P) -> Result<u64>
    where
        P: BindAll + ?Sized,
    {
        let mut stmt = self.prepare(sql)?;
        stmt.bind_all(params)?;
        stmt.execute()
    }

    /// Rows changed by the most recent INSERT, UPDATE or DELETE.
    pub fn changes(&self) -> u64 {
        // https://www.sqlite.org/c3ref/changes.html
        ffi::changes(self.as_ptr())
    }

    /// Rows changed since the connection was opened.
    pub fn total_changes(&self) -> u64 {
        ffi::total_changes(self.as_ptr())
    }

    pub fn last_insert_rowid(&self) -> i64 {
        ffi::last_insert_rowid(self.as_ptr())
    }

    /// `false` while a transaction is open.
    pub fn is_autocommit(&self) -> bool {
        // https://www.sqlite.org/c3ref/get_autocommit.html
        ffi::get_autocommit(self.as_ptr())
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            shared: self.interrupt.clone(),
        }
    }

    /// Begin a transaction using the connection's default behaviour, or a savepoint if one is
    /// already open.
    pub fn begin(&self) -> Result<Transaction<'_>> {
        self.begin_with(self.batch_options.transaction)
    }

    pub fn begin_with(&self, behavior: TransactionBehavior) -> Result<Transaction<'_>> {
        Transaction::begin(self, behavior)
    }

    pub fn log_settings(&self) -> &LogSettings {
        &self.log_settings
    }

    /// Settings used by [`batch_insert`](crate::batch_insert) and
    /// [`batch_upsert`](crate::batch_upsert).
    pub fn batch_options(&self) -> &BatchOptions {
        &self.batch_options
    }

    pub fn set_batch_options(&mut self, options: BatchOptions) {
        self.batch_options = options;
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.interrupt.detach();
    }
}
