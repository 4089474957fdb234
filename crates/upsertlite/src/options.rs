use std::{
    fmt::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use indexmap::IndexMap;
use log::LevelFilter;

use crate::{Result, logger::LogSettings, sqlite::Connection};

use crate::sqlite::connection::establish::EstablishParams;

enum_mode! {
    /// Refer to [SQLite documentation] for the meaning of the database journaling mode.
    ///
    /// [SQLite documentation]: https://www.sqlite.org/pragma.html#pragma_journal_mode
    pub JournalMode {
        Delete => "DELETE",
        Truncate => "TRUNCATE",
        Persist => "PERSIST",
        Memory => "MEMORY",
        Wal => "WAL",
        Off => "OFF",
    }
    default Wal
}

enum_mode! {
    /// Refer to [SQLite documentation] for the meaning of various synchronous settings.
    ///
    /// [SQLite documentation]: https://www.sqlite.org/pragma.html#pragma_synchronous
    pub Synchronous {
        Off => "OFF",
        Normal => "NORMAL",
        Full => "FULL",
        Extra => "EXTRA",
    }
    default Full
}

enum_mode! {
    /// How the outermost transaction acquires its locks.
    ///
    /// See [BEGIN TRANSACTION](https://www.sqlite.org/lang_transaction.html).
    pub TransactionBehavior {
        /// Locks are taken when the database is first read or written.
        Deferred => "DEFERRED",
        /// A write lock is taken immediately.
        Immediate => "IMMEDIATE",
        /// Like `Immediate`, and also prevents other connections from reading in
        /// non-WAL journal modes.
        Exclusive => "EXCLUSIVE",
    }
    default Deferred
}

/// Default number of UPDATE statements kept by the batch upsert cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 500;

/// How a record's field names are turned into a statement cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    /// Field order is significant. Records naming the same fields in a different order get
    /// separate statements, and no sort is done per record.
    #[default]
    Preserve,
    /// Field names are sorted before lookup, so permutations share one statement.
    Canonical,
}

/// Settings for [`batch_insert`](crate::batch_insert) and [`batch_upsert`](crate::batch_upsert).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct BatchOptions {
    /// Maximum number of UPDATE statements kept for distinct field sets.
    pub cache_capacity: usize,
    pub field_order: FieldOrder,
    /// Behavior of the transaction wrapping each batch.
    pub transaction: TransactionBehavior,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            field_order: FieldOrder::default(),
            transaction: TransactionBehavior::default(),
        }
    }
}

impl BatchOptions {
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn field_order(mut self, order: FieldOrder) -> Self {
        self.field_order = order;
        self
    }

    #[must_use]
    pub fn transaction(mut self, behavior: TransactionBehavior) -> Self {
        self.transaction = behavior;
        self
    }
}

/// Options for opening a [`Connection`].
///
/// ```no_run
/// use std::time::Duration;
/// use upsertlite::{JournalMode, Options};
///
/// # fn main() -> upsertlite::Result<()> {
/// let conn = Options::new()
///     .filename("app.db")
///     .create_if_missing(true)
///     .journal_mode(JournalMode::Wal)
///     .busy_timeout(Duration::from_secs(2))
///     .open()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Options {
    pub(crate) filename: PathBuf,
    pub(crate) in_memory: bool,
    pub(crate) read_only: bool,
    pub(crate) create_if_missing: bool,
    pub(crate) busy_timeout: Duration,
    pub(crate) log_settings: LogSettings,
    pub(crate) pragmas: IndexMap<String, Option<String>>,
    pub(crate) batch_options: BatchOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl Options {
    /// Construct `Self` with default options.
    ///
    /// See the source of this method for the current defaults.
    #[must_use]
    pub fn new() -> Self {
        let mut pragmas: IndexMap<String, Option<String>> = IndexMap::new();

        // Inserting the keys up front fixes the order pragmas are sent in, even if they are
        // overwritten later by their setters or by `pragma()`.
        // https://www.sqlite.org/pragma.html

        // Don't set `journal_mode` unless the user requested it. WAL mode is a permanent
        // setting for created databases.
        pragmas.insert("journal_mode".into(), None);

        // SQLite leaves foreign key enforcement off for backward compatibility; turn it on.
        // https://www.sqlite.org/foreignkeys.html#fk_enable
        pragmas.insert("foreign_keys".into(), Some("ON".into()));

        pragmas.insert("synchronous".into(), None);

        Self {
            filename: ":memory:".into(),
            in_memory: false,
            read_only: false,
            create_if_missing: false,
            busy_timeout: Duration::from_secs(5),
            log_settings: Default::default(),
            pragmas,
            batch_options: BatchOptions::default(),
        }
    }

    /// Sets the name of the database file.
    #[must_use]
    pub fn filename(mut self, filename: impl AsRef<Path>) -> Self {
        self.filename = filename.as_ref().to_owned();
        self
    }

    /// Open a private in-memory database instead of a file.
    #[must_use]
    pub fn in_memory(mut self, in_memory: bool) -> Self {
        self.in_memory = in_memory;
        if in_memory {
            self.filename = ":memory:".into();
        }
        self
    }

    /// Set the enforcement of [foreign key constraints](https://www.sqlite.org/pragma.html#pragma_foreign_keys).
    ///
    /// Enabled by default.
    #[must_use]
    pub fn foreign_keys(self, on: bool) -> Self {
        self.pragma("foreign_keys", if on { "ON" } else { "OFF" })
    }

    /// Sets the [journal mode](https://www.sqlite.org/pragma.html#pragma_journal_mode) for the
    /// database connection.
    ///
    /// No journal mode is set by default, to avoid unintentionally changing a database into or
    /// out of WAL mode.
    #[must_use]
    pub fn journal_mode(self, mode: JournalMode) -> Self {
        self.pragma("journal_mode", mode.as_str())
    }

    /// Open the database for read-only access.
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Create the database file if it does not exist.
    ///
    /// By default, a new file **will not be created** if one is not found.
    #[must_use]
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Sets a timeout value to wait when the database is locked, before returning a busy
    /// error.
    ///
    /// The default busy timeout is 5 seconds.
    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets the [synchronous](https://www.sqlite.org/pragma.html#pragma_synchronous) setting
    /// for the database connection.
    #[must_use]
    pub fn synchronous(self, synchronous: Synchronous) -> Self {
        self.pragma("synchronous", synchronous.as_str())
    }

    /// Sets custom initial pragma for the database connection.
    #[must_use]
    pub fn pragma(mut self, key: &str, value: &str) -> Self {
        self.pragmas.insert(key.into(), Some(value.into()));
        self
    }

    #[must_use]
    pub fn log_statements(mut self, level: LevelFilter) -> Self {
        self.log_settings.log_statements(level);
        self
    }

    #[must_use]
    pub fn log_slow_statements(mut self, level: LevelFilter, duration: Duration) -> Self {
        self.log_settings.log_slow_statements(level, duration);
        self
    }

    #[must_use]
    pub fn log_settings(mut self, settings: LogSettings) -> Self {
        self.log_settings = settings;
        self
    }

    /// Settings for the batch engine on connections opened with these options.
    #[must_use]
    pub fn batch(mut self, options: BatchOptions) -> Self {
        self.batch_options = options;
        self
    }

    /// Capacity of the batch upsert statement cache. Defaults to 500.
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.batch_options.cache_capacity = capacity;
        self
    }

    /// Collect all `PRAGMA` commands into a single string
    pub(crate) fn pragma_string(&self) -> String {
        let mut string = String::new();
        for (key, opt_value) in &self.pragmas {
            if let Some(value) = opt_value {
                write!(string, "PRAGMA {key} = {value}; ").ok();
            }
        }
        string
    }

    /// Open a connection.
    pub fn open(&self) -> Result<Connection> {
        EstablishParams::from_options(self)?.establish(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pragmas_keep_declaration_order() {
        let options = Options::new()
            .synchronous(Synchronous::Normal)
            .journal_mode(JournalMode::Memory)
            .pragma("cache_size", "-2000");
        assert_eq!(
            options.pragma_string(),
            "PRAGMA journal_mode = MEMORY; PRAGMA foreign_keys = ON; \
             PRAGMA synchronous = NORMAL; PRAGMA cache_size = -2000; "
        );
    }

    #[test]
    fn modes_render_keywords() {
        assert_eq!(TransactionBehavior::default().as_str(), "DEFERRED");
        assert_eq!(TransactionBehavior::Immediate.to_string(), "IMMEDIATE");
        assert_eq!(JournalMode::default(), JournalMode::Wal);
    }

    #[test]
    fn batch_defaults() {
        let options = BatchOptions::default();
        assert_eq!(options.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(options.field_order, FieldOrder::Preserve);
        let options = Options::new().cache_capacity(2);
        assert_eq!(options.batch_options.cache_capacity, 2);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = Options::new().in_memory(true).open().unwrap();
        let (on,): (bool,) = conn.prepare("PRAGMA foreign_keys").unwrap().fetch_one().unwrap();
        assert!(on);
    }

    #[test]
    fn missing_file_is_not_created_by_default() {
        let dir = tempdir::TempDir::new("upsertlite-options").unwrap();
        let path = dir.path().join("missing.db");
        let err = Options::new().filename(&path).open().unwrap_err();
        assert!(err.as_sqlite_error().is_some());
        assert!(!path.exists());
    }
}
