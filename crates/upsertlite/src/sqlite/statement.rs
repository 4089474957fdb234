use std::{
    ffi::{CStr, CString},
    fmt::{self, Debug, Formatter},
    os::raw::c_char,
    ptr::{self, NonNull},
    time::Instant,
};

use libsqlite3_sys::{SQLITE_MISUSE, SQLITE_OK, SQLITE_PREPARE_PERSISTENT, sqlite3_stmt};

use crate::{
    Connection, Error, Result, StorageClass, StorageValue,
    decode::Decode,
    encode::Encode,
    logger::QueryLogger,
    row::{BindAll, FromRow},
    slot::{AutoBinder, AutoGetter, ColumnSlot, ParamSlot},
    sqlite::{
        SqliteError,
        ffi::{self, BindLifetime},
    },
};

/// A compiled SQL statement bound to the connection that prepared it.
///
/// Text and blob values bound with [`bind`](Self::bind) are borrowed for the lifetime `'c` and
/// handed to SQLite without a copy. Values that only live for the duration of the call go
/// through [`bind_copy`](Self::bind_copy), which makes SQLite take a private copy.
///
/// The statement is reset and finalized when dropped.
pub struct Statement<'c> {
    handle: NonNull<sqlite3_stmt>,
    conn: &'c Connection,
}

impl<'c> Statement<'c> {
    pub(crate) fn prepare(conn: &'c Connection, sql: &str, persistent: bool) -> Result<Self> {
        let len = i32::try_from(sql.len())
            .map_err(|_| Error::Protocol("statement is too long".into()))?;
        let flags = if persistent {
            SQLITE_PREPARE_PERSISTENT
        } else {
            0
        };

        let mut handle: *mut sqlite3_stmt = ptr::null_mut();
        let mut tail: *const c_char = ptr::null();

        // <https://www.sqlite.org/c3ref/prepare.html>
        ffi::prepare_v3(
            conn.as_ptr(),
            sql.as_ptr() as *const c_char,
            len,
            flags as u32,
            &mut handle,
            &mut tail,
        )?;

        let Some(handle) = NonNull::new(handle) else {
            // The input was empty or only contained whitespace or comments.
            return Err(Error::Protocol("statement contains no SQL".into()));
        };
        let statement = Statement { handle, conn };

        let consumed = if tail.is_null() {
            sql.len()
        } else {
            tail as usize - sql.as_ptr() as usize
        };
        let rest = sql.get(consumed..).unwrap_or_default();
        if !rest.trim_matches(|c: char| c.is_whitespace() || c == ';').is_empty() {
            return Err(Error::Protocol(format!(
                "expected a single statement, found trailing SQL: {}",
                rest.trim()
            )));
        }

        Ok(statement)
    }

    pub(crate) fn as_ptr(&self) -> *mut sqlite3_stmt {
        self.handle.as_ptr()
    }

    /// The connection this statement was prepared on.
    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// The SQL text used to prepare the statement.
    pub fn sql(&self) -> &str {
        unsafe {
            let sql = ffi::sql(self.as_ptr());
            debug_assert!(!sql.is_null());
            std::str::from_utf8_unchecked(CStr::from_ptr(sql).to_bytes())
        }
    }

    // Number Of SQL Parameters
    // https://www.sqlite.org/c3ref/bind_parameter_count.html

    pub fn bind_parameter_count(&self) -> usize {
        ffi::bind_parameter_count(self.as_ptr()) as usize
    }

    /// The 1-based index of a named parameter such as `:name`, `@name` or `$name`. The prefix
    /// is part of the name.
    pub fn bind_parameter_index(&self, name: &str) -> Option<usize> {
        let name = CString::new(name).ok()?;
        match ffi::bind_parameter_index(self.as_ptr(), name.as_ptr()) {
            0 => None,
            index => Some(index as usize),
        }
    }

    // NOTE: The first host parameter has an index of 1, not 0.
    pub fn bind_parameter_name(&self, index: usize) -> Option<&str> {
        unsafe {
            let name = ffi::bind_parameter_name(self.as_ptr(), index as i32);
            if name.is_null() {
                return None;
            }
            Some(std::str::from_utf8_unchecked(CStr::from_ptr(name).to_bytes()))
        }
    }

    /// Bind `value` to the 1-based parameter `index` without copying text or blob data.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or greater than [`bind_parameter_count`](Self::bind_parameter_count).
    pub fn bind<T>(&mut self, index: usize, value: &'c T) -> Result<()>
    where
        T: Encode + ?Sized,
    {
        self.bind_with(index, value, false)
    }

    /// Bind `value`, asking SQLite to take a private copy of text and blob data when
    /// `force_copy` is set.
    pub fn bind_with<T>(&mut self, index: usize, value: &'c T, force_copy: bool) -> Result<()>
    where
        T: Encode + ?Sized,
    {
        let encoded = value.encode()?;
        ParamSlot::new(self, index).put(encoded, force_copy)
    }

    /// Bind a value that does not outlive this call. SQLite always copies text and blob data.
    pub fn bind_copy<T>(&mut self, index: usize, value: &T) -> Result<()>
    where
        T: Encode + ?Sized,
    {
        let encoded = value.encode()?;
        ParamSlot::new(self, index).put_copied(&encoded)
    }

    /// Bind an already projected value.
    pub fn bind_value(&mut self, index: usize, value: StorageValue<'c>) -> Result<()> {
        ParamSlot::new(self, index).put(value, false)
    }

    /// Bind `value` to the parameter called `name`, prefix included.
    pub fn bind_named<T>(&mut self, name: &str, value: &'c T) -> Result<()>
    where
        T: Encode + ?Sized,
    {
        let index = self
            .bind_parameter_index(name)
            .ok_or_else(|| Error::NoSuchParameter(name.to_string()))?;
        self.bind(index, value)
    }

    /// Bind every element of a tuple to consecutive parameters starting at 1. Values are copied.
    pub fn bind_all<B>(&mut self, values: &B) -> Result<()>
    where
        B: BindAll + ?Sized,
    {
        values.bind_all(&mut AutoBinder::new(self))
    }

    /// An adapter that binds successive parameters starting at 1.
    pub fn binder(&mut self) -> AutoBinder<'_, 'c> {
        AutoBinder::new(self)
    }

    /// Bind one parameter.
    ///
    /// # Safety
    ///
    /// With [`BindLifetime::Static`], text and blob data in `value` must stay alive and unchanged
    /// until the parameter is rebound, cleared, or the statement is finalized.
    pub(crate) unsafe fn bind_raw(
        &mut self,
        index: usize,
        value: &StorageValue<'_>,
        lifetime: BindLifetime,
    ) -> Result<()> {
        let stmt = self.as_ptr();
        let index = index as i32;
        match value {
            StorageValue::Null => ffi::bind_null(stmt, index)?,
            StorageValue::Int(v) => ffi::bind_int(stmt, index, *v)?,
            StorageValue::Int64(v) => ffi::bind_int64(stmt, index, *v)?,
            StorageValue::Double(v) => ffi::bind_double(stmt, index, *v)?,
            StorageValue::Text(v) => ffi::bind_text64(stmt, index, v, lifetime)?,
            StorageValue::Blob(v) => ffi::bind_blob64(stmt, index, v, lifetime)?,
        }
        Ok(())
    }

    /// Step once. Returns `true` while rows are produced and `false` once the statement is
    /// done.
    pub fn step(&mut self) -> Result<bool> {
        Ok(ffi::step(self.as_ptr())?)
    }

    /// Rewind the statement so it can be executed again. Bindings are kept.
    pub fn reset(&mut self) -> Result<()> {
        Ok(ffi::reset(self.as_ptr())?)
    }

    /// Set every parameter back to NULL.
    pub fn clear_bindings(&mut self) {
        ffi::clear_bindings(self.as_ptr());
    }

    /// Run the statement to completion and return the number of rows it changed.
    ///
    /// The statement is left in the done state; call [`reset`](Self::reset) before executing it
    /// again with new bindings.
    pub fn execute(&mut self) -> Result<u64> {
        let stmt = self.as_ptr();
        let conn = self.conn;
        let mut logger = QueryLogger::new(self.sql(), conn.log_settings());
        while ffi::step(stmt)? {
            logger.increment_rows_returned();
        }
        let changes = conn.changes();
        logger.increase_rows_affected(changes);
        Ok(changes)
    }

    pub fn column_count(&self) -> usize {
        // https://sqlite.org/c3ref/column_count.html
        ffi::column_count(self.as_ptr()) as usize
    }

    pub fn column_name(&self, index: usize) -> Result<&str> {
        self.check_column(index)?;
        unsafe {
            let name = ffi::column_name(self.as_ptr(), index as i32);
            debug_assert!(!name.is_null());
            Ok(std::str::from_utf8_unchecked(CStr::from_ptr(name).to_bytes()))
        }
    }

    /// The declared type of a result column, when it is a direct table column reference.
    pub fn column_decltype(&self, index: usize) -> Result<Option<&str>> {
        self.check_column(index)?;
        unsafe {
            let decl = ffi::column_decltype(self.as_ptr(), index as i32);
            if decl.is_null() {
                return Ok(None);
            }
            Ok(Some(std::str::from_utf8_unchecked(
                CStr::from_ptr(decl).to_bytes(),
            )))
        }
    }

    /// The index of the first result column called `name`, compared case-insensitively.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        (0..self.column_count())
            .find(|&i| {
                self.column_name(i)
                    .is_ok_and(|c| c.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub(crate) fn check_column(&self, index: usize) -> Result<()> {
        let len = self.column_count();
        if index >= len {
            return Err(Error::ColumnIndexOutOfBounds { index, len });
        }
        Ok(())
    }

    /// Access the 0-based result column `index` of the current row.
    pub fn column(&self, index: usize) -> Result<ColumnSlot<'_>> {
        ColumnSlot::new(self, index)
    }

    /// The storage class of column `index` in the current row.
    pub fn column_type(&self, index: usize) -> Result<StorageClass> {
        Ok(self.column(index)?.storage_class())
    }

    /// Decode the 0-based result column `index` of the current row.
    pub fn get<'r, T>(&'r self, index: usize) -> Result<T>
    where
        T: Decode<'r>,
    {
        let value = self.column(index)?.value()?;
        T::decode(value).map_err(|source| Error::ColumnDecode {
            index: format!("{index:?}"),
            source,
        })
    }

    /// Decode the result column called `name`.
    pub fn get_named<'r, T>(&'r self, name: &str) -> Result<T>
    where
        T: Decode<'r>,
    {
        let index = self.column_index(name)?;
        let value = self.column(index)?.value()?;
        T::decode(value).map_err(|source| Error::ColumnDecode {
            index: format!("{name:?}"),
            source,
        })
    }

    /// An adapter that reads successive columns of the current row starting at 0.
    pub fn getter(&self) -> AutoGetter<'_> {
        AutoGetter::new(self)
    }

    /// Iterate over the rows produced by the statement, mapping each through `f`.
    ///
    /// Borrowed column data is only valid inside `f`.
    pub fn query_map<F, T>(&mut self, f: F) -> MappedRows<'_, 'c, F>
    where
        F: FnMut(&Statement<'c>) -> Result<T>,
    {
        MappedRows {
            stmt: self,
            f,
            done: false,
            rows: 0,
            start: Instant::now(),
        }
    }

    /// Iterate over the rows produced by the statement, decoding each through [`FromRow`].
    pub fn rows<T>(&mut self) -> MappedRows<'_, 'c, fn(&Statement<'c>) -> Result<T>>
    where
        T: for<'r> FromRow<'r>,
    {
        fn from_row<'c, T: for<'r> FromRow<'r>>(stmt: &Statement<'c>) -> Result<T> {
            T::from_row(stmt)
        }
        self.query_map(from_row::<T> as fn(&Statement<'c>) -> Result<T>)
    }

    /// Collect every row.
    pub fn fetch_all<T>(&mut self) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r>,
    {
        self.rows().collect()
    }

    /// The first row, or `None` if the statement produced no rows.
    pub fn fetch_optional<T>(&mut self) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r>,
    {
        self.rows().next().transpose()
    }

    /// The first row, or [`Error::RowNotFound`].
    pub fn fetch_one<T>(&mut self) -> Result<T>
    where
        T: for<'r> FromRow<'r>,
    {
        self.fetch_optional()?.ok_or(Error::RowNotFound)
    }
}

impl Debug for Statement<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql())
            .field("parameters", &self.bind_parameter_count())
            .field("columns", &self.column_count())
            .finish()
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        let stmt = self.as_ptr();
        let db = ffi::db_handle(stmt);

        // Ensure the statement is reset before finalizing so that sqlite3_finalize does not
        // report a stale error from the last step.
        if ffi::reset(stmt).is_err() {
            tracing::debug!(
                "sqlite3_reset before finalize reported: {}",
                SqliteError::new(db)
            );
        }

        // https://sqlite.org/c3ref/finalize.html
        let status = ffi::finalize(stmt);
        if status == SQLITE_MISUSE {
            // sqlite3_finalize reports misuse on a double free, which means handle tracking is
            // broken.
            panic!("Detected sqlite3_finalize misuse.");
        } else if status != SQLITE_OK {
            tracing::error!("sqlite3_finalize failed: {}", SqliteError::from_code(status));
        }
    }
}

/// Iterator returned by [`Statement::query_map`] and [`Statement::rows`].
///
/// Stops after the first error. The statement is reset when the iterator is dropped.
pub struct MappedRows<'s, 'c, F> {
    stmt: &'s mut Statement<'c>,
    f: F,
    done: bool,
    rows: u64,
    start: Instant,
}

impl<'c, F, T> Iterator for MappedRows<'_, 'c, F>
where
    F: FnMut(&Statement<'c>) -> Result<T>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.stmt.step() {
            Ok(true) => {
                self.rows += 1;
                let item = (self.f)(&*self.stmt);
                if item.is_err() {
                    self.done = true;
                }
                Some(item)
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<F> Drop for MappedRows<'_, '_, F> {
    fn drop(&mut self) {
        let conn = self.stmt.conn;
        let mut logger =
            QueryLogger::started_at(self.stmt.sql(), conn.log_settings(), self.start);
        logger.add_rows_returned(self.rows);
        drop(logger);
        // Errors from the last step are reported by that step already.
        let _ = self.stmt.reset();
    }
}
