// Safe wrappers around libsqlite3_sys functions used within this crate.
// These wrappers centralize the `unsafe` blocks needed when calling into
// the SQLite C API so that the rest of the codebase can remain safe.

use std::ffi::c_void;
use std::os::raw::{c_char, c_int};
use std::ptr;

use crate::sqlite::error::SqliteError;
use libsqlite3_sys::{self as ffi_sys, sqlite3, sqlite3_destructor_type, sqlite3_stmt};

// libsqlite3-sys omits `sqlite3_close_v2` from its generated bindings; the symbol is still
// provided by the linked SQLite library.
unsafe extern "C" {
    fn sqlite3_close_v2(db: *mut sqlite3) -> c_int;
}

#[allow(dead_code)]
const fn assert_c_int_is_32bit() {
    assert!(std::mem::size_of::<c_int>() == 4);
}

// A compile-time assertion to ensure that `c_int` is 32 bits.
const _ASSERT_C_INT_32BIT: () = assert_c_int_is_32bit();

/// How SQLite should treat a text or blob buffer handed to a bind call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindLifetime {
    /// The caller guarantees the buffer outlives the binding (`SQLITE_STATIC`).
    Static,
    /// SQLite takes a private copy before the bind call returns (`SQLITE_TRANSIENT`).
    Transient,
}

impl BindLifetime {
    fn destructor(self) -> sqlite3_destructor_type {
        match self {
            BindLifetime::Static => ffi_sys::SQLITE_STATIC(),
            BindLifetime::Transient => ffi_sys::SQLITE_TRANSIENT(),
        }
    }
}

#[inline]
fn check_db(rc: c_int, db: *mut sqlite3) -> Result<(), SqliteError> {
    if rc == ffi_sys::SQLITE_OK {
        Ok(())
    } else {
        Err(SqliteError::new(db))
    }
}

#[inline]
fn check_stmt(rc: c_int, stmt: *mut sqlite3_stmt) -> Result<(), SqliteError> {
    if rc == ffi_sys::SQLITE_OK {
        Ok(())
    } else {
        Err(SqliteError::new(db_handle(stmt)))
    }
}

/// Wrapper around [`sqlite3_open_v2`].
///
/// On failure any partially opened handle is closed before returning, and `*handle` may be
/// null if SQLite could not allocate the connection object.
pub(crate) fn open_v2(
    filename: *const c_char,
    handle: *mut *mut sqlite3,
    flags: i32,
    vfs: *const c_char,
) -> Result<(), SqliteError> {
    let rc = unsafe { ffi_sys::sqlite3_open_v2(filename, handle, flags as c_int, vfs) };
    if rc == ffi_sys::SQLITE_OK {
        return Ok(());
    }
    let db = unsafe { *handle };
    if db.is_null() {
        return Err(SqliteError::from_code(rc));
    }
    // The error must be captured before the handle is released.
    let err = SqliteError::new(db);
    unsafe {
        ffi_sys::sqlite3_close(db);
        *handle = ptr::null_mut();
    }
    Err(err)
}

/// Wrapper around [`sqlite3_extended_result_codes`].
pub(crate) fn extended_result_codes(db: *mut sqlite3, onoff: i32) -> Result<(), SqliteError> {
    let rc = unsafe { ffi_sys::sqlite3_extended_result_codes(db, onoff as c_int) };
    check_db(rc, db)
}

/// Wrapper around [`sqlite3_busy_timeout`].
pub(crate) fn busy_timeout(db: *mut sqlite3, ms: i32) -> Result<(), SqliteError> {
    let rc = unsafe { ffi_sys::sqlite3_busy_timeout(db, ms as c_int) };
    check_db(rc, db)
}

/// Wrapper around [`sqlite3_prepare_v3`].
pub(crate) fn prepare_v3(
    db: *mut sqlite3,
    sql: *const c_char,
    n_byte: i32,
    flags: u32,
    stmt: *mut *mut sqlite3_stmt,
    tail: *mut *const c_char,
) -> Result<(), SqliteError> {
    let rc = unsafe { ffi_sys::sqlite3_prepare_v3(db, sql, n_byte as c_int, flags, stmt, tail) };
    check_db(rc, db)
}

/// Wrapper around [`sqlite3_extended_errcode`].
pub(crate) fn extended_errcode(db: *mut sqlite3) -> i32 {
    unsafe { ffi_sys::sqlite3_extended_errcode(db) as i32 }
}

/// Wrapper around [`sqlite3_errmsg`].
pub(crate) fn errmsg(db: *mut sqlite3) -> *const c_char {
    unsafe { ffi_sys::sqlite3_errmsg(db) }
}

/// Wrapper around [`sqlite3_close_v2`]. Unfinalized statements turn the handle into a zombie
/// that is released once the last statement is finalized.
pub(crate) fn close_v2(db: *mut sqlite3) -> Result<(), SqliteError> {
    let rc = unsafe { sqlite3_close_v2(db) };
    if rc == ffi_sys::SQLITE_OK {
        Ok(())
    } else {
        Err(SqliteError::from_code(rc))
    }
}

/// Wrapper around [`sqlite3_exec`] with no callback.
pub(crate) fn exec(db: *mut sqlite3, sql: *const c_char) -> Result<(), SqliteError> {
    let rc = unsafe { ffi_sys::sqlite3_exec(db, sql, None, ptr::null_mut(), ptr::null_mut()) };
    check_db(rc, db)
}

/// Wrapper around [`sqlite3_interrupt`]. Safe to call from any thread while the handle is open.
pub(crate) fn interrupt(db: *mut sqlite3) {
    unsafe { ffi_sys::sqlite3_interrupt(db) }
}

/// Wrapper around [`sqlite3_get_autocommit`].
pub(crate) fn get_autocommit(db: *mut sqlite3) -> bool {
    unsafe { ffi_sys::sqlite3_get_autocommit(db) != 0 }
}

/// Wrapper around [`sqlite3_last_insert_rowid`].
pub(crate) fn last_insert_rowid(db: *mut sqlite3) -> i64 {
    unsafe { ffi_sys::sqlite3_last_insert_rowid(db) }
}

/// Wrapper around [`sqlite3_changes64`].
pub(crate) fn changes(db: *mut sqlite3) -> u64 {
    unsafe { ffi_sys::sqlite3_changes64(db) as u64 }
}

/// Wrapper around [`sqlite3_total_changes64`].
pub(crate) fn total_changes(db: *mut sqlite3) -> u64 {
    unsafe { ffi_sys::sqlite3_total_changes64(db) as u64 }
}

/// Wrapper around [`sqlite3_db_handle`].
pub(crate) fn db_handle(stmt: *mut sqlite3_stmt) -> *mut sqlite3 {
    unsafe { ffi_sys::sqlite3_db_handle(stmt) }
}

/// Wrapper around [`sqlite3_sql`].
pub(crate) fn sql(stmt: *mut sqlite3_stmt) -> *const c_char {
    unsafe { ffi_sys::sqlite3_sql(stmt) }
}

/// Wrapper around [`sqlite3_column_count`].
pub(crate) fn column_count(stmt: *mut sqlite3_stmt) -> i32 {
    unsafe { ffi_sys::sqlite3_column_count(stmt) as i32 }
}

/// Wrapper around [`sqlite3_column_name`]. Returns a pointer to a null terminated string.
pub(crate) fn column_name(stmt: *mut sqlite3_stmt, index: i32) -> *const c_char {
    unsafe { ffi_sys::sqlite3_column_name(stmt, index as c_int) }
}

/// Wrapper around [`sqlite3_column_decltype`].
pub(crate) fn column_decltype(stmt: *mut sqlite3_stmt, index: i32) -> *const c_char {
    unsafe { ffi_sys::sqlite3_column_decltype(stmt, index as c_int) }
}

/// Wrapper around [`sqlite3_bind_parameter_count`].
pub(crate) fn bind_parameter_count(stmt: *mut sqlite3_stmt) -> i32 {
    unsafe { ffi_sys::sqlite3_bind_parameter_count(stmt) as i32 }
}

/// Wrapper around [`sqlite3_bind_parameter_index`]. Returns 0 when no parameter matches.
pub(crate) fn bind_parameter_index(stmt: *mut sqlite3_stmt, name: *const c_char) -> i32 {
    unsafe { ffi_sys::sqlite3_bind_parameter_index(stmt, name) as i32 }
}

/// Wrapper around [`sqlite3_bind_parameter_name`].
pub(crate) fn bind_parameter_name(stmt: *mut sqlite3_stmt, index: i32) -> *const c_char {
    unsafe { ffi_sys::sqlite3_bind_parameter_name(stmt, index as c_int) }
}

/// Wrapper around [`sqlite3_bind_blob64`].
///
/// With [`BindLifetime::Static`] the caller must keep `data` alive and unmodified until the
/// parameter is rebound, cleared, or the statement is finalized.
pub(crate) fn bind_blob64(
    stmt: *mut sqlite3_stmt,
    index: i32,
    data: &[u8],
    lifetime: BindLifetime,
) -> Result<(), SqliteError> {
    let rc = unsafe {
        ffi_sys::sqlite3_bind_blob64(
            stmt,
            index as c_int,
            data.as_ptr() as *const c_void,
            data.len() as u64,
            lifetime.destructor(),
        )
    };
    check_stmt(rc, stmt)
}

/// Wrapper around [`sqlite3_bind_text64`]. The same lifetime contract as [`bind_blob64`]
/// applies.
pub(crate) fn bind_text64(
    stmt: *mut sqlite3_stmt,
    index: i32,
    data: &str,
    lifetime: BindLifetime,
) -> Result<(), SqliteError> {
    let rc = unsafe {
        ffi_sys::sqlite3_bind_text64(
            stmt,
            index as c_int,
            data.as_ptr() as *const c_char,
            data.len() as u64,
            lifetime.destructor(),
            ffi_sys::SQLITE_UTF8 as u8,
        )
    };
    check_stmt(rc, stmt)
}

/// Wrapper around [`sqlite3_bind_int`].
pub(crate) fn bind_int(stmt: *mut sqlite3_stmt, index: i32, value: i32) -> Result<(), SqliteError> {
    let rc = unsafe { ffi_sys::sqlite3_bind_int(stmt, index as c_int, value as c_int) };
    check_stmt(rc, stmt)
}

/// Wrapper around [`sqlite3_bind_int64`].
pub(crate) fn bind_int64(
    stmt: *mut sqlite3_stmt,
    index: i32,
    value: i64,
) -> Result<(), SqliteError> {
    let rc = unsafe { ffi_sys::sqlite3_bind_int64(stmt, index as c_int, value) };
    check_stmt(rc, stmt)
}

/// Wrapper around [`sqlite3_bind_double`].
pub(crate) fn bind_double(
    stmt: *mut sqlite3_stmt,
    index: i32,
    value: f64,
) -> Result<(), SqliteError> {
    let rc = unsafe { ffi_sys::sqlite3_bind_double(stmt, index as c_int, value) };
    check_stmt(rc, stmt)
}

/// Wrapper around [`sqlite3_bind_null`].
pub(crate) fn bind_null(stmt: *mut sqlite3_stmt, index: i32) -> Result<(), SqliteError> {
    let rc = unsafe { ffi_sys::sqlite3_bind_null(stmt, index as c_int) };
    check_stmt(rc, stmt)
}

/// Wrapper around [`sqlite3_column_type`].
pub(crate) fn column_type(stmt: *mut sqlite3_stmt, index: i32) -> i32 {
    unsafe { ffi_sys::sqlite3_column_type(stmt, index as c_int) as i32 }
}

/// Wrapper around [`sqlite3_column_int64`].
pub(crate) fn column_int64(stmt: *mut sqlite3_stmt, index: i32) -> i64 {
    unsafe { ffi_sys::sqlite3_column_int64(stmt, index as c_int) }
}

/// Wrapper around [`sqlite3_column_double`].
pub(crate) fn column_double(stmt: *mut sqlite3_stmt, index: i32) -> f64 {
    unsafe { ffi_sys::sqlite3_column_double(stmt, index as c_int) }
}

/// Wrapper around [`sqlite3_column_blob`].
pub(crate) fn column_blob(stmt: *mut sqlite3_stmt, index: i32) -> *const c_void {
    unsafe { ffi_sys::sqlite3_column_blob(stmt, index as c_int) }
}

/// Wrapper around [`sqlite3_column_text`].
pub(crate) fn column_text(stmt: *mut sqlite3_stmt, index: i32) -> *const u8 {
    unsafe { ffi_sys::sqlite3_column_text(stmt, index as c_int) }
}

/// Wrapper around [`sqlite3_column_bytes`].
pub(crate) fn column_bytes(stmt: *mut sqlite3_stmt, index: i32) -> i32 {
    unsafe { ffi_sys::sqlite3_column_bytes(stmt, index as c_int) as i32 }
}

/// Wrapper around [`sqlite3_clear_bindings`].
pub(crate) fn clear_bindings(stmt: *mut sqlite3_stmt) {
    unsafe { ffi_sys::sqlite3_clear_bindings(stmt) };
}

/// Wrapper around [`sqlite3_reset`].
pub(crate) fn reset(stmt: *mut sqlite3_stmt) -> Result<(), SqliteError> {
    let rc = unsafe { ffi_sys::sqlite3_reset(stmt) };
    check_stmt(rc, stmt)
}

/// Wrapper around [`sqlite3_step`]. Returns `true` when a row is available and `false` once
/// the statement has run to completion.
pub(crate) fn step(stmt: *mut sqlite3_stmt) -> Result<bool, SqliteError> {
    match unsafe { ffi_sys::sqlite3_step(stmt) } {
        ffi_sys::SQLITE_ROW => Ok(true),
        ffi_sys::SQLITE_DONE => Ok(false),
        _ => Err(SqliteError::new(db_handle(stmt))),
    }
}

/// Wrapper around [`sqlite3_finalize`]. Returns the raw result code so that callers can
/// distinguish API misuse from errors left over by the last step.
pub(crate) fn finalize(stmt: *mut sqlite3_stmt) -> i32 {
    unsafe { ffi_sys::sqlite3_finalize(stmt) as i32 }
}
