use std::ffi::CStr;

use libsqlite3_sys::{self as ffi_sys, sqlite3};

use crate::sqlite::ffi;

// Error Codes And Messages
// https://www.sqlite.org/c3ref/errcode.html

/// Primary Sqlite error codes.
///
/// **Note:** This enum is marked `#[non_exhaustive]`; avoid exhaustive
/// matches as new variants may be introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PrimaryErrCode {
    Error,
    Internal,
    Perm,
    Abort,
    Busy,
    Locked,
    NoMem,
    ReadOnly,
    Interrupt,
    IoErr,
    Corrupt,
    NotFound,
    Full,
    CantOpen,
    Protocol,
    Empty,
    Schema,
    TooBig,
    Constraint,
    Mismatch,
    Misuse,
    NoLfs,
    Auth,
    Format,
    Range,
    NotADB,
    Notice,
    Warning,
    Unknown(u32),
}

impl PrimaryErrCode {
    pub(crate) fn from_code(code: i32) -> PrimaryErrCode {
        match code & 255 {
            ffi_sys::SQLITE_ERROR => PrimaryErrCode::Error,
            ffi_sys::SQLITE_INTERNAL => PrimaryErrCode::Internal,
            ffi_sys::SQLITE_PERM => PrimaryErrCode::Perm,
            ffi_sys::SQLITE_ABORT => PrimaryErrCode::Abort,
            ffi_sys::SQLITE_BUSY => PrimaryErrCode::Busy,
            ffi_sys::SQLITE_LOCKED => PrimaryErrCode::Locked,
            ffi_sys::SQLITE_NOMEM => PrimaryErrCode::NoMem,
            ffi_sys::SQLITE_READONLY => PrimaryErrCode::ReadOnly,
            ffi_sys::SQLITE_INTERRUPT => PrimaryErrCode::Interrupt,
            ffi_sys::SQLITE_IOERR => PrimaryErrCode::IoErr,
            ffi_sys::SQLITE_CORRUPT => PrimaryErrCode::Corrupt,
            ffi_sys::SQLITE_NOTFOUND => PrimaryErrCode::NotFound,
            ffi_sys::SQLITE_FULL => PrimaryErrCode::Full,
            ffi_sys::SQLITE_CANTOPEN => PrimaryErrCode::CantOpen,
            ffi_sys::SQLITE_PROTOCOL => PrimaryErrCode::Protocol,
            ffi_sys::SQLITE_EMPTY => PrimaryErrCode::Empty,
            ffi_sys::SQLITE_SCHEMA => PrimaryErrCode::Schema,
            ffi_sys::SQLITE_TOOBIG => PrimaryErrCode::TooBig,
            ffi_sys::SQLITE_CONSTRAINT => PrimaryErrCode::Constraint,
            ffi_sys::SQLITE_MISMATCH => PrimaryErrCode::Mismatch,
            ffi_sys::SQLITE_MISUSE => PrimaryErrCode::Misuse,
            ffi_sys::SQLITE_NOLFS => PrimaryErrCode::NoLfs,
            ffi_sys::SQLITE_AUTH => PrimaryErrCode::Auth,
            ffi_sys::SQLITE_FORMAT => PrimaryErrCode::Format,
            ffi_sys::SQLITE_RANGE => PrimaryErrCode::Range,
            ffi_sys::SQLITE_NOTADB => PrimaryErrCode::NotADB,
            ffi_sys::SQLITE_NOTICE => PrimaryErrCode::Notice,
            ffi_sys::SQLITE_WARNING => PrimaryErrCode::Warning,
            _ => PrimaryErrCode::Unknown(code as u32),
        }
    }
}

/// The subset of extended result codes the write path reacts to. Everything else is kept as
/// the raw code in [`ExtendedErrCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtendedErrCode {
    BusyRecovery,
    BusySnapshot,
    BusyTimeout,
    LockedSharedCache,
    ConstraintCheck,
    ConstraintForeignKey,
    ConstraintNotNull,
    ConstraintPrimaryKey,
    ConstraintUnique,
    ConstraintDataType,
    ReadOnlyDbMoved,
    Other(i32),
}

impl ExtendedErrCode {
    pub(crate) fn from_code(code: i32) -> ExtendedErrCode {
        match code {
            ffi_sys::SQLITE_BUSY_RECOVERY => ExtendedErrCode::BusyRecovery,
            ffi_sys::SQLITE_BUSY_SNAPSHOT => ExtendedErrCode::BusySnapshot,
            ffi_sys::SQLITE_BUSY_TIMEOUT => ExtendedErrCode::BusyTimeout,
            ffi_sys::SQLITE_LOCKED_SHAREDCACHE => ExtendedErrCode::LockedSharedCache,
            ffi_sys::SQLITE_CONSTRAINT_CHECK => ExtendedErrCode::ConstraintCheck,
            ffi_sys::SQLITE_CONSTRAINT_FOREIGNKEY => ExtendedErrCode::ConstraintForeignKey,
            ffi_sys::SQLITE_CONSTRAINT_NOTNULL => ExtendedErrCode::ConstraintNotNull,
            ffi_sys::SQLITE_CONSTRAINT_PRIMARYKEY => ExtendedErrCode::ConstraintPrimaryKey,
            ffi_sys::SQLITE_CONSTRAINT_UNIQUE => ExtendedErrCode::ConstraintUnique,
            ffi_sys::SQLITE_CONSTRAINT_DATATYPE => ExtendedErrCode::ConstraintDataType,
            ffi_sys::SQLITE_READONLY_DBMOVED => ExtendedErrCode::ReadOnlyDbMoved,
            _ => ExtendedErrCode::Other(code),
        }
    }

    fn is_busy(&self) -> bool {
        matches!(
            self,
            ExtendedErrCode::BusyRecovery
                | ExtendedErrCode::BusySnapshot
                | ExtendedErrCode::BusyTimeout
        )
    }
}

/// An error returned from Sqlite. The native code and message are kept verbatim.
#[derive(Debug, Clone, thiserror::Error)]
#[error("(code: {code}, {:?}) {message}", .extended)]
pub struct SqliteError {
    pub primary: PrimaryErrCode,
    pub extended: ExtendedErrCode,
    /// The raw extended result code.
    pub code: i32,
    pub message: String,
}

impl SqliteError {
    /// Capture the most recent error recorded on `handle`.
    pub(crate) fn new(handle: *mut sqlite3) -> Self {
        let code = ffi::extended_errcode(handle);
        let message = unsafe {
            let msg = ffi::errmsg(handle);
            debug_assert!(!msg.is_null());
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        };
        Self::from_parts(code, message)
    }

    /// Build an error for a result code that was not recorded on a connection, e.g. a failed
    /// open where no handle could be allocated.
    pub(crate) fn from_code(code: i32) -> Self {
        let message = unsafe {
            let msg = ffi_sys::sqlite3_errstr(code);
            if msg.is_null() {
                String::from("unknown error")
            } else {
                CStr::from_ptr(msg).to_string_lossy().into_owned()
            }
        };
        Self::from_parts(code, message)
    }

    fn from_parts(code: i32, message: String) -> Self {
        Self {
            primary: PrimaryErrCode::from_code(code),
            extended: ExtendedErrCode::from_code(code),
            code,
            message,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.primary == PrimaryErrCode::Busy || self.extended.is_busy()
    }

    pub fn is_locked(&self) -> bool {
        self.primary == PrimaryErrCode::Locked
    }

    pub fn is_interrupt(&self) -> bool {
        self.primary == PrimaryErrCode::Interrupt
    }

    pub fn is_constraint(&self) -> bool {
        self.primary == PrimaryErrCode::Constraint
    }
}
