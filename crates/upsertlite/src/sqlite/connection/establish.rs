use std::{
    cell::Cell,
    ffi::CString,
    io,
    ptr::{null, null_mut},
};

use libsqlite3_sys::{
    SQLITE_OPEN_CREATE, SQLITE_OPEN_MEMORY, SQLITE_OPEN_NOMUTEX, SQLITE_OPEN_READONLY,
    SQLITE_OPEN_READWRITE,
};

use crate::{
    Error, Options,
    sqlite::{
        Connection, ffi,
        connection::handle::{ConnectionHandle, SharedInterrupt},
    },
};

/// Open flags and file name resolved from [`Options`].
pub(crate) struct EstablishParams {
    filename: CString,
    open_flags: i32,
}

impl EstablishParams {
    pub(crate) fn from_options(options: &Options) -> Result<Self, Error> {
        let filename = options
            .filename
            .to_str()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    "filename passed to SQLite must be valid UTF-8",
                )
            })?
            .to_owned();

        // [SQLITE_OPEN_NOMUTEX] will instruct [sqlite3_open_v2] to return an error if it
        // cannot satisfy our wish for a thread-safe, lock-free connection object
        let mut flags = SQLITE_OPEN_NOMUTEX;

        flags |= if options.read_only {
            SQLITE_OPEN_READONLY
        } else if options.create_if_missing {
            SQLITE_OPEN_CREATE | SQLITE_OPEN_READWRITE
        } else {
            SQLITE_OPEN_READWRITE
        };

        if options.in_memory {
            flags |= SQLITE_OPEN_MEMORY;
        }

        let filename = CString::new(filename).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "filename passed to SQLite must not contain nul bytes",
            )
        })?;

        Ok(Self {
            filename,
            open_flags: flags,
        })
    }

    /// Establish a new SQLite connection and apply the configured pragmas.
    ///
    /// The busy timeout is converted to milliseconds for [`sqlite3_busy_timeout`] and clamped to
    /// `i32::MAX`.
    pub(crate) fn establish(&self, options: &Options) -> Result<Connection, Error> {
        let mut handle = null_mut();

        // <https://www.sqlite.org/c3ref/open.html>
        ffi::open_v2(self.filename.as_ptr(), &mut handle, self.open_flags, null())?;

        if handle.is_null() {
            // Failed to allocate memory
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::OutOfMemory,
                "SQLite is unable to allocate memory to hold the sqlite3 object",
            )));
        }

        // SAFE: tested for NULL just above and open_v2 succeeded
        let handle = unsafe { ConnectionHandle::new(handle) };

        // https://www.sqlite.org/c3ref/extended_result_codes.html
        ffi::extended_result_codes(handle.as_ptr(), 1)?;

        // This causes SQLite to automatically sleep in increasing intervals until the time
        // when there is something locked during [sqlite3_step].
        let ms = i32::try_from(options.busy_timeout.as_millis()).unwrap_or(i32::MAX);
        ffi::busy_timeout(handle.as_ptr(), ms)?;

        let pragmas = options.pragma_string();
        if !pragmas.is_empty() {
            handle.exec(&pragmas)?;
        }

        let interrupt = SharedInterrupt::new(&handle);
        Ok(Connection {
            handle,
            log_settings: options.log_settings.clone(),
            batch_options: options.batch_options.clone(),
            transaction_depth: Cell::new(0),
            interrupt,
        })
    }
}
