use std::{
    ffi::CString,
    ptr::{self, NonNull},
    sync::{Arc, Mutex, PoisonError},
};

use libsqlite3_sys::sqlite3;

use crate::{Error, sqlite::ffi};

/// Managed handle to the raw SQLite3 database handle. The database is closed when this is
/// dropped.
#[derive(Debug)]
pub(crate) struct ConnectionHandle(NonNull<sqlite3>);

// A SQLite3 handle is safe to send between threads, provided not more than one is accessing it
// at the same time. Connections are opened with SQLITE_OPEN_NOMUTEX and `Connection` is not
// `Sync`, so only one thread ever touches the handle.

// <https://www.sqlite.org/c3ref/threadsafe.html>

unsafe impl Send for ConnectionHandle {}

impl ConnectionHandle {
    /// # Safety
    ///
    /// `ptr` must be a non-null handle returned by a successful `sqlite3_open_v2`.
    pub(super) unsafe fn new(ptr: *mut sqlite3) -> Self {
        Self(unsafe { NonNull::new_unchecked(ptr) })
    }

    pub(crate) fn as_ptr(&self) -> *mut sqlite3 {
        self.0.as_ptr()
    }

    pub(crate) fn exec(&self, query: &str) -> Result<(), Error> {
        let query =
            CString::new(query).map_err(|_| Error::Protocol("query contains nul bytes".into()))?;
        ffi::exec(self.as_ptr(), query.as_ptr())?;
        Ok(())
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        // https://sqlite.org/c3ref/close.html
        if let Err(e) = ffi::close_v2(self.0.as_ptr()) {
            tracing::error!("sqlite3_close_v2 failed: {e}");
        }
    }
}

/// The database pointer shared with [`InterruptHandle`]s. Nulled before the connection closes.
struct InterruptTarget(*mut sqlite3);

// Only `sqlite3_interrupt` is ever called through the pointer, which SQLite allows from any
// thread while the connection is open.
unsafe impl Send for InterruptTarget {}

#[derive(Clone)]
pub(crate) struct SharedInterrupt(Arc<Mutex<InterruptTarget>>);

impl SharedInterrupt {
    pub(crate) fn new(handle: &ConnectionHandle) -> Self {
        Self(Arc::new(Mutex::new(InterruptTarget(handle.as_ptr()))))
    }

    pub(crate) fn interrupt(&self) {
        let target = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !target.0.is_null() {
            ffi::interrupt(target.0);
        }
    }

    /// Detach from the connection. Later interrupts do nothing.
    pub(crate) fn detach(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).0 = ptr::null_mut();
    }
}

/// A thread-safe handle that can abort a statement running on its connection.
///
/// The interrupted step fails with an error whose [`is_interrupt`] is true. Interrupting after
/// the connection has been dropped does nothing.
///
/// [`is_interrupt`]: crate::SqliteError::is_interrupt
#[derive(Clone)]
pub struct InterruptHandle {
    pub(crate) shared: SharedInterrupt,
}

impl InterruptHandle {
    /// Interrupt the statement currently running on the connection, if any.
    pub fn interrupt(&self) {
        self.shared.interrupt();
    }
}

impl std::fmt::Debug for InterruptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptHandle").finish_non_exhaustive()
    }
}
