use super::{
    diagnostics::{Diagnostics, Record},
    library,
    statement::Statement,
};
use mysqlclient_sys as ffi;
use std::{
    ffi::CStr,
    os::raw::{c_char, c_int, c_ulong},
    ptr::{null, null_mut, NonNull},
};

/// Capability flag passed to the server during the handshake. With it the affected row count of
/// `UPDATE` statements reports the number of rows matched by the `WHERE` clause, rather than the
/// number of rows actually changed. `CLIENT_FOUND_ROWS` in `mysql.h`.
const CLIENT_FOUND_ROWS: c_ulong = 2;

/// Wraps a valid (i.e. successfully allocated) connection handle of the client library.
///
/// The client library does not allow sharing a connection handle between threads without external
/// synchronization. Holding the raw pointer makes this type neither `Send` nor `Sync`, which is
/// exactly the contract we want to express.
pub struct Connection {
    handle: NonNull<ffi::MYSQL>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        unsafe {
            ffi::mysql_close(self.handle.as_ptr());
        }
    }
}

impl Diagnostics for Connection {
    fn diagnostics(&self) -> Record {
        unsafe {
            let code = ffi::mysql_errno(self.handle.as_ptr());
            let message = CStr::from_ptr(ffi::mysql_error(self.handle.as_ptr()))
                .to_string_lossy()
                .into_owned();
            Record { code, message }
        }
    }
}

impl Connection {
    /// Allocates a new connection handle (`mysql_init`). The handle is not yet connected to any
    /// server. Returns `None` if the client library fails to allocate the handle.
    pub fn allocate() -> Option<Self> {
        library::init_once();
        let handle = unsafe { ffi::mysql_init(null_mut()) };
        NonNull::new(handle).map(|handle| Self { handle })
    }

    /// Establishes a session with the server (`mysql_real_connect`). The `CLIENT_FOUND_ROWS`
    /// capability is always requested.
    ///
    /// # Parameters
    ///
    /// * `host`: Host name or IP address of the server.
    /// * `user`: User name to authenticate as.
    /// * `password`: Password belonging to `user`.
    /// * `database`: Default database of the session, if any.
    /// * `port`: TCP port the server listens on.
    pub fn connect(
        &mut self,
        host: &CStr,
        user: &CStr,
        password: &CStr,
        database: Option<&CStr>,
        port: u16,
    ) -> Result<(), Record> {
        let database = database.map(CStr::as_ptr).unwrap_or(null());
        let success = unsafe {
            ffi::mysql_real_connect(
                self.handle.as_ptr(),
                host.as_ptr(),
                user.as_ptr(),
                password.as_ptr(),
                database,
                port.into(),
                null(), // Unix socket. We always connect via TCP.
                CLIENT_FOUND_ROWS,
            )
        };
        if success.is_null() {
            Err(self.diagnostics())
        } else {
            Ok(())
        }
    }

    /// `true` if the server is alive and the connection usable (`mysql_ping`).
    pub fn ping(&self) -> bool {
        unsafe { ffi::mysql_ping(self.handle.as_ptr()) == 0 }
    }

    /// Executes a statement for one-time execution (`mysql_real_query`) and returns its affected
    /// row count. Any result sets the statement may have produced are drained afterwards, so the
    /// session remains usable for subsequent commands.
    pub fn execute(&self, query: &str) -> Result<u64, Record> {
        unsafe {
            let result = ffi::mysql_real_query(
                self.handle.as_ptr(),
                query.as_ptr() as *const c_char,
                query.len() as c_ulong,
            );
            if result != 0 {
                return Err(self.diagnostics());
            }
            let affected = ffi::mysql_affected_rows(self.handle.as_ptr());
            self.drain_results();
            Ok(affected)
        }
    }

    /// Frees any pending result sets. The session rejects new commands while results of a
    /// previous statement remain unconsumed ("commands out of sync").
    unsafe fn drain_results(&self) {
        loop {
            let result = ffi::mysql_store_result(self.handle.as_ptr());
            if !result.is_null() {
                ffi::mysql_free_result(result);
            }
            if ffi::mysql_next_result(self.handle.as_ptr()) != 0 {
                break;
            }
        }
    }

    /// Enables or disables autocommit for this session. The statement sent is byte for byte what
    /// the client library's `mysql_autocommit` entry point sends on the session.
    pub fn set_autocommit(&self, enabled: bool) -> Result<(), Record> {
        let query = if enabled {
            "SET autocommit=1"
        } else {
            "SET autocommit=0"
        };
        self.execute(query).map(|_| ())
    }

    /// Commits the current transaction (`mysql_commit`). Does not touch the autocommit setting.
    pub fn commit(&self) -> Result<(), Record> {
        let failed = unsafe { ffi::mysql_commit(self.handle.as_ptr()) };
        if failed as c_int != 0 {
            Err(self.diagnostics())
        } else {
            Ok(())
        }
    }

    /// Rolls back the current transaction (`mysql_rollback`). Does not touch the autocommit
    /// setting.
    pub fn rollback(&self) -> Result<(), Record> {
        let failed = unsafe { ffi::mysql_rollback(self.handle.as_ptr()) };
        if failed as c_int != 0 {
            Err(self.diagnostics())
        } else {
            Ok(())
        }
    }

    /// Identifier generated by the most recent statement inserting into a table with an
    /// `AUTO_INCREMENT` column (`mysql_insert_id`). Zero if no such statement has been executed.
    pub fn last_insert_id(&self) -> u64 {
        unsafe { ffi::mysql_insert_id(self.handle.as_ptr()) }
    }

    /// Number of warnings the server accumulated while executing the most recent statement
    /// (`mysql_warning_count`).
    pub fn warning_count(&self) -> u32 {
        unsafe { ffi::mysql_warning_count(self.handle.as_ptr()) }
    }

    /// Allocates a statement handle on this connection (`mysql_stmt_init`). The statement borrows
    /// the connection, it can not outlive it.
    pub fn init_statement(&self) -> Result<Statement<'_>, Record> {
        let handle = unsafe { ffi::mysql_stmt_init(self.handle.as_ptr()) };
        match NonNull::new(handle) {
            Some(handle) => Ok(unsafe { Statement::new(self, handle) }),
            None => Err(self.diagnostics()),
        }
    }
}
