use super::{
    connection::Connection,
    diagnostics::{Diagnostics, Record},
};
use log::warn;
use mysqlclient_sys as ffi;
use std::{
    ffi::CStr,
    os::raw::{c_char, c_int, c_uint, c_ulong},
    ptr::NonNull,
};

/// Status code returned by `mysql_stmt_fetch` once the result set is exhausted. `MYSQL_NO_DATA`
/// in `mysql.h`.
const MYSQL_NO_DATA: c_int = 100;
/// Status code returned by `mysql_stmt_fetch` if at least one bound buffer was too small for the
/// value in the row. `MYSQL_DATA_TRUNCATED` in `mysql.h`.
const MYSQL_DATA_TRUNCATED: c_int = 101;

/// Outcome of advancing a statements cursor by one row.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fetch {
    /// A row has been fetched and every bound buffer was large enough to hold its value.
    Row,
    /// A row has been fetched, but at least one value did not fit its bound buffer. The complete
    /// value can still be obtained through [`Statement::fetch_column`].
    Truncated,
    /// The result set is exhausted.
    NoData,
}

/// Wraps a valid (i.e. successfully allocated) statement handle of the client library. Borrows
/// the connection it has been allocated on.
pub struct Statement<'c> {
    connection: &'c Connection,
    handle: NonNull<ffi::MYSQL_STMT>,
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        unsafe {
            ffi::mysql_stmt_free_result(self.handle.as_ptr());
            let failed = ffi::mysql_stmt_close(self.handle.as_ptr());
            if failed as c_int != 0 {
                // Closing fails if the connection broke down underneath the statement. Nothing
                // left to release in that case, but leave a trace for the log.
                warn!("Error closing statement handle: {}", self.diagnostics());
            }
        }
    }
}

impl Diagnostics for Statement<'_> {
    fn diagnostics(&self) -> Record {
        unsafe {
            let code = ffi::mysql_stmt_errno(self.handle.as_ptr());
            let message = CStr::from_ptr(ffi::mysql_stmt_error(self.handle.as_ptr()))
                .to_string_lossy()
                .into_owned();
            Record { code, message }
        }
    }
}

impl<'c> Statement<'c> {
    /// # Safety
    ///
    /// `handle` must be a valid statement handle allocated on `connection`.
    pub unsafe fn new(connection: &'c Connection, handle: NonNull<ffi::MYSQL_STMT>) -> Self {
        Self { connection, handle }
    }

    /// The connection this statement has been allocated on.
    pub fn connection(&self) -> &'c Connection {
        self.connection
    }

    /// Parses the statement text server side (`mysql_stmt_prepare`). Must be called exactly once
    /// before any of the other operations. `?` may be used in `query` to mark positional
    /// parameters.
    pub fn prepare(&mut self, query: &str) -> Result<(), Record> {
        let result = unsafe {
            ffi::mysql_stmt_prepare(
                self.handle.as_ptr(),
                query.as_ptr() as *const c_char,
                query.len() as c_ulong,
            )
        };
        self.check(result)
    }

    /// Number of parameter markers in the prepared statement (`mysql_stmt_param_count`).
    pub fn param_count(&self) -> usize {
        unsafe { ffi::mysql_stmt_param_count(self.handle.as_ptr()) as usize }
    }

    /// Number of columns the statement produces, determined from its result set metadata
    /// (`mysql_stmt_result_metadata`). Zero for statements without a result set.
    pub fn result_field_count(&self) -> usize {
        unsafe {
            let metadata = ffi::mysql_stmt_result_metadata(self.handle.as_ptr());
            if metadata.is_null() {
                0
            } else {
                let count = ffi::mysql_num_fields(metadata);
                ffi::mysql_free_result(metadata);
                count as usize
            }
        }
    }

    /// Hands the array of parameter bind structures to the client library
    /// (`mysql_stmt_bind_param`).
    ///
    /// # Safety
    ///
    /// `binds` must point to an array with one element per parameter marker, and every buffer and
    /// indicator cell referenced by those elements must stay valid and unmoved until execution
    /// returns.
    pub unsafe fn bind_parameters(&mut self, binds: *mut ffi::MYSQL_BIND) -> Result<(), Record> {
        let failed = ffi::mysql_stmt_bind_param(self.handle.as_ptr(), binds);
        if failed as c_int != 0 {
            Err(self.diagnostics())
        } else {
            Ok(())
        }
    }

    /// Runs the prepared statement with the currently bound parameters (`mysql_stmt_execute`).
    pub fn execute(&mut self) -> Result<(), Record> {
        let result = unsafe { ffi::mysql_stmt_execute(self.handle.as_ptr()) };
        self.check(result)
    }

    /// Hands the array of result bind structures to the client library
    /// (`mysql_stmt_bind_result`).
    ///
    /// # Safety
    ///
    /// `binds` must point to an array with one element per result column. Every buffer and
    /// indicator cell referenced by those elements must stay valid and unmoved for as long as
    /// rows are fetched from this result set.
    pub unsafe fn bind_result(&mut self, binds: *mut ffi::MYSQL_BIND) -> Result<(), Record> {
        let failed = ffi::mysql_stmt_bind_result(self.handle.as_ptr(), binds);
        if failed as c_int != 0 {
            Err(self.diagnostics())
        } else {
            Ok(())
        }
    }

    /// Buffers the entire result set client side (`mysql_stmt_store_result`). Required before
    /// values can be pulled column by column with [`Self::fetch_column`].
    pub fn store_result(&mut self) -> Result<(), Record> {
        let result = unsafe { ffi::mysql_stmt_store_result(self.handle.as_ptr()) };
        self.check(result)
    }

    /// Advances the cursor to the next row (`mysql_stmt_fetch`), filling all bound indicator
    /// cells and buffers.
    pub fn fetch(&mut self) -> Result<Fetch, Record> {
        let result = unsafe { ffi::mysql_stmt_fetch(self.handle.as_ptr()) };
        match result {
            0 => Ok(Fetch::Row),
            MYSQL_NO_DATA => Ok(Fetch::NoData),
            MYSQL_DATA_TRUNCATED => Ok(Fetch::Truncated),
            _ => Err(self.diagnostics()),
        }
    }

    /// Pulls the value of one column of the current row into the buffer described by `bind`
    /// (`mysql_stmt_fetch_column`). `column` is zero based.
    ///
    /// # Safety
    ///
    /// The buffer and indicator cells referenced by `bind` must be valid for the duration of the
    /// call, and `bind.buffer_length` must not overstate the buffer's size.
    pub unsafe fn fetch_column(
        &self,
        column: u32,
        bind: &mut ffi::MYSQL_BIND,
    ) -> Result<(), Record> {
        let result =
            ffi::mysql_stmt_fetch_column(self.handle.as_ptr(), bind, column as c_uint, 0);
        self.check(result)
    }

    /// Releases the buffered result set, if any (`mysql_stmt_free_result`). The statement stays
    /// prepared and can be executed again.
    pub fn free_result(&mut self) {
        let failed = unsafe { ffi::mysql_stmt_free_result(self.handle.as_ptr()) };
        if failed as c_int != 0 {
            warn!("Error freeing statement result set: {}", self.diagnostics());
        }
    }

    /// Affected row count of the last execution (`mysql_stmt_affected_rows`). For statements
    /// with a result set this is only meaningful after the result has been buffered, then it
    /// holds the number of rows in the set.
    pub fn affected_rows(&self) -> u64 {
        unsafe { ffi::mysql_stmt_affected_rows(self.handle.as_ptr()) }
    }

    /// Identifier generated by the last execution for an `AUTO_INCREMENT` column
    /// (`mysql_stmt_insert_id`). Zero if the statement did not generate one.
    pub fn insert_id(&self) -> u64 {
        unsafe { ffi::mysql_stmt_insert_id(self.handle.as_ptr()) }
    }

    fn check(&self, result: c_int) -> Result<(), Record> {
        if result == 0 {
            Ok(())
        } else {
            Err(self.diagnostics())
        }
    }
}
