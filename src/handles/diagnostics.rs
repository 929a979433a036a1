use log::warn;
use std::fmt;

/// Client error code raised if the connection to the server has been lost between two requests.
/// The client library calls this condition "server has gone away" (`CR_SERVER_GONE_ERROR` in
/// `errmsg.h`).
pub const CR_SERVER_GONE_ERROR: u32 = 2006;

/// An error record as reported by a handle of the client library. Consists of the error number
/// and the human readable error message associated with the last failed call on that handle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    /// Error number as reported by `mysql_errno` or `mysql_stmt_errno`. Values in the range
    /// starting with 2000 are generated by the client library itself, everything below comes from
    /// the server.
    pub code: u32,
    /// Error message associated with `code`. Placeholder characters are used for any bytes which
    /// are not valid UTF-8.
    pub message: String,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Implemented by handles which can report an error record for their last failed call.
pub trait Diagnostics {
    /// Capture the error record of the most recent failed call on this handle. Must be invoked
    /// before any other call on the same handle overwrites it.
    fn diagnostics(&self) -> Record;
}

/// Logs the number of warnings the server accumulated while executing the most recent statement
/// on `connection`. The warning texts themselves would require issuing `SHOW WARNINGS`, which this
/// crate leaves to the application.
pub fn log_server_warnings(connection: &super::Connection) {
    let count = connection.warning_count();
    if count != 0 {
        warn!("Server reported {count} warning(s) for the last executed statement.");
    }
}
