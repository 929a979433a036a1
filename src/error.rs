use std::ffi::NulError;

use thiserror::Error as ThisError;

use crate::handles::Record;

/// Error type used to indicate a failed call into the client library, or an invalid use of this
/// crate's API which could be rejected before reaching the library.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The client library could not allocate a connection handle. This means the process is out
    /// of memory; no error record is available since there is no handle to read it from.
    #[error("The client library failed to allocate a connection handle.")]
    FailedAllocatingConnection,
    /// The handshake with the server failed. Covers unreachable servers as well as rejected
    /// credentials; the embedded record tells them apart.
    #[error("Failed to connect to the database server at {host}:{port}:\n{record}")]
    Connect {
        record: Record,
        host: String,
        port: u16,
    },
    /// The server could not parse or plan the statement during preparation.
    #[error("Failed to prepare the statement '{query}':\n{record}")]
    Prepare { record: Record, query: String },
    /// Binding parameters or running the statement failed.
    #[error("Failed to execute the statement '{query}':\n{record}")]
    Execute { record: Record, query: String },
    /// Advancing the row cursor or pulling a column value failed.
    #[error("Failed to fetch results of the statement '{query}':\n{record}")]
    Fetch { record: Record, query: String },
    /// The server rejected the commit. The transaction may or may not have been applied; the
    /// connection is back in autocommit mode either way.
    #[error("Failed to commit the transaction:\n{record}")]
    Commit { record: Record },
    /// The server rejected the rollback. The connection is back in autocommit mode regardless.
    #[error("Failed to roll back the transaction:\n{record}")]
    Rollback { record: Record },
    /// A parameter index outside of the statement's placeholder range has been used. Nothing has
    /// been bound.
    #[error(
        "Parameter index {index} is out of bounds. The statement has {count} placeholder(s), \
        indices start at 1."
    )]
    ParameterIndexOutOfBounds { index: usize, count: usize },
    /// A column index outside of the result set has been used. Nothing has been fetched.
    #[error(
        "Column index {index} is out of bounds. The result set has {count} column(s), indices \
        start at 0."
    )]
    ColumnIndexOutOfBounds { index: usize, count: usize },
    /// A column value does not fit the domain of the requested Rust type.
    #[error("Column {index} holds the value {value}, which does not fit the requested type.")]
    ValueOutOfRange { index: usize, value: i64 },
    /// A connection argument contained an interior nul byte and therefore can not be passed
    /// through the C interface.
    #[error("A string argument contains an interior nul byte.")]
    InteriorNul(#[from] NulError),
}

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::handles::Record;

    #[test]
    fn connect_error_names_the_server() {
        let error = Error::Connect {
            record: Record {
                code: 1045,
                message: String::from("Access denied for user 'app'@'localhost'"),
            },
            host: String::from("localhost"),
            port: 3306,
        };
        let text = error.to_string();
        assert!(text.contains("localhost:3306"));
        assert!(text.contains("[1045]"));
        assert!(text.contains("Access denied"));
    }

    #[test]
    fn bounds_errors_explain_the_index_base() {
        let error = Error::ParameterIndexOutOfBounds { index: 3, count: 2 };
        assert!(error.to_string().contains("indices start at 1"));

        let error = Error::ColumnIndexOutOfBounds { index: 2, count: 2 };
        assert!(error.to_string().contains("indices start at 0"));
    }
}
