use log::{debug, warn};
use std::ffi::CString;

use crate::{
    handles::{self, CR_SERVER_GONE_ERROR},
    ConnectOptions, Error, Prepared,
};

/// Maximum number of times preparation is restarted after the server reports that it has gone
/// away between requests. The client library reconnects underneath, so the first retry is
/// expected to succeed; if the server stays unreachable the error is surfaced instead of
/// spinning.
const MAX_PREPARE_ATTEMPTS: u32 = 3;

/// An open session with a MySQL (or MariaDB) server.
///
/// The connection is closed when this is dropped. Statements prepared on the connection borrow
/// it and must be dropped first.
///
/// A connection must not be used from two threads at once, which is why this type is neither
/// `Send` nor `Sync`.
pub struct Connection {
    connection: handles::Connection,
}

impl Connection {
    /// Establishes a session with the server described by `options`.
    ///
    /// The `CLIENT_FOUND_ROWS` capability is requested during the handshake, so affected row
    /// counts report the rows matched rather than the rows changed. If the options carry a
    /// character set (they do by default), it is established by executing `SET NAMES` right
    /// after the handshake.
    ///
    /// ```no_run
    /// use mysql_api::{Connection, ConnectOptions};
    ///
    /// let options = ConnectOptions::new().username("app").password("secret");
    /// let connection = Connection::connect(&options)?;
    /// assert!(connection.ping());
    /// # Ok::<(), mysql_api::Error>(())
    /// ```
    pub fn connect(options: &ConnectOptions) -> Result<Self, Error> {
        let mut connection =
            handles::Connection::allocate().ok_or(Error::FailedAllocatingConnection)?;

        let host = CString::new(options.host.as_str())?;
        let user = CString::new(options.username.as_str())?;
        let password = CString::new(options.password.as_deref().unwrap_or(""))?;
        let database = options
            .database
            .as_deref()
            .map(CString::new)
            .transpose()?;

        connection
            .connect(&host, &user, &password, database.as_deref(), options.port)
            .map_err(|record| Error::Connect {
                record,
                host: options.host.clone(),
                port: options.port,
            })?;
        debug!(
            "Connected to {}:{} as '{}'.",
            options.host, options.port, options.username
        );

        let connection = Self { connection };
        if let Some(charset) = options.charset.as_deref() {
            connection.execute(&format!("SET NAMES {charset}"))?;
        }
        Ok(connection)
    }

    /// `true` if the server is alive and the connection usable.
    pub fn ping(&self) -> bool {
        self.connection.ping()
    }

    /// Executes a statement without placeholders. This is the fastest way to submit an SQL
    /// statement for one-time execution.
    ///
    /// # Return
    ///
    /// The affected row count. With the found-rows capability this crate requests during the
    /// handshake, `UPDATE` statements report the number of rows matched by their `WHERE` clause.
    pub fn execute(&self, query: &str) -> Result<u64, Error> {
        debug!("Executing: {query}");
        let affected = self
            .connection
            .execute(query)
            .map_err(|record| Error::Execute {
                record,
                query: query.to_owned(),
            })?;
        handles::log_server_warnings(&self.connection);
        Ok(affected)
    }

    /// Prepares an SQL statement. This is recommended for repeated execution of similar queries,
    /// and the only way to bind parameters or fetch result rows.
    ///
    /// # Parameters
    ///
    /// * `query`: The text representation of the SQL statement. E.g. "SELECT * FROM my_table;".
    ///   `?` may be used as a placeholder in the statement text, to be replaced with parameters
    ///   during execution.
    ///
    /// If the server reports that it has gone away between requests, the statement handle is
    /// released and the preparation restarted; the client library reconnects underneath. A
    /// server which stays unreachable surfaces as [`Error::Prepare`].
    pub fn prepare(&self, query: &str) -> Result<Prepared<'_>, Error> {
        let mut remaining_attempts = MAX_PREPARE_ATTEMPTS;
        loop {
            let mut statement =
                self.connection
                    .init_statement()
                    .map_err(|record| Error::Prepare {
                        record,
                        query: query.to_owned(),
                    })?;
            match statement.prepare(query) {
                Ok(()) => {
                    debug!("Prepared: {query}");
                    return Ok(Prepared::new(statement, query.to_owned()));
                }
                Err(record) if record.code == CR_SERVER_GONE_ERROR && remaining_attempts > 1 => {
                    // Dropping the statement releases its handle before we start over.
                    remaining_attempts -= 1;
                    warn!("Server has gone away while preparing a statement. Retrying.");
                }
                Err(record) => {
                    return Err(Error::Prepare {
                        record,
                        query: query.to_owned(),
                    })
                }
            }
        }
    }

    /// Opens an explicit transaction by disabling autocommit for the session. Ended by either
    /// [`Self::commit`] or [`Self::rollback`].
    pub fn begin(&self) -> Result<(), Error> {
        self.connection
            .set_autocommit(false)
            .map_err(|record| Error::Execute {
                record,
                query: String::from("SET autocommit=0"),
            })
    }

    /// Commits the transaction opened with [`Self::begin`]. Autocommit is restored whether or
    /// not the commit succeeds.
    pub fn commit(&self) -> Result<(), Error> {
        let result = self.connection.commit();
        self.restore_autocommit();
        result.map_err(|record| Error::Commit { record })
    }

    /// Rolls back the transaction opened with [`Self::begin`]. Autocommit is restored whether or
    /// not the rollback succeeds.
    pub fn rollback(&self) -> Result<(), Error> {
        let result = self.connection.rollback();
        self.restore_autocommit();
        result.map_err(|record| Error::Rollback { record })
    }

    fn restore_autocommit(&self) {
        if let Err(record) = self.connection.set_autocommit(true) {
            // The transaction outcome is what the caller needs to hear about; a session which
            // can not even toggle autocommit any more will fail its next operation loudly.
            warn!("Failed to restore autocommit after ending a transaction: {record}");
        }
    }

    /// Identifier generated by the most recent statement inserting into a table with an
    /// `AUTO_INCREMENT` column. Zero if no such statement has been executed on this connection.
    pub fn last_insert_id(&self) -> u64 {
        self.connection.last_insert_id()
    }
}
