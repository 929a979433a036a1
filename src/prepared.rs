use log::debug;
use mysqlclient_sys as ffi;
use std::os::raw::{c_ulong, c_void};

use crate::{
    handles::{self, Fetch, Indicator, ParamSlot},
    Error, Parameter,
};

/// A prepared statement, created with [`crate::Connection::prepare`]. Prepared statements are
/// useful if similar queries should be executed more than once: bind new parameter values and
/// execute again, the server reuses the parsed statement.
///
/// The statement owns the bind buffers its parameters are copied into, one slot per `?`
/// placeholder, as well as the indicator cells the client library fills for each result column
/// during a fetch. Dropping it closes the native statement handle and releases any buffered
/// result set.
pub struct Prepared<'c> {
    statement: handles::Statement<'c>,
    query: String,
    params: Vec<ParamSlot>,
    columns: Vec<Indicator>,
    executed: bool,
    has_result_set: bool,
    rows_affected: u64,
    last_insert_id: u64,
}

impl<'c> Prepared<'c> {
    pub(crate) fn new(statement: handles::Statement<'c>, query: String) -> Self {
        // Every placeholder starts out bound to SQL NULL. Binding is optional that way, and
        // `reset` restores exactly this state.
        let params = (0..statement.param_count()).map(|_| ParamSlot::new()).collect();
        Self {
            statement,
            query,
            params,
            columns: Vec::new(),
            executed: false,
            has_result_set: false,
            rows_affected: 0,
            last_insert_id: 0,
        }
    }

    /// The statement text this statement has been prepared from.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Number of `?` placeholders in the statement.
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    /// Number of columns in the result set of the last execution. Zero before the first
    /// execution and for statements which do not produce a result set.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Affected row count of the last execution. For statements with a result set this is the
    /// number of rows in the set.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Identifier generated by the last execution for an `AUTO_INCREMENT` column. Zero if the
    /// statement did not generate one.
    pub fn last_insert_id(&self) -> u64 {
        self.last_insert_id
    }

    /// Binds a value to the placeholder with the one based index `index`. The value is copied
    /// into the statement's bind buffer immediately; `value` does not need to outlive the call.
    ///
    /// Binding after an execution affects only subsequent executions.
    pub fn bind(&mut self, index: usize, value: impl Parameter) -> Result<(), Error> {
        value.bind_to(self.slot_mut(index)?);
        Ok(())
    }

    /// Binds SQL NULL to the placeholder with the one based index `index`.
    pub fn bind_null(&mut self, index: usize) -> Result<(), Error> {
        self.slot_mut(index)?.set_null();
        Ok(())
    }

    /// Runs the statement with the currently bound parameter values.
    ///
    /// If the statement produces a result set it is buffered client side in its entirety, and
    /// rows can be visited with [`Self::next`]. Returns the affected row count, like
    /// [`Self::rows_affected`].
    pub fn execute(&mut self) -> Result<u64, Error> {
        debug!("Executing prepared statement: {}", self.query);
        if self.has_result_set {
            self.statement.free_result();
        }
        self.executed = true;
        self.has_result_set = false;
        self.columns.clear();

        if !self.params.is_empty() {
            let mut binds: Vec<ffi::MYSQL_BIND> =
                self.params.iter_mut().map(ParamSlot::fill_bind).collect();
            // The bind structures point into `self.params`, which is neither moved nor touched
            // until execution returns.
            unsafe { self.statement.bind_parameters(binds.as_mut_ptr()) }
                .map_err(|record| self.execute_error(record))?;
        }

        // The metadata probe has to happen while the statement is prepared but before rows are
        // fetched, per the calling convention of the client library.
        let column_count = self.statement.result_field_count();
        self.statement
            .execute()
            .map_err(|record| self.execute_error(record))?;

        if column_count != 0 {
            self.columns = (0..column_count).map(|_| Indicator::new()).collect();
            let mut binds: Vec<ffi::MYSQL_BIND> =
                self.columns.iter_mut().map(Indicator::fill_bind).collect();
            // Empty data buffers: each fetch fills only the indicator cells, values are pulled
            // afterwards with `fetch_column` at their exact length.
            unsafe { self.statement.bind_result(binds.as_mut_ptr()) }
                .map_err(|record| self.execute_error(record))?;
            self.statement
                .store_result()
                .map_err(|record| self.execute_error(record))?;
            self.has_result_set = true;
        }

        self.rows_affected = self.statement.affected_rows();
        self.last_insert_id = self.statement.insert_id();
        handles::log_server_warnings(self.statement.connection());
        Ok(self.rows_affected)
    }

    /// Advances to the next row of the result set. Executes the statement first if the caller
    /// has not done so.
    ///
    /// Returns `false` once the result set is exhausted, or if the statement does not produce
    /// one. A truncation report from the client library counts as a fetched row: the data
    /// buffers are empty by design, values are pulled at their exact length by the getters.
    pub fn next(&mut self) -> Result<bool, Error> {
        if !self.executed {
            self.execute()?;
        }
        if !self.has_result_set {
            return Ok(false);
        }
        match self.statement.fetch() {
            Ok(Fetch::Row | Fetch::Truncated) => Ok(true),
            Ok(Fetch::NoData) => Ok(false),
            Err(record) => Err(self.fetch_error(record)),
        }
    }

    /// Restores the statement to its freshly prepared state: every placeholder is bound to SQL
    /// NULL again and any buffered result set is released. The statement can then be executed
    /// from a clean slate.
    pub fn reset(&mut self) {
        for slot in &mut self.params {
            slot.set_null();
        }
        if self.has_result_set {
            self.statement.free_result();
        }
        self.columns.clear();
        self.executed = false;
        self.has_result_set = false;
        self.rows_affected = 0;
        self.last_insert_id = 0;
    }

    /// Value of the column with the zero based index `index` in the current row, fetched as a
    /// four byte integer. `None` if the value is SQL NULL.
    pub fn get_i32(&mut self, index: usize) -> Result<Option<i32>, Error> {
        if self.indicator(index)?.is_null() {
            return Ok(None);
        }
        let mut buffer = [0_u8; 4];
        self.fetch_value(index, ffi::enum_field_types::MYSQL_TYPE_LONG, &mut buffer)?;
        Ok(Some(i32::from_ne_bytes(buffer)))
    }

    /// Value of the column with the zero based index `index` in the current row, fetched as an
    /// eight byte integer and narrowed. `None` if the value is SQL NULL,
    /// [`Error::ValueOutOfRange`] if it does not fit an `u32`.
    pub fn get_u32(&mut self, index: usize) -> Result<Option<u32>, Error> {
        let value = match self.get_i64(index)? {
            None => return Ok(None),
            Some(value) => value,
        };
        let narrowed = u32::try_from(value)
            .map_err(|_| Error::ValueOutOfRange { index, value })?;
        Ok(Some(narrowed))
    }

    /// Value of the column with the zero based index `index` in the current row, fetched as an
    /// eight byte integer. `None` if the value is SQL NULL.
    pub fn get_i64(&mut self, index: usize) -> Result<Option<i64>, Error> {
        if self.indicator(index)?.is_null() {
            return Ok(None);
        }
        let mut buffer = [0_u8; 8];
        self.fetch_value(
            index,
            ffi::enum_field_types::MYSQL_TYPE_LONGLONG,
            &mut buffer,
        )?;
        Ok(Some(i64::from_ne_bytes(buffer)))
    }

    /// Value of the column with the zero based index `index` in the current row, fetched as a
    /// double precision float. `None` if the value is SQL NULL.
    pub fn get_f64(&mut self, index: usize) -> Result<Option<f64>, Error> {
        if self.indicator(index)?.is_null() {
            return Ok(None);
        }
        let mut buffer = [0_u8; 8];
        self.fetch_value(index, ffi::enum_field_types::MYSQL_TYPE_DOUBLE, &mut buffer)?;
        Ok(Some(f64::from_ne_bytes(buffer)))
    }

    /// Text value of the column with the zero based index `index` in the current row. `None` if
    /// the value is SQL NULL; a zero length string is `Some` and empty. Bytes which are not
    /// valid UTF-8 are replaced with placeholder characters.
    ///
    /// The buffer is allocated to the exact byte length the client library reported for the
    /// value when the row was fetched.
    pub fn get_text(&mut self, index: usize) -> Result<Option<String>, Error> {
        match self.get_bytes_as(index, ffi::enum_field_types::MYSQL_TYPE_STRING)? {
            None => Ok(None),
            Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        }
    }

    /// Binary value of the column with the zero based index `index` in the current row. `None`
    /// if the value is SQL NULL; a zero length value is `Some` and empty.
    pub fn get_bytes(&mut self, index: usize) -> Result<Option<Vec<u8>>, Error> {
        self.get_bytes_as(index, ffi::enum_field_types::MYSQL_TYPE_BLOB)
    }

    fn get_bytes_as(
        &mut self,
        index: usize,
        buffer_type: ffi::enum_field_types,
    ) -> Result<Option<Vec<u8>>, Error> {
        let indicator = self.indicator(index)?;
        if indicator.is_null() {
            return Ok(None);
        }
        let length = indicator.length();
        if length == 0 {
            return Ok(Some(Vec::new()));
        }
        let mut buffer = vec![0_u8; length];
        self.fetch_value(index, buffer_type, &mut buffer)?;
        Ok(Some(buffer))
    }

    /// Pulls the current row's value of one column into `buffer`.
    fn fetch_value(
        &mut self,
        index: usize,
        buffer_type: ffi::enum_field_types,
        buffer: &mut [u8],
    ) -> Result<(), Error> {
        // The library insists on writing length and null information even for this single value,
        // so give it scratch cells to fill.
        let mut scratch = Indicator::new();
        let mut bind = scratch.fill_bind();
        bind.buffer_type = buffer_type;
        bind.buffer = buffer.as_mut_ptr() as *mut c_void;
        bind.buffer_length = buffer.len() as c_ulong;
        unsafe { self.statement.fetch_column(index as u32, &mut bind) }
            .map_err(|record| self.fetch_error(record))
    }

    fn indicator(&self, index: usize) -> Result<&Indicator, Error> {
        self.columns
            .get(index)
            .ok_or(Error::ColumnIndexOutOfBounds {
                index,
                count: self.columns.len(),
            })
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut ParamSlot, Error> {
        let count = self.params.len();
        if index == 0 || index > count {
            return Err(Error::ParameterIndexOutOfBounds { index, count });
        }
        Ok(&mut self.params[index - 1])
    }

    fn execute_error(&self, record: handles::Record) -> Error {
        Error::Execute {
            record,
            query: self.query.clone(),
        }
    }

    fn fetch_error(&self, record: handles::Record) -> Error {
        Error::Fetch {
            record,
            query: self.query.clone(),
        }
    }
}
