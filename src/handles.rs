//! Provides basic abstractions over valid (i.e. successfully allocated) handles of the MySQL
//! client library. Two decisions are already baked into this module:
//! * Initialize the client library lazily, once per process, before the first handle is allocated.
//! * Treat warnings reported by the server by logging them with `log`.

mod bind;
mod connection;
mod diagnostics;
mod library;
mod statement;

pub use self::{
    bind::{Indicator, ParamSlot, INLINE_CAPACITY},
    connection::Connection,
    diagnostics::{log_server_warnings, Diagnostics, Record, CR_SERVER_GONE_ERROR},
    statement::{Fetch, Statement},
};
