//! # MySQL
//!
//! This library aims at helping you write applications which talk to a MySQL (or MariaDB) server
//! in (mostly) safe Rust. It is a thin layer above the native client library's prepared statement
//! interface: connecting, preparing, binding typed parameters, executing and fetching are exposed
//! through RAII style objects instead of raw handles and out-parameters. There is no wire
//! protocol implementation in here; the native client library does the talking.
//!
//! ```no_run
//! use mysql_api::{ConnectOptions, Connection, Error};
//!
//! let options = ConnectOptions::new()
//!     .username("app")
//!     .password("secret")
//!     .database("movies");
//! let connection = Connection::connect(&options)?;
//!
//! let mut movies = connection.prepare("SELECT title, year FROM Movies WHERE year > ?")?;
//! movies.bind(1, 1980_i32)?;
//! while movies.next()? {
//!     let title = movies.get_text(0)?;
//!     let year = movies.get_i32(1)?;
//!     println!("{} ({:?})", title.unwrap_or_default(), year);
//! }
//! # Ok::<(), Error>(())
//! ```

mod connection;
mod error;
mod options;
mod parameter;
mod prepared;

pub mod handles;

pub use self::{
    connection::Connection,
    error::Error,
    handles::Record,
    options::ConnectOptions,
    parameter::Parameter,
    prepared::Prepared,
};
// Reexports
/// Reexport `mysqlclient-sys` as sys to enable applications to always use the same version as
/// this crate.
pub use mysqlclient_sys as sys;
