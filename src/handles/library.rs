use mysqlclient_sys as ffi;
use std::{ptr::null_mut, sync::Once};

static INIT: Once = Once::new();

/// Initializes the client library for the entire process.
///
/// The client library requires `mysql_server_init` to be called before any other call into it,
/// and the call is not thread safe. Guarding it with [`Once`] and invoking it from every handle
/// allocation makes the requirement invisible to users of this crate.
pub fn init_once() {
    INIT.call_once(|| {
        let error_code = unsafe { ffi::mysql_server_init(0, null_mut(), null_mut()) };
        if error_code != 0 {
            panic!("Unable to perform the global initialization of the MySQL client library.")
        }
    })
}
