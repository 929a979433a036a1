/// Options which can be used to configure a connection to a MySQL (or MariaDB) server.
///
/// ```no_run
/// use mysql_api::{Connection, ConnectOptions};
///
/// let options = ConnectOptions::new()
///     .host("db.example.com")
///     .username("app")
///     .password("secret")
///     .database("movies");
/// let connection = Connection::connect(&options)?;
/// # Ok::<(), mysql_api::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct ConnectOptions {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) username: String,
    pub(crate) password: Option<String>,
    pub(crate) database: Option<String>,
    pub(crate) charset: Option<String>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self {
            host: String::from("localhost"),
            port: 3306,
            username: String::from("root"),
            password: None,
            database: None,
            charset: Some(String::from("utf8mb4")),
        }
    }

    /// Host name or IP address of the server. Defaults to `localhost`.
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_owned();
        self
    }

    /// TCP port the server listens on. Defaults to `3306`.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// User name to authenticate as. Defaults to `root`.
    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_owned();
        self
    }

    /// Password belonging to the user. Defaults to none.
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_owned());
        self
    }

    /// Default database of the session. Defaults to none.
    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(database.to_owned());
        self
    }

    /// Character set of the session, established by executing `SET NAMES` right after the
    /// handshake. Defaults to `utf8mb4`.
    pub fn charset(mut self, charset: &str) -> Self {
        self.charset = Some(charset.to_owned());
        self
    }

    /// Leave the session character set at whatever the server defaults to.
    pub fn no_charset(mut self) -> Self {
        self.charset = None;
        self
    }
}
