use lazy_static::lazy_static;
use mysql_api::{ConnectOptions, Connection, Error};
use std::{env, sync::Mutex};

/// Connection parameters of the server the `#[ignore]`d tests run against. See the Readme for how
/// to start one.
fn test_options() -> ConnectOptions {
    let mut options = ConnectOptions::new()
        .host(&env::var("MYSQL_API_TEST_HOST").unwrap_or_else(|_| String::from("localhost")))
        .username(&env::var("MYSQL_API_TEST_USER").unwrap_or_else(|_| String::from("root")))
        .database(&env::var("MYSQL_API_TEST_DATABASE").unwrap_or_else(|_| String::from("test")));
    if let Ok(port) = env::var("MYSQL_API_TEST_PORT") {
        options = options.port(port.parse().unwrap());
    }
    if let Ok(password) = env::var("MYSQL_API_TEST_PASSWORD") {
        options = options.password(&password);
    }
    options
}

// Rust by default executes tests in parallel. The tests in this file share one database,
// therefore synchronize test execution.
lazy_static! {
    static ref SERIALIZE: Mutex<()> = Mutex::new(());
}

fn init() -> &'static Mutex<()> {
    // Set environment to something like: RUST_LOG=mysql_api=debug cargo test
    let _ = env_logger::builder().is_test(true).try_init();
    &SERIALIZE
}

fn connection() -> anyhow::Result<Connection> {
    Ok(Connection::connect(&test_options())?)
}

#[test]
fn refused_connection() {
    let _lock = init().lock();
    // Port 1 is reserved; nothing is going to listen there.
    let options = ConnectOptions::new().host("127.0.0.1").port(1);
    let result = Connection::connect(&options);
    assert!(matches!(result, Err(Error::Connect { .. })));
}

#[test]
fn interior_nul_in_host_is_rejected_before_connecting() {
    let _lock = init().lock();
    let options = ConnectOptions::new().host("local\0host");
    let result = Connection::connect(&options);
    assert!(matches!(result, Err(Error::InteriorNul(_))));
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn ping_connected_server() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    assert!(connection.ping());
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn insert_and_query_roundtrip() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    connection.execute(
        "CREATE TEMPORARY TABLE Movies (id INT NOT NULL AUTO_INCREMENT PRIMARY KEY, \
         title TEXT NOT NULL, year INT)",
    )?;

    let mut insert = connection.prepare("INSERT INTO Movies (title, year) VALUES (?, ?)")?;
    assert_eq!(2, insert.parameter_count());
    insert.bind(1, "Blade Runner")?;
    insert.bind(2, 1982_i32)?;
    assert_eq!(1, insert.execute()?);
    insert.bind(1, "Jurassic Park")?;
    insert.bind(2, 1993_i32)?;
    assert_eq!(1, insert.execute()?);

    let mut select = connection.prepare("SELECT title, year FROM Movies ORDER BY year")?;
    assert!(select.next()?);
    assert_eq!(2, select.column_count());
    assert_eq!(Some(String::from("Blade Runner")), select.get_text(0)?);
    assert_eq!(Some(1982), select.get_i32(1)?);
    assert!(select.next()?);
    assert_eq!(Some(String::from("Jurassic Park")), select.get_text(0)?);
    assert_eq!(Some(1993), select.get_i32(1)?);
    assert!(!select.next()?);
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn null_values_roundtrip() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    connection.execute("CREATE TEMPORARY TABLE Nullables (a INT, b TEXT)")?;

    let mut insert = connection.prepare("INSERT INTO Nullables (a, b) VALUES (?, ?)")?;
    // One placeholder explicitly nulled, the other through `Option`.
    insert.bind_null(1)?;
    insert.bind(2, Option::<&str>::None)?;
    insert.execute()?;
    // An empty string is a value, not a NULL.
    insert.bind(1, Some(7_i32))?;
    insert.bind(2, "")?;
    insert.execute()?;

    let mut select = connection.prepare("SELECT a, b FROM Nullables ORDER BY a IS NULL DESC")?;
    assert!(select.next()?);
    assert_eq!(None, select.get_i32(0)?);
    assert_eq!(None, select.get_text(1)?);
    assert!(select.next()?);
    assert_eq!(Some(7), select.get_i32(0)?);
    assert_eq!(Some(String::new()), select.get_text(1)?);
    assert!(!select.next()?);
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn typed_values_roundtrip() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    connection.execute(
        "CREATE TEMPORARY TABLE Typed (big BIGINT, frac DOUBLE, unsig INT UNSIGNED, \
         payload BLOB, flag TINYINT)",
    )?;

    let payload: Vec<u8> = (0..=255).map(|byte| byte as u8).collect();
    let mut insert = connection
        .prepare("INSERT INTO Typed (big, frac, unsig, payload, flag) VALUES (?, ?, ?, ?, ?)")?;
    insert.bind(1, i64::MIN)?;
    insert.bind(2, 0.25_f64)?;
    insert.bind(3, u32::MAX)?;
    insert.bind(4, payload.clone())?;
    insert.bind(5, true)?;
    insert.execute()?;

    let mut select =
        connection.prepare("SELECT big, frac, unsig, payload, flag FROM Typed")?;
    assert!(select.next()?);
    assert_eq!(Some(i64::MIN), select.get_i64(0)?);
    assert_eq!(Some(0.25), select.get_f64(1)?);
    assert_eq!(Some(u32::MAX), select.get_u32(2)?);
    assert_eq!(Some(payload), select.get_bytes(3)?);
    assert_eq!(Some(1), select.get_i32(4)?);
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn negative_value_does_not_fit_u32() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    connection.execute("CREATE TEMPORARY TABLE Negative (a INT)")?;
    connection.execute("INSERT INTO Negative (a) VALUES (-1)")?;

    let mut select = connection.prepare("SELECT a FROM Negative")?;
    assert!(select.next()?);
    let result = select.get_u32(0);
    assert!(matches!(
        result,
        Err(Error::ValueOutOfRange { index: 0, value: -1 })
    ));
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn text_larger_than_the_inline_bind_buffer() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    connection.execute("CREATE TEMPORARY TABLE Paragraphs (content TEXT)")?;

    // Long enough to spill out of the fixed size slot buffer into its heap allocation.
    let content = "word ".repeat(100);
    let mut insert = connection.prepare("INSERT INTO Paragraphs (content) VALUES (?)")?;
    insert.bind(1, content.as_str())?;
    insert.execute()?;

    let mut select = connection.prepare("SELECT content FROM Paragraphs")?;
    assert!(select.next()?);
    assert_eq!(Some(content), select.get_text(0)?);
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn transactions_commit_and_rollback() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    connection.execute("CREATE TEMPORARY TABLE Ledger (amount INT) ENGINE=InnoDB")?;

    connection.begin()?;
    connection.execute("INSERT INTO Ledger (amount) VALUES (10)")?;
    connection.rollback()?;

    let mut count = connection.prepare("SELECT COUNT(*) FROM Ledger")?;
    assert!(count.next()?);
    assert_eq!(Some(0), count.get_i64(0)?);

    connection.begin()?;
    connection.execute("INSERT INTO Ledger (amount) VALUES (10)")?;
    connection.commit()?;

    let mut count = connection.prepare("SELECT COUNT(*) FROM Ledger")?;
    assert!(count.next()?);
    assert_eq!(Some(1), count.get_i64(0)?);

    // After commit the session is back in autocommit mode: no begin, no rollback to undo this.
    connection.execute("INSERT INTO Ledger (amount) VALUES (20)")?;
    let mut count = connection.prepare("SELECT COUNT(*) FROM Ledger")?;
    assert!(count.next()?);
    assert_eq!(Some(2), count.get_i64(0)?);
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn last_insert_id_is_reported() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    connection.execute(
        "CREATE TEMPORARY TABLE Counters (id INT NOT NULL AUTO_INCREMENT PRIMARY KEY, \
         name TEXT)",
    )?;

    let mut insert = connection.prepare("INSERT INTO Counters (name) VALUES (?)")?;
    insert.bind(1, "first")?;
    insert.execute()?;
    let first = insert.last_insert_id();
    assert!(first > 0);
    insert.bind(1, "second")?;
    insert.execute()?;
    assert_eq!(first + 1, insert.last_insert_id());
    assert_eq!(first + 1, connection.last_insert_id());
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn update_reports_found_rows() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    connection.execute("CREATE TEMPORARY TABLE Flags (value INT)")?;
    connection.execute("INSERT INTO Flags (value) VALUES (1)")?;

    // The value does not change, yet the row is found by the WHERE clause. Without the
    // found-rows capability this would report zero.
    let affected = connection.execute("UPDATE Flags SET value = 1 WHERE value = 1")?;
    assert_eq!(1, affected);
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn reset_restores_the_freshly_prepared_state() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    connection.execute("CREATE TEMPORARY TABLE Notes (content TEXT)")?;

    let mut insert = connection.prepare("INSERT INTO Notes (content) VALUES (?)")?;
    insert.bind(1, "remember the milk")?;
    insert.execute()?;
    insert.reset();
    // After the reset the placeholder is back to NULL.
    insert.execute()?;

    let mut select =
        connection.prepare("SELECT content FROM Notes ORDER BY content IS NULL")?;
    assert!(select.next()?);
    assert_eq!(Some(String::from("remember the milk")), select.get_text(0)?);
    assert!(select.next()?);
    assert_eq!(None, select.get_text(0)?);
    assert!(!select.next()?);
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn binding_out_of_bounds_is_rejected() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    let mut statement = connection.prepare("SELECT ?")?;

    assert!(matches!(
        statement.bind(0, 1_i32),
        Err(Error::ParameterIndexOutOfBounds { index: 0, count: 1 })
    ));
    assert!(matches!(
        statement.bind(2, 1_i32),
        Err(Error::ParameterIndexOutOfBounds { index: 2, count: 1 })
    ));

    statement.bind(1, 42_i32)?;
    assert!(statement.next()?);
    assert!(matches!(
        statement.get_i32(1),
        Err(Error::ColumnIndexOutOfBounds { index: 1, count: 1 })
    ));
    assert_eq!(Some(42), statement.get_i32(0)?);
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn prepare_reports_syntax_errors() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    let result = connection.prepare("SELCT 1");
    assert!(matches!(result, Err(Error::Prepare { .. })));
    Ok(())
}

#[test]
#[ignore = "Requires a running MySQL server, see Readme."]
fn statement_without_result_set_has_no_rows() -> anyhow::Result<()> {
    let _lock = init().lock();
    let connection = connection()?;
    connection.execute("CREATE TEMPORARY TABLE Empty (a INT)")?;

    let mut insert = connection.prepare("INSERT INTO Empty (a) VALUES (1)")?;
    // `next` executes the statement first, then reports the absence of a result set.
    assert!(!insert.next()?);
    assert_eq!(1, insert.rows_affected());
    assert_eq!(0, insert.column_count());
    Ok(())
}
