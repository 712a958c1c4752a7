use libsql_blocking::prelude::*;

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

#[test]
fn test06_module_constants() {
    assert_eq!(dialect::PARAMSTYLE, "qmark");
    assert_eq!(dialect::API_LEVEL, "2.0");
    assert_eq!(dialect::THREAD_SAFETY, 1);
    assert_eq!(dialect::SQLITE_VERSION_INFO.0, 3);
    assert!(!dialect::DRIVER_VERSION.is_empty());
}

#[test]
fn test06_register_is_init_once() {
    let first = dialect::register();
    let second = dialect::register();
    // Exactly one call in the whole process wins; repeats are no-ops.
    assert!(!second);
    let _ = first;
    assert!(dialect::registered());
    assert!(dialect::lookup(dialect::SCHEME).is_some());
    assert!(dialect::lookup("postgres").is_none());
}

#[test]
fn test06_url_options_reach_the_connection() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("test06.db");
    let url = format!(
        "libsql:///{}?timeout=1.5&check_same_thread=true",
        path.to_string_lossy()
    );

    let conn = connect_url(&url)?;
    conn.execute("CREATE TABLE t (x INTEGER)", &[])?;
    conn.execute("INSERT INTO t VALUES (1)", &[])?;
    let mut cursor = conn.execute("SELECT COUNT(*) FROM t", &[])?;
    assert_eq!(cursor.fetchone()?, Some(vec![Value::Integer(1)]));
    conn.close()?;
    Ok(())
}

#[test]
fn test06_memory_url_connects() -> TestResult {
    let conn = connect_url("libsql:///")?;
    let mut cursor = conn.execute("SELECT 1", &[])?;
    assert_eq!(cursor.fetchone()?, Some(vec![Value::Integer(1)]));
    Ok(())
}

#[test]
fn test06_malformed_urls_are_url_errors() {
    assert!(matches!(
        Dialect.connect_args("not a url"),
        Err(Error::Url(_))
    ));
    assert!(matches!(
        Dialect.connect_args("postgres://elsewhere/db"),
        Err(Error::Url(_))
    ));
    assert!(matches!(
        Dialect.connect_args("libsql:///x.db?timeout=abc"),
        Err(Error::Url(_))
    ));
}
