use libsql_blocking::prelude::*;

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

fn five_rows() -> std::result::Result<Connection, Error> {
    let conn = connect(":memory:")?;
    conn.execute("CREATE TABLE t (x INTEGER)", &[])?;
    let sets: Vec<Vec<Value>> = (0..5).map(|x| vec![Value::Integer(x)]).collect();
    conn.executemany("INSERT INTO t VALUES (?)", &sets)?;
    Ok(conn)
}

#[test]
fn test02_cursor_debug_reports_adapter_state() -> TestResult {
    let conn = connect(":memory:")?;
    conn.execute("CREATE TABLE t (x INTEGER)", &[])?;
    let cursor = conn.execute("INSERT INTO t VALUES (1)", &[])?;
    let rendered = format!("{cursor:?}");
    assert!(rendered.contains("rowcount: 1"), "{rendered}");
    assert!(rendered.contains("Executed"), "{rendered}");
    Ok(())
}

#[test]
fn test02_fetchmany_batches_cover_rows_in_order() -> TestResult {
    let conn = five_rows()?;
    let mut cursor = conn.execute("SELECT x FROM t ORDER BY x", &[])?;

    let first = cursor.fetchmany(Some(2))?;
    let second = cursor.fetchmany(Some(2))?;
    let third = cursor.fetchmany(Some(2))?;
    let fourth = cursor.fetchmany(Some(2))?;

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(third.len(), 1);
    assert!(fourth.is_empty());

    let all: Vec<Value> = first
        .into_iter()
        .chain(second)
        .chain(third)
        .map(|mut row| row.remove(0))
        .collect();
    let expected: Vec<Value> = (0..5).map(Value::Integer).collect();
    assert_eq!(all, expected);
    Ok(())
}

#[test]
fn test02_exhaustion_is_stable() -> TestResult {
    let conn = five_rows()?;
    let mut cursor = conn.execute("SELECT x FROM t", &[])?;
    assert_eq!(cursor.fetchall()?.len(), 5);

    // Exhausted: fetchone yields the null sentinel, fetchmany an empty batch,
    // for any requested size.
    assert!(cursor.fetchone()?.is_none());
    assert!(cursor.fetchmany(Some(1))?.is_empty());
    assert!(cursor.fetchmany(Some(100))?.is_empty());
    assert!(cursor.fetchall()?.is_empty());
    Ok(())
}

#[test]
fn test02_fetch_before_execute_returns_empty() -> TestResult {
    let conn = connect(":memory:")?;
    let mut cursor = conn.cursor();
    assert!(cursor.fetchone()?.is_none());
    assert!(cursor.fetchmany(Some(3))?.is_empty());
    assert!(cursor.fetchall()?.is_empty());
    assert_eq!(cursor.rowcount(), -1);
    assert!(cursor.lastrowid().is_none());
    assert!(cursor.description().is_none());
    Ok(())
}

#[test]
fn test02_arraysize_drives_default_batch() -> TestResult {
    let conn = five_rows()?;
    let mut cursor = conn.execute("SELECT x FROM t ORDER BY x", &[])?;
    assert_eq!(cursor.arraysize(), 1);
    assert_eq!(cursor.fetchmany(None)?.len(), 1);

    cursor.set_arraysize(3);
    assert_eq!(cursor.fetchmany(None)?.len(), 3);
    assert_eq!(cursor.fetchmany(None)?.len(), 1);
    Ok(())
}

#[test]
fn test02_iteration_is_single_pass() -> TestResult {
    let conn = five_rows()?;
    let cursor = conn.execute("SELECT x FROM t ORDER BY x", &[])?;

    let rows: std::result::Result<Vec<Row>, Error> = cursor.collect();
    let rows = rows?;
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0], vec![Value::Integer(0)]);
    assert_eq!(rows[4], vec![Value::Integer(4)]);
    Ok(())
}

#[test]
fn test02_execute_chains_into_fetch() -> TestResult {
    let conn = five_rows()?;
    let mut cursor = conn.cursor();
    let row = cursor
        .execute("SELECT COUNT(*) FROM t", &[])?
        .fetchone()?
        .expect("count row");
    assert_eq!(row, vec![Value::Integer(5)]);
    Ok(())
}

#[test]
fn test02_reexecute_resets_the_result_set() -> TestResult {
    let conn = five_rows()?;
    let mut cursor = conn.cursor();
    cursor.execute("SELECT x FROM t WHERE x < ?", &[Value::Integer(2)])?;
    assert_eq!(cursor.fetchall()?.len(), 2);

    cursor.execute("SELECT x FROM t WHERE x >= ?", &[Value::Integer(2)])?;
    assert_eq!(cursor.fetchall()?.len(), 3);
    Ok(())
}
