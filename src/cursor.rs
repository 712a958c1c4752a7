//! Blocking cursor adapter: statement execution and positional fetches.
//!
//! A cursor drives one statement at a time against its connection's driver
//! handle. Execution state (`description`, `rowcount`, `lastrowid`) lives on
//! the adapter and is refreshed from the driver after each execution; the
//! driver-side result stream sits behind an async mutex so operation
//! closures can own it across the bridge.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bridge;
use crate::connection::ConnectionInner;
use crate::error::{Error, Result};
use crate::params::{Positional, Row, Value};

/// Column metadata captured when a statement produces a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub decl_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unexecuted,
    Executed,
    Closed,
}

/// Driver-side result stream plus its exhaustion flag.
#[derive(Default)]
struct Stream {
    rows: Option<libsql::Rows>,
    exhausted: bool,
}

struct ExecOutcome {
    description: Option<Vec<Column>>,
    rowcount: i64,
    lastrowid: Option<i64>,
}

/// Blocking, DBAPI-shaped cursor over one driver connection.
pub struct Cursor {
    conn: Arc<ConnectionInner>,
    stream: Arc<Mutex<Stream>>,
    description: Option<Vec<Column>>,
    rowcount: i64,
    lastrowid: Option<i64>,
    arraysize: usize,
    phase: Phase,
}

fn is_dml(sql: &str) -> bool {
    let head = sql.trim_start();
    ["INSERT", "UPDATE", "DELETE", "REPLACE"]
        .iter()
        .any(|kw| head.get(..kw.len()).is_some_and(|p| p.eq_ignore_ascii_case(kw)))
}

fn describe(stmt: &libsql::Statement) -> Option<Vec<Column>> {
    let columns = stmt.columns();
    if columns.is_empty() {
        return None;
    }
    Some(
        columns
            .iter()
            .map(|c| Column {
                name: c.name().to_string(),
                decl_type: c.decl_type().map(str::to_string),
            })
            .collect(),
    )
}

/// Prepare and run one statement, replacing the cursor's result stream.
///
/// Row-returning statements leave `rowcount` at -1 (unknown); DML reports the
/// driver's change count. Under manual transaction control a DML statement
/// opens a transaction first if the driver is still in autocommit.
async fn run_statement(
    conn: &ConnectionInner,
    stream: &Mutex<Stream>,
    sql: &str,
    params: Positional,
) -> Result<ExecOutcome> {
    let guard = conn.handle.lock().await;
    let handle = guard.as_ref().ok_or(Error::Closed("connection"))?;
    if !conn.autocommit() && is_dml(sql) && handle.is_autocommit() {
        handle.execute("BEGIN", ()).await?;
    }
    let stmt = handle.prepare(sql).await?;
    let description = describe(&stmt);
    let mut stream = stream.lock().await;
    stream.exhausted = false;
    let rowcount = if stmt.column_count() > 0 {
        stream.rows = Some(stmt.query(params.into_params()).await?);
        -1
    } else {
        stmt.execute(params.into_params()).await?;
        stream.rows = None;
        handle.changes() as i64
    };
    Ok(ExecOutcome {
        description,
        rowcount,
        lastrowid: Some(handle.last_insert_rowid()),
    })
}

/// A cursor must stop working the moment its connection closes, even though
/// the result stream is driver state the cursor holds on its own.
async fn guard_connection(conn: &ConnectionInner) -> Result<()> {
    if conn.handle.lock().await.is_none() {
        return Err(Error::Closed("connection"));
    }
    Ok(())
}

async fn fetch_batch(stream: &mut Stream, limit: usize) -> Result<Vec<Row>> {
    let mut batch = Vec::new();
    if stream.exhausted {
        return Ok(batch);
    }
    let Some(rows) = stream.rows.as_mut() else {
        return Ok(batch);
    };
    let columns = rows.column_count();
    while batch.len() < limit {
        match rows.next().await? {
            Some(row) => {
                let mut values = Vec::with_capacity(columns as usize);
                for i in 0..columns {
                    values.push(Value::from(row.get_value(i)?));
                }
                batch.push(values);
            }
            None => {
                stream.exhausted = true;
                break;
            }
        }
    }
    Ok(batch)
}

impl Cursor {
    pub(crate) fn new(conn: Arc<ConnectionInner>) -> Cursor {
        Cursor {
            conn,
            stream: Arc::new(Mutex::new(Stream::default())),
            description: None,
            rowcount: -1,
            lastrowid: None,
            arraysize: 1,
            phase: Phase::Unexecuted,
        }
    }

    /// Execute one statement with positional parameters.
    ///
    /// Returns `&mut self` so a call can chain straight into a fetch.
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<&mut Self> {
        self.guard_open()?;
        let conn = self.conn.clone();
        let stream = self.stream.clone();
        let sql = sql.to_string();
        let params = Positional::convert(params);
        let outcome = bridge::run_sync(move || async move {
            run_statement(&conn, &stream, &sql, params).await
        })?;
        self.absorb(outcome);
        Ok(self)
    }

    /// Execute the statement once per parameter set, in order.
    ///
    /// `rowcount` aggregates the change counts across the whole batch;
    /// `lastrowid` reflects the final execution. The whole batch is one
    /// bridge round trip.
    pub fn executemany(&mut self, sql: &str, param_sets: &[Vec<Value>]) -> Result<&mut Self> {
        self.guard_open()?;
        let conn = self.conn.clone();
        let stream = self.stream.clone();
        let sql = sql.to_string();
        let sets: Vec<Positional> = param_sets
            .iter()
            .map(|set| Positional::convert(set))
            .collect();
        let outcome = bridge::run_sync(move || async move {
            let mut total = 0i64;
            let mut lastrowid = None;
            for params in sets {
                let one = run_statement(&conn, &stream, &sql, params).await?;
                total += one.rowcount.max(0);
                lastrowid = one.lastrowid;
            }
            Ok(ExecOutcome {
                description: None,
                rowcount: total,
                lastrowid,
            })
        })?;
        self.absorb(outcome);
        Ok(self)
    }

    /// Run a multi-statement script as one opaque unit of work.
    ///
    /// The script is handed to the driver verbatim; nothing is implicitly
    /// committed, so callers own the transaction boundary.
    pub fn executescript(&mut self, script: &str) -> Result<&mut Self> {
        self.guard_open()?;
        let conn = self.conn.clone();
        let stream = self.stream.clone();
        let script = script.to_string();
        bridge::run_sync(move || async move {
            let guard = conn.handle.lock().await;
            let handle = guard.as_ref().ok_or(Error::Closed("connection"))?;
            handle.execute_batch(&script).await?;
            let mut stream = stream.lock().await;
            stream.rows = None;
            stream.exhausted = false;
            Ok(())
        })?;
        self.description = None;
        self.rowcount = -1;
        self.lastrowid = None;
        self.phase = Phase::Executed;
        Ok(self)
    }

    /// The next row, or `None` once the result set is exhausted or when no
    /// statement has produced one. Neither empty case is an error.
    pub fn fetchone(&mut self) -> Result<Option<Row>> {
        self.guard_open()?;
        if self.phase != Phase::Executed {
            return Ok(None);
        }
        let conn = self.conn.clone();
        let stream = self.stream.clone();
        bridge::run_sync(move || async move {
            guard_connection(&conn).await?;
            let mut stream = stream.lock().await;
            let mut batch = fetch_batch(&mut stream, 1).await?;
            Ok(batch.pop())
        })
    }

    /// Up to `size` rows (default: the cursor's `arraysize`). Returns an
    /// empty vector, never `None`, once exhausted.
    pub fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        self.guard_open()?;
        if self.phase != Phase::Executed {
            return Ok(Vec::new());
        }
        let limit = size.unwrap_or(self.arraysize);
        let conn = self.conn.clone();
        let stream = self.stream.clone();
        bridge::run_sync(move || async move {
            guard_connection(&conn).await?;
            let mut stream = stream.lock().await;
            fetch_batch(&mut stream, limit).await
        })
    }

    /// All remaining rows.
    pub fn fetchall(&mut self) -> Result<Vec<Row>> {
        self.guard_open()?;
        if self.phase != Phase::Executed {
            return Ok(Vec::new());
        }
        let conn = self.conn.clone();
        let stream = self.stream.clone();
        bridge::run_sync(move || async move {
            guard_connection(&conn).await?;
            let mut stream = stream.lock().await;
            fetch_batch(&mut stream, usize::MAX).await
        })
    }

    /// Release the driver-side result stream. Closing twice is not an error.
    pub fn close(&mut self) -> Result<()> {
        if self.phase == Phase::Closed {
            return Ok(());
        }
        let stream = self.stream.clone();
        bridge::run_sync(move || async move {
            let mut stream = stream.lock().await;
            stream.rows = None;
            stream.exhausted = true;
            Ok(())
        })?;
        self.description = None;
        self.phase = Phase::Closed;
        Ok(())
    }

    /// Column metadata for the current result set; absent when the last
    /// statement returned no rows.
    pub fn description(&self) -> Option<&[Column]> {
        self.description.as_deref()
    }

    /// Rows affected by the last DML execution; -1 when unknown
    /// (row-returning statements, or nothing executed yet).
    pub fn rowcount(&self) -> i64 {
        self.rowcount
    }

    /// Rowid of the most recent successful insert on this connection.
    pub fn lastrowid(&self) -> Option<i64> {
        self.lastrowid
    }

    /// Default `fetchmany` batch size.
    pub fn arraysize(&self) -> usize {
        self.arraysize
    }

    /// Set the default `fetchmany` batch size. Zero is bumped to one.
    pub fn set_arraysize(&mut self, size: usize) {
        self.arraysize = size.max(1);
    }

    fn absorb(&mut self, outcome: ExecOutcome) {
        self.description = outcome.description;
        self.rowcount = outcome.rowcount;
        self.lastrowid = outcome.lastrowid;
        self.phase = Phase::Executed;
    }

    fn guard_open(&self) -> Result<()> {
        if self.phase == Phase::Closed {
            Err(Error::Closed("cursor"))
        } else {
            Ok(())
        }
    }
}

// The driver handle and result stream have no useful rendering; report the
// adapter-side state.
impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("description", &self.description)
            .field("rowcount", &self.rowcount)
            .field("lastrowid", &self.lastrowid)
            .field("arraysize", &self.arraysize)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

/// Single-pass, forward-only row iteration, equivalent to repeated
/// [`Cursor::fetchone`]. Exhaustion terminates the iterator; it never
/// restarts. A closed cursor yields nothing.
impl Iterator for Cursor {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.phase == Phase::Closed {
            return None;
        }
        self.fetchone().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dml_detection_ignores_case_and_whitespace() {
        assert!(is_dml("  insert into t values (1)"));
        assert!(is_dml("UPDATE t SET x = 1"));
        assert!(is_dml("\nDelete from t"));
        assert!(is_dml("REPLACE INTO t VALUES (1)"));
        assert!(!is_dml("SELECT * FROM t"));
        assert!(!is_dml("CREATE TABLE t (x)"));
        assert!(!is_dml(""));
    }
}
