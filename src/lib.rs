//! Blocking DBAPI-shaped adapters over the async libsql driver.
//!
//! libsql's native interface is entirely asynchronous. Callers that only
//! speak the classic blocking contract (connect, execute, fetch, commit) go
//! through three pieces:
//!
//! - [`bridge`]: runs one asynchronous driver operation to completion from a
//!   synchronous call site, whether or not that call site is already inside
//!   a tokio runtime.
//! - [`Connection`] / [`Cursor`]: stateful adapters that drive exactly one
//!   driver connection through the bridge and maintain DBAPI-style state
//!   (`description`, `rowcount`, `lastrowid`, fetch position).
//! - [`dialect`]: module constants and connection-URL translation for
//!   generic relational toolkits.
//!
//! Operations issued sequentially against one adapter execute in order.
//! Adapters on different connections are fully independent; concurrent use
//! of a single adapter from several threads needs external serialization,
//! which the `&mut self` fetch/execute surface enforces at compile time.
//!
//! ```no_run
//! use libsql_blocking::{Value, connect};
//!
//! fn main() -> libsql_blocking::Result<()> {
//!     let conn = connect(":memory:")?;
//!     conn.execute("CREATE TABLE t (x INTEGER)", &[])?;
//!     conn.execute("INSERT INTO t VALUES (?)", &[Value::Integer(7)])?;
//!     let mut cursor = conn.execute("SELECT x FROM t", &[])?;
//!     assert_eq!(cursor.fetchone()?, Some(vec![Value::Integer(7)]));
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod connection;
pub mod cursor;
pub mod dialect;
mod error;
pub mod params;
pub mod prelude;

pub use connection::{ConnectOptions, Connection, TransactionControl, connect};
pub use cursor::{Column, Cursor};
pub use error::{Error, Result};
/// The driver's own error type, re-exported rather than redefined; it is
/// what [`Error::Driver`] carries.
pub use libsql::Error as DriverError;
pub use params::{Row, Value};
