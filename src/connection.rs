//! Blocking connection adapter and the connect factory.
//!
//! A [`Connection`] wraps exactly one driver connection. Nothing else may
//! drive that handle once wrapped; cursors created from the connection share
//! it behind a lock and every operation goes through the bridge.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::bridge;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::params::Value;

/// How the adapter manages transactions around DML statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionControl {
    /// Autocommit exactly when no isolation level is configured.
    #[default]
    Legacy,
    /// Every statement commits on its own; `commit`/`rollback` are no-ops.
    Autocommit,
    /// DML implicitly opens a transaction; the caller commits.
    Manual,
}

impl TransactionControl {
    fn autocommit(self, isolation_level: Option<&str>) -> bool {
        match self {
            TransactionControl::Legacy => isolation_level.is_none(),
            TransactionControl::Autocommit => true,
            TransactionControl::Manual => false,
        }
    }
}

/// Arguments for opening a database, in builder form.
///
/// Defaults match the classic embedded-database contract: in-memory
/// database, 5 second busy timeout, `DEFERRED` isolation.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Database location: a file path, `:memory:`, or a `libsql://` /
    /// `http(s)://` URL for a remote database.
    pub database: String,
    /// Driver busy timeout.
    pub timeout: Duration,
    /// Transaction mode name, or `None` for autocommit under
    /// [`TransactionControl::Legacy`].
    pub isolation_level: Option<String>,
    /// Credential for remote or synced databases.
    pub auth_token: Option<String>,
    /// Remote endpoint an embedded replica synchronizes with.
    pub sync_url: Option<String>,
    /// Periodic background sync for embedded replicas.
    pub sync_interval: Option<Duration>,
    /// Key material for encrypted local databases.
    pub encryption_key: Option<String>,
    /// Transaction management policy.
    pub transaction_control: TransactionControl,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions::new(":memory:")
    }
}

impl ConnectOptions {
    pub fn new(database: impl Into<String>) -> Self {
        ConnectOptions {
            database: database.into(),
            timeout: Duration::from_secs(5),
            isolation_level: Some("DEFERRED".to_string()),
            auth_token: None,
            sync_url: None,
            sync_interval: None,
            encryption_key: None,
            transaction_control: TransactionControl::Legacy,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn isolation_level(mut self, level: Option<String>) -> Self {
        self.isolation_level = level;
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn sync_url(mut self, url: impl Into<String>) -> Self {
        self.sync_url = Some(url.into());
        self
    }

    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    pub fn encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    pub fn transaction_control(mut self, mode: TransactionControl) -> Self {
        self.transaction_control = mode;
        self
    }

    /// Open the database and wrap the driver connection (blocking).
    pub fn connect(self) -> Result<Connection> {
        Connection::establish(self)
    }
}

/// Open a database with default options (blocking).
pub fn connect(database: impl Into<String>) -> Result<Connection> {
    ConnectOptions::new(database).connect()
}

/// Shared state between a connection and its cursors.
///
/// `handle` holds `None` once the connection is closed; every operation that
/// reaches for the driver afterwards fails with a closed-resource error.
pub(crate) struct ConnectionInner {
    // Keeps replication machinery alive for the lifetime of the connection.
    db: libsql::Database,
    pub(crate) handle: Mutex<Option<libsql::Connection>>,
    pub(crate) isolation_level: Option<String>,
    pub(crate) transaction_control: TransactionControl,
}

impl ConnectionInner {
    pub(crate) fn autocommit(&self) -> bool {
        self.transaction_control
            .autocommit(self.isolation_level.as_deref())
    }
}

fn is_remote_path(path: &str) -> bool {
    path.starts_with("libsql://") || path.starts_with("http://") || path.starts_with("https://")
}

async fn open_database(options: ConnectOptions) -> Result<(libsql::Database, libsql::Connection)> {
    let db = if is_remote_path(&options.database) {
        libsql::Builder::new_remote(
            options.database.clone(),
            options.auth_token.clone().unwrap_or_default(),
        )
        .build()
        .await?
    } else if let Some(sync_url) = options.sync_url.clone() {
        let mut builder = libsql::Builder::new_remote_replica(
            options.database.clone(),
            sync_url,
            options.auth_token.clone().unwrap_or_default(),
        );
        if let Some(interval) = options.sync_interval {
            builder = builder.sync_interval(interval);
        }
        builder.build().await?
    } else {
        #[cfg_attr(not(feature = "encryption"), allow(unused_mut))]
        let mut builder = libsql::Builder::new_local(&options.database);
        #[cfg(feature = "encryption")]
        if let Some(key) = options.encryption_key.clone() {
            let config = libsql::EncryptionConfig::new(libsql::Cipher::default(), key.into());
            builder = builder.encryption_config(config);
        }
        builder.build().await?
    };
    let conn = db.connect()?;
    conn.busy_timeout(options.timeout)?;
    Ok((db, conn))
}

/// Blocking adapter around one exclusively-owned driver connection.
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    fn establish(options: ConnectOptions) -> Result<Connection> {
        if options.encryption_key.is_some() && options.sync_url.is_some() {
            return Err(Error::Config(
                "encryption is not supported for synced databases".into(),
            ));
        }
        #[cfg(not(feature = "encryption"))]
        if options.encryption_key.is_some() {
            return Err(Error::Config(
                "encryption_key requires the `encryption` feature".into(),
            ));
        }
        tracing::debug!(database = %options.database, "opening database");
        let isolation_level = options.isolation_level.clone();
        let transaction_control = options.transaction_control;
        let (db, conn) = bridge::run_sync(move || open_database(options))?;
        Ok(Connection {
            inner: Arc::new(ConnectionInner {
                db,
                handle: Mutex::new(Some(conn)),
                isolation_level,
                transaction_control,
            }),
        })
    }

    /// Construct a new cursor bound to this connection. No statement runs.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.inner.clone())
    }

    /// Convenience: create a cursor and execute `sql` on it.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<Cursor> {
        let mut cursor = self.cursor();
        cursor.execute(sql, params)?;
        Ok(cursor)
    }

    /// Convenience: create a cursor and run `sql` once per parameter set.
    pub fn executemany(&self, sql: &str, param_sets: &[Vec<Value>]) -> Result<Cursor> {
        let mut cursor = self.cursor();
        cursor.executemany(sql, param_sets)?;
        Ok(cursor)
    }

    /// Convenience: create a cursor and run a multi-statement script on it.
    pub fn executescript(&self, script: &str) -> Result<Cursor> {
        let mut cursor = self.cursor();
        cursor.executescript(script)?;
        Ok(cursor)
    }

    /// Commit the open transaction, if any.
    pub fn commit(&self) -> Result<()> {
        let inner = self.inner.clone();
        bridge::run_sync(move || async move {
            let guard = inner.handle.lock().await;
            let conn = guard.as_ref().ok_or(Error::Closed("connection"))?;
            if !conn.is_autocommit() {
                conn.execute("COMMIT", ()).await?;
            }
            Ok(())
        })
    }

    /// Roll back the open transaction, if any.
    pub fn rollback(&self) -> Result<()> {
        let inner = self.inner.clone();
        bridge::run_sync(move || async move {
            let guard = inner.handle.lock().await;
            let conn = guard.as_ref().ok_or(Error::Closed("connection"))?;
            if !conn.is_autocommit() {
                conn.execute("ROLLBACK", ()).await?;
            }
            Ok(())
        })
    }

    /// Synchronize an embedded replica with its remote endpoint.
    ///
    /// Meaningful when the connection was opened with a `sync_url`.
    pub fn sync(&self) -> Result<()> {
        let inner = self.inner.clone();
        bridge::run_sync(move || async move {
            let guard = inner.handle.lock().await;
            if guard.is_none() {
                return Err(Error::Closed("connection"));
            }
            inner.db.sync().await?;
            Ok(())
        })
    }

    /// Close the connection. Idempotent. Afterwards every operation on this
    /// adapter or any cursor derived from it fails with a closed-resource
    /// error.
    pub fn close(&self) -> Result<()> {
        let inner = self.inner.clone();
        bridge::run_sync(move || async move {
            drop(inner.handle.lock().await.take());
            Ok(())
        })
    }

    /// The configured transaction mode, if any.
    pub fn isolation_level(&self) -> Option<&str> {
        self.inner.isolation_level.as_deref()
    }

    /// Whether the driver currently has a transaction open. A pure
    /// passthrough of the driver's autocommit flag, read live; nothing is
    /// cached adapter-side, so under [`TransactionControl::Manual`] this
    /// stays `false` until a DML statement opens a transaction.
    pub fn in_transaction(&self) -> Result<bool> {
        let inner = self.inner.clone();
        bridge::run_sync(move || async move {
            let guard = inner.handle.lock().await;
            let conn = guard.as_ref().ok_or(Error::Closed("connection"))?;
            Ok(!conn.is_autocommit())
        })
    }
}

// The driver handle carries no useful rendering; report the configuration.
impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("isolation_level", &self.inner.isolation_level)
            .field("transaction_control", &self.inner.transaction_control)
            .finish_non_exhaustive()
    }
}
