//! Module-level constants and connection-URL translation for generic
//! relational toolkits.
//!
//! A toolkit that routes by URL scheme registers this dialect once, then
//! translates URLs of the form `libsql:///path/to.db?timeout=2.5` into
//! [`ConnectOptions`]. Registration is explicit process-wide state with an
//! init-once contract: the second and later calls are no-ops.

use std::sync::OnceLock;
use std::time::Duration;

use url::Url;

use crate::connection::{ConnectOptions, Connection};
use crate::error::{Error, Result};

/// Positional `?` placeholders only.
pub const PARAMSTYLE: &str = "qmark";
/// DBAPI compatibility level of the blocking surface.
pub const API_LEVEL: &str = "2.0";
/// Threads may share the module but not a connection; the bridge provides
/// the only cross-thread serialization.
pub const THREAD_SAFETY: u8 = 1;
/// SQLite core embedded by the driver.
pub const SQLITE_VERSION_INFO: (u16, u16, u16) = (3, 42, 0);
/// Version marker reported to toolkits.
pub const DRIVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// URL scheme this dialect answers to.
pub const SCHEME: &str = "libsql";

/// Descriptor consumed by a URL-routing toolkit: scheme recognition plus
/// URL-to-options translation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dialect;

impl Dialect {
    /// Translate a connection URL into connect options.
    ///
    /// The path segment is the database location; an empty path means
    /// `:memory:`, and a host form (`libsql://host/...`) addresses a remote
    /// database over the driver's own protocol. Recognized query parameters
    /// are `timeout` (float seconds), `auth_token`, `sync_url`, and
    /// `encryption_key`; anything else is silently dropped rather than
    /// erroring. That includes sqlite3's `check_same_thread`, which has no
    /// meaning here: the bridge supplies the only serialization needed.
    pub fn connect_args(&self, url: &str) -> Result<ConnectOptions> {
        let parsed = Url::parse(url).map_err(|e| Error::Url(e.to_string()))?;
        if parsed.scheme() != SCHEME {
            return Err(Error::Url(format!(
                "unsupported scheme `{}`",
                parsed.scheme()
            )));
        }
        let mut options = ConnectOptions::new(database_from(&parsed));
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "timeout" => {
                    let seconds: f64 = value.parse().map_err(|_| {
                        Error::Url(format!("timeout must be seconds, got `{value}`"))
                    })?;
                    let timeout = Duration::try_from_secs_f64(seconds).map_err(|_| {
                        Error::Url(format!("timeout out of range: `{value}`"))
                    })?;
                    options = options.timeout(timeout);
                }
                "auth_token" => options = options.auth_token(value.as_ref()),
                "sync_url" => options = options.sync_url(value.as_ref()),
                "encryption_key" => options = options.encryption_key(value.as_ref()),
                other => {
                    tracing::debug!(option = other, "ignoring unrecognized URL option");
                }
            }
        }
        Ok(options)
    }
}

fn database_from(url: &Url) -> String {
    let path = url.path();
    let database = match url.host_str() {
        Some(host) if !host.is_empty() => {
            // Host form: hand the driver back a remote URL.
            let mut remote = format!("{SCHEME}://{host}");
            if let Some(port) = url.port() {
                remote.push_str(&format!(":{port}"));
            }
            remote.push_str(path);
            remote
        }
        _ => path.strip_prefix('/').unwrap_or(path).to_string(),
    };
    if database.is_empty() {
        ":memory:".to_string()
    } else {
        database
    }
}

/// Parse `url` through the dialect and open a blocking connection.
pub fn connect_url(url: &str) -> Result<Connection> {
    Dialect.connect_args(url)?.connect()
}

static REGISTRY: OnceLock<Dialect> = OnceLock::new();

/// Register the dialect process-wide. The first call wins and returns
/// `true`; every later call is a no-op returning `false`.
pub fn register() -> bool {
    let mut first = false;
    REGISTRY.get_or_init(|| {
        first = true;
        Dialect
    });
    first
}

/// Whether [`register`] has run in this process.
pub fn registered() -> bool {
    REGISTRY.get().is_some()
}

/// Look up the registered dialect for a scheme.
pub fn lookup(scheme: &str) -> Option<&'static Dialect> {
    if scheme == SCHEME { REGISTRY.get() } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_url_maps_to_relative_path() {
        let options = Dialect.connect_args("libsql:///data.db").unwrap();
        assert_eq!(options.database, "data.db");
    }

    #[test]
    fn empty_path_means_memory() {
        let options = Dialect.connect_args("libsql:///").unwrap();
        assert_eq!(options.database, ":memory:");
    }

    #[test]
    fn host_form_stays_remote() {
        let options = Dialect
            .connect_args("libsql://db.example.com?auth_token=tok")
            .unwrap();
        assert_eq!(options.database, "libsql://db.example.com");
        assert_eq!(options.auth_token.as_deref(), Some("tok"));
    }

    #[test]
    fn recognized_options_are_parsed() {
        let options = Dialect
            .connect_args(
                "libsql:///app.db?timeout=2.5&auth_token=t&sync_url=https://r.example&encryption_key=k",
            )
            .unwrap();
        assert_eq!(options.database, "app.db");
        assert_eq!(options.timeout, Duration::from_secs_f64(2.5));
        assert_eq!(options.auth_token.as_deref(), Some("t"));
        assert_eq!(options.sync_url.as_deref(), Some("https://r.example"));
        assert_eq!(options.encryption_key.as_deref(), Some("k"));
    }

    #[test]
    fn unrecognized_options_are_dropped() {
        let options = Dialect
            .connect_args("libsql:///app.db?check_same_thread=true&mystery=1")
            .unwrap();
        assert_eq!(options.database, "app.db");
        assert!(options.auth_token.is_none());
    }

    #[test]
    fn bad_timeout_is_a_url_error() {
        let err = Dialect
            .connect_args("libsql:///app.db?timeout=soon")
            .unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }

    #[test]
    fn out_of_range_timeout_is_a_url_error() {
        for url in [
            "libsql:///app.db?timeout=-1",
            "libsql:///app.db?timeout=NaN",
            "libsql:///app.db?timeout=1e300",
        ] {
            let err = Dialect.connect_args(url).unwrap_err();
            assert!(matches!(err, Error::Url(_)), "{url}");
        }
    }

    #[test]
    fn wrong_scheme_is_rejected() {
        let err = Dialect.connect_args("postgres://x/y").unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }
}
