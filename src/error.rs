use thiserror::Error;

/// Errors surfaced by the blocking adapters.
///
/// Driver errors cross the bridge unchanged in type and message. Everything
/// else originates in this crate and carries its own category, so a failed
/// statement is distinguishable from a failed scheduler or a misused handle.
#[derive(Debug, Error)]
pub enum Error {
    /// Error raised by the libsql driver, forwarded as-is.
    #[error(transparent)]
    Driver(#[from] libsql::Error),

    /// The bridge could not create or reach a scheduler. Retrying the same
    /// call cannot succeed without an environment change.
    #[error("bridge scheduling error: {0}")]
    Bridge(String),

    /// Operation on a closed connection or cursor.
    #[error("{0} is closed")]
    Closed(&'static str),

    /// A connection URL could not be translated into connect arguments.
    #[error("invalid connection URL: {0}")]
    Url(String),

    /// Invalid option combination at connect time.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
