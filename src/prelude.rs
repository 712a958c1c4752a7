//! Convenient imports for common functionality.

pub use crate::connection::{ConnectOptions, Connection, TransactionControl, connect};
pub use crate::cursor::{Column, Cursor};
pub use crate::dialect::{self, Dialect, connect_url};
pub use crate::error::{Error, Result};
pub use crate::params::{Row, Value};
pub use crate::DriverError;
