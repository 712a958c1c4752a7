//! Bound-parameter values and their conversion into driver parameters.
//!
//! Statements bind strictly positional (`?`) parameters; named placeholders
//! are not supported. A caller-supplied sequence is normalized into the
//! driver's positional form before it crosses the bridge.

/// A single bound or fetched value, mirroring the driver's value domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// One result row, values in column order.
pub type Row = Vec<Value>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(v) = self { Some(*v) } else { None }
    }

    pub fn as_real(&self) -> Option<f64> {
        if let Value::Real(v) = self { Some(*v) } else { None }
    }

    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(v) = self { Some(v) } else { None }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        if let Value::Blob(v) = self { Some(v) } else { None }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

/// Timestamps bind as TEXT in the driver's canonical format.
impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Text(v.format("%F %T%.f").to_string())
    }
}

/// JSON binds as its TEXT rendering.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl From<Value> for libsql::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => libsql::Value::Null,
            Value::Integer(i) => libsql::Value::Integer(i),
            Value::Real(f) => libsql::Value::Real(f),
            Value::Text(s) => libsql::Value::Text(s),
            Value::Blob(b) => libsql::Value::Blob(b),
        }
    }
}

impl From<libsql::Value> for Value {
    fn from(v: libsql::Value) -> Self {
        match v {
            libsql::Value::Null => Value::Null,
            libsql::Value::Integer(i) => Value::Integer(i),
            libsql::Value::Real(f) => Value::Real(f),
            libsql::Value::Text(s) => Value::Text(s),
            libsql::Value::Blob(b) => Value::Blob(b),
        }
    }
}

/// Container for driver-ready positional parameters.
pub(crate) struct Positional(Vec<libsql::Value>);

impl Positional {
    /// Normalize a caller-supplied ordered sequence into driver parameters.
    pub(crate) fn convert(params: &[Value]) -> Positional {
        Positional(params.iter().cloned().map(libsql::Value::from).collect())
    }

    pub(crate) fn into_params(self) -> libsql::params::Params {
        if self.0.is_empty() {
            libsql::params::Params::None
        } else {
            libsql::params::Params::Positional(self.0)
        }
    }
}
