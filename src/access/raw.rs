use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AccessError, Result};

/// Reserved key holding an explicitly supplied bearer token.
pub(crate) const AUTH_TOKEN_KEY: &str = "auth_token";
/// Reserved key holding the schema version stamp.
pub(crate) const VERSION_KEY: &str = "version";

/// Decoded identity service payload owned by a single access info.
///
/// Keys keep their decoded order. Callers get a read-only view; only the
/// version stamp and the bearer token override are ever written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawToken {
    inner: Map<String, Value>,
}

impl RawToken {
    pub fn new(inner: Map<String, Value>) -> Self {
        Self { inner }
    }

    /// Wrap a decoded value, which must be a JSON object.
    pub fn from_value(value: Value, envelope: &str) -> Result<Self> {
        match value {
            Value::Object(inner) => Ok(Self { inner }),
            _ => Err(AccessError::malformed(&[envelope])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Walk nested objects; `None` as soon as a key is missing.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.inner.get(*first)?, |value, key| value.get(*key))
    }

    /// True when every key along `path` exists, whatever the leaf value.
    pub fn has_path(&self, path: &[&str]) -> bool {
        self.lookup(path).is_some()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.inner
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.inner.clone())
    }

    /// String at `path`, treating a missing key, `null` or a non-string as absent.
    pub(crate) fn optional_str(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    /// Value at `path` that the schema requires.
    pub(crate) fn require(&self, path: &[&str]) -> Result<&Value> {
        self.lookup(path).ok_or_else(|| AccessError::malformed(path))
    }

    /// Required string at `path`.
    pub(crate) fn require_str(&self, path: &[&str]) -> Result<&str> {
        self.require(path)?
            .as_str()
            .ok_or_else(|| AccessError::malformed(path))
    }

    /// Required object at `path`.
    pub(crate) fn require_object(&self, path: &[&str]) -> Result<&Map<String, Value>> {
        self.require(path)?
            .as_object()
            .ok_or_else(|| AccessError::malformed(path))
    }

    /// String element `index` of the array at `path`.
    pub(crate) fn str_at_index(&self, path: &[&str], index: usize) -> Option<&str> {
        self.lookup(path)
            .and_then(Value::as_array)
            .and_then(|items| items.get(index))
            .and_then(Value::as_str)
    }

    pub(crate) fn insert(&mut self, key: &str, value: Value) {
        self.inner.insert(key.to_owned(), value);
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Value> {
        self.inner.shift_remove(key)
    }
}

/// Whether a value counts as populated: non-empty containers and strings,
/// non-zero numbers, `true`.
pub(crate) fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Optional string field of a nested object that the schema requires once the
/// object exists: missing key or non-string fails, `null` reads as absent.
pub(crate) fn nested_str<'a>(
    value: &'a Value,
    field: &str,
    path: &[&str],
) -> Result<Option<&'a str>> {
    match value.get(field) {
        Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        _ => {
            let mut full = path.to_vec();
            full.push(field);
            Err(AccessError::malformed(&full))
        }
    }
}
