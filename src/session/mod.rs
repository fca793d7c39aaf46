//! Session module
//!
//! A session is a JSON object carried in the `session` cookie, encrypted with
//! the configured secret. Anything that cannot be decoded is an empty session.

pub mod codec;

pub use codec::{generate_secret, CodecError, SessionKey};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Name of the cookie carrying the encrypted session
pub const SESSION_COOKIE: &str = "session";

/// Entries keep their insertion order, so a session that is only read
/// re-encodes to the cookie it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    data: Map<String, Value>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an incoming cookie value.
    ///
    /// Missing cookie, missing key, bad hex, bad padding, bad UTF-8 and
    /// anything that is not a JSON object all yield an empty session.
    pub fn from_cookie(value: Option<&str>, key: Option<&SessionKey>) -> Self {
        let (Some(value), Some(key)) = (value, key) else {
            return Self::new();
        };
        let Ok(plaintext) = key.decrypt(value) else {
            return Self::new();
        };
        match serde_json::from_str::<Value>(&plaintext) {
            Ok(Value::Object(data)) => Self { data },
            _ => Self::new(),
        }
    }

    /// Encrypt the session as an outgoing cookie value
    pub fn to_cookie_value(&self, key: &SessionKey) -> Result<String, CodecError> {
        key.encrypt(&Value::Object(self.data.clone()).to_string())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Typed read; `None` if missing or of a different shape
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Store any serializable value
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.data.insert(key.into(), value);
        Ok(())
    }

    /// Remove an entry, keeping the order of the others
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Drop every entry; the response will then delete the session cookie
    pub fn destroy(&mut self) {
        self.data.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }
}
