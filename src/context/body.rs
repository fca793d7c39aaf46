use serde::Serialize;
use serde_json::Value;

use crate::logger;

/// What a handler returns
///
/// `Text` is sent as is, `Json` is pretty-printed with two-space indentation
/// and `Empty` keeps whatever the `Reply` accumulated through `json()`/`html()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Json(Value),
}

impl Body {
    /// Serialize any value into a `Json` body
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Self::Json(value),
            Err(e) => {
                logger::log_error(&format!("Failed to serialize handler result: {e}"));
                Self::Empty
            }
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<()> for Body {
    fn from((): ()) -> Self {
        Self::Empty
    }
}
