use std::fmt;

use serde::{Deserialize, Serialize};

/// A value held by a [`StateStore`](super::StateStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl StateValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            StateValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Floats as-is, integers widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            StateValue::Float(value) => Some(*value),
            StateValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(value) => write!(f, "{}", value),
            StateValue::Int(value) => write!(f, "{}", value),
            StateValue::Float(value) => write!(f, "{}", value),
            StateValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Bool(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        StateValue::Int(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        StateValue::Int(value.into())
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        StateValue::Float(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        StateValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        assert_eq!(StateValue::from(true).as_bool(), Some(true));
        assert_eq!(StateValue::from(3).as_int(), Some(3));
        assert_eq!(StateValue::from(3).as_float(), Some(3.0));
        assert_eq!(StateValue::from(1.5).as_int(), None);
        assert_eq!(StateValue::from("Gameplay").as_text(), Some("Gameplay"));
        assert_eq!(StateValue::from("x").as_bool(), None);
    }

    #[test]
    fn display() {
        assert_eq!(StateValue::from(42).to_string(), "42");
        assert_eq!(StateValue::from("Pause").to_string(), "Pause");
    }
}
