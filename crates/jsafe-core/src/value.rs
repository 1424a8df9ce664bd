//! One node of a JSON tree: [`Kind`] and [`Value`].

use std::fmt;

use crate::store::{ArrayStore, ObjectStore};
use crate::text::Text;

/// The six JSON kinds. A value's kind is fixed when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Number,
    Text,
    Object,
    Array,
}

impl Kind {
    pub fn is_container(self) -> bool {
        matches!(self, Kind::Object | Kind::Array)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Number => "number",
            Kind::Text => "string",
            Kind::Object => "object",
            Kind::Array => "array",
        })
    }
}

/// Payload of a node. Containers hold the ids of the children they own.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// IEEE-754 double; there is no separate integer kind.
    Number(f64),
    Text(Text),
    Object(ObjectStore),
    Array(ArrayStore),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::Text(_) => Kind::Text,
            Value::Object(_) => Kind::Object,
            Value::Array(_) => Kind::Array,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectStore> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayStore> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Number of direct children, or `None` for scalars.
    pub fn child_count(&self) -> Option<usize> {
        match self {
            Value::Object(obj) => Some(obj.len()),
            Value::Array(arr) => Some(arr.len()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Text> for Value {
    fn from(text: Text) -> Self {
        Value::Text(text)
    }
}
