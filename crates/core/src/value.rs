// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// A single materialized cell value.
///
/// Batches store cells column-oriented in arena buffers; `Value` is the
/// boxed form used by the plan document, the expression evaluator and row
/// rendering. `Undefined` is the engine's untyped missing value and is
/// distinct from a typed null.
///
/// Externally tagged on the wire so the same derive serves both the text
/// (serde_json) and binary (postcard) plan formats; postcard cannot
/// deserialize self-describing representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Undefined,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    List(Vec<Value>),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// The column type this value naturally belongs to.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Undefined => ColumnType::Undefined,
            Value::Bool(_) => ColumnType::Bool,
            Value::Int64(_) => ColumnType::Int64,
            Value::Float64(_) => ColumnType::Float64,
            Value::Utf8(_) => ColumnType::Utf8,
            Value::List(items) => {
                let inner = items
                    .iter()
                    .find(|v| !v.is_undefined())
                    .map(Value::column_type)
                    .unwrap_or(ColumnType::Undefined);
                ColumnType::List(Box::new(inner))
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Utf8(v) => f.write_str(v),
            Value::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::Undefined.to_string(), "Undefined");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int64(-42).to_string(), "-42");
        assert_eq!(Value::Float64(1.5).to_string(), "1.5");
        assert_eq!(Value::Utf8("abc".into()).to_string(), "abc");
    }

    #[test]
    fn test_display_list_recurses() {
        let value = Value::List(vec![
            Value::Int64(1),
            Value::List(vec![Value::Int64(2), Value::Undefined]),
        ]);
        assert_eq!(value.to_string(), "[1, [2, Undefined]]");
    }

    #[test]
    fn test_column_type_of_list_skips_undefined() {
        let value = Value::List(vec![Value::Undefined, Value::Int64(3)]);
        assert_eq!(value.column_type(), ColumnType::List(Box::new(ColumnType::Int64)));
    }
}
