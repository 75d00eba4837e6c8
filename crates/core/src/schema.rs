// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Column type tree. `List` nests arbitrarily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Untyped missing data. Renders as `Undefined`, has no columnar
    /// interchange representation.
    Undefined,
    Bool,
    Int64,
    Float64,
    Utf8,
    List(Box<ColumnType>),
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Undefined => f.write_str("Undefined"),
            ColumnType::Bool => f.write_str("Bool"),
            ColumnType::Int64 => f.write_str("Int64"),
            ColumnType::Float64 => f.write_str("Float64"),
            ColumnType::Utf8 => f.write_str("Utf8"),
            ColumnType::List(inner) => write!(f, "List<{}>", inner),
        }
    }
}

/// One column of a batch schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: ColumnType, nullable: bool) -> Self {
        Self { name: name.into(), ty, nullable }
    }
}

pub type SchemaRef = Arc<BatchSchema>;

/// Ordered column layout shared by every batch a task produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSchema {
    pub fields: Vec<FieldDef>,
}

impl BatchSchema {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_display() {
        assert_eq!(ColumnType::Int64.to_string(), "Int64");
        assert_eq!(
            ColumnType::List(Box::new(ColumnType::Utf8)).to_string(),
            "List<Utf8>"
        );
    }

    #[test]
    fn test_index_of() {
        let schema = BatchSchema::new(vec![
            FieldDef::new("id", ColumnType::Int64, false),
            FieldDef::new("name", ColumnType::Utf8, true),
        ]);
        assert_eq!(schema.index_of("name"), Some(1));
        assert_eq!(schema.index_of("missing"), None);
    }
}
