// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! In-memory form of a plan document.
//!
//! Every enum here keeps serde's external tagging. The binary wire format
//! is postcard, which cannot decode untagged or internally tagged enums,
//! and both formats must describe the same document.

use std::path::PathBuf;

use quiver_core::{FieldDef, Value};
use quiver_engine::{Expr, MapColumn, ScanFormat};
use serde::{Deserialize, Serialize};

/// Current document version. Loaders reject anything newer.
pub const PLAN_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    pub root: PlanNode,
}

fn default_version() -> u32 {
    PLAN_VERSION
}

impl PlanDocument {
    pub fn new(root: PlanNode) -> Self {
        Self { version: PLAN_VERSION, root }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanNode {
    /// Inline rows, mostly for tests and demos.
    Values { schema: Vec<FieldDef>, rows: Vec<Vec<Value>> },
    /// File scan; each path becomes one split for the scan operator.
    Scan { schema: Vec<FieldDef>, paths: Vec<PathBuf>, format: ScanFormat },
    Filter { input: Box<PlanNode>, predicate: Expr },
    Map { input: Box<PlanNode>, columns: Vec<MapColumn> },
    Take { input: Box<PlanNode>, limit: usize },
}

impl PlanNode {
    pub fn input(&self) -> Option<&PlanNode> {
        match self {
            PlanNode::Values { .. } | PlanNode::Scan { .. } => None,
            PlanNode::Filter { input, .. }
            | PlanNode::Map { input, .. }
            | PlanNode::Take { input, .. } => Some(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use quiver_core::ColumnType;

    use super::*;

    #[test]
    fn test_version_defaults_when_absent() {
        let doc: PlanDocument = serde_json::from_str(
            r#"{"root": {"Values": {"schema": [{"name": "n", "type": "int64"}], "rows": []}}}"#,
        )
        .unwrap();
        assert_eq!(doc.version, PLAN_VERSION);
        match doc.root {
            PlanNode::Values { schema, rows } => {
                assert_eq!(schema[0].ty, ColumnType::Int64);
                assert!(schema[0].nullable);
                assert!(rows.is_empty());
            }
            other => panic!("unexpected node {:?}", other),
        }
    }
}
