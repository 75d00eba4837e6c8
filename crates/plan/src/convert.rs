// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Conversion of a plan document into an executable operator tree.
//!
//! The converter validates everything it can before a task exists: unknown
//! columns and operand type mismatches surface here, and every scan path is
//! resolved to a split with its on-disk length. Splits are keyed by the
//! operator that consumes them; the caller attaches them to the task and
//! closes each queue before the first pull.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use quiver_core::{BatchSchema, Error, Result};
use quiver_engine::exec::{
    Describe, FilterNode, MapNode, QueryNode, ScanNode, TakeNode, ValuesNode,
};
use quiver_engine::{OperatorId, Split, SplitQueue};
use tracing::instrument;

use crate::document::{PlanDocument, PlanNode};

/// Result of converting one plan document.
pub struct ConvertedPlan {
    pub root: Box<dyn QueryNode>,
    /// Split queue per scan operator, shared with the scan node.
    pub queues: HashMap<OperatorId, Arc<SplitQueue>>,
    /// Splits each scan operator should be fed, one per file.
    pub splits: HashMap<OperatorId, Vec<Split>>,
}

impl ConvertedPlan {
    /// Indented one-line-per-operator rendering of the converted tree.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.root.describe(&mut Describe::new(&mut out));
        out
    }
}

impl fmt::Debug for ConvertedPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertedPlan").field("splits", &self.splits).finish_non_exhaustive()
    }
}

#[instrument(name = "plan::convert", level = "trace", skip_all)]
pub fn convert(doc: &PlanDocument) -> Result<ConvertedPlan> {
    let mut converter = Converter::default();
    let root = converter.node(&doc.root)?;
    Ok(ConvertedPlan { root, queues: converter.queues, splits: converter.splits })
}

#[derive(Default)]
struct Converter {
    next_operator: u32,
    queues: HashMap<OperatorId, Arc<SplitQueue>>,
    splits: HashMap<OperatorId, Vec<Split>>,
}

impl Converter {
    fn node(&mut self, node: &PlanNode) -> Result<Box<dyn QueryNode>> {
        match node {
            PlanNode::Values { schema, rows } => {
                let schema = Arc::new(BatchSchema::new(schema.clone()));
                for (idx, row) in rows.iter().enumerate() {
                    if row.len() != schema.column_count() {
                        return Err(Error::engine(format!(
                            "values row {} has {} cells, schema has {} columns",
                            idx,
                            row.len(),
                            schema.column_count()
                        )));
                    }
                }
                Ok(Box::new(ValuesNode::new(schema, rows.clone())))
            }
            PlanNode::Scan { schema, paths, format } => {
                let operator = self.allocate_operator();
                let schema = Arc::new(BatchSchema::new(schema.clone()));
                let mut splits = Vec::with_capacity(paths.len());
                for path in paths {
                    let metadata = std::fs::metadata(path).map_err(|err| {
                        Error::engine(format!("cannot stat '{}': {}", path.display(), err))
                    })?;
                    splits.push(Split {
                        path: path.clone(),
                        start: 0,
                        length: metadata.len(),
                        format: *format,
                    });
                }
                let queue = Arc::new(SplitQueue::new());
                self.queues.insert(operator, queue.clone());
                self.splits.insert(operator, splits);
                Ok(Box::new(ScanNode::new(schema, queue)))
            }
            PlanNode::Filter { input, predicate } => {
                let input = self.node(input)?;
                predicate.infer_type(&input.schema())?;
                Ok(Box::new(FilterNode::new(input, predicate.clone())))
            }
            PlanNode::Map { input, columns } => {
                let input = self.node(input)?;
                Ok(Box::new(MapNode::new(input, columns.clone())?))
            }
            PlanNode::Take { input, limit } => {
                Ok(Box::new(TakeNode::new(self.node(input)?, *limit)))
            }
        }
    }

    fn allocate_operator(&mut self) -> OperatorId {
        let id = OperatorId(self.next_operator);
        self.next_operator += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use quiver_core::{ColumnType, FieldDef, Value};
    use quiver_engine::{BinaryOp, Expr, ScanFormat};

    use super::*;
    use crate::document::PlanDocument;

    fn int_schema() -> Vec<FieldDef> {
        vec![FieldDef::new("n", ColumnType::Int64, false)]
    }

    #[test]
    fn test_scan_paths_become_splits() {
        let dir = std::env::temp_dir();
        let path = dir.join("quiver_convert_splits.ndjson");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{{\"n\": 1}}").unwrap();

        let doc = PlanDocument::new(PlanNode::Scan {
            schema: int_schema(),
            paths: vec![path.clone()],
            format: ScanFormat::JsonLines,
        });
        let plan = convert(&doc).unwrap();
        assert_eq!(plan.queues.len(), 1);
        let splits = plan.splits.values().next().unwrap();
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].start, 0);
        assert_eq!(splits[0].length, std::fs::metadata(&path).unwrap().len());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_scan_file_faults() {
        let doc = PlanDocument::new(PlanNode::Scan {
            schema: int_schema(),
            paths: vec!["/nonexistent/quiver.ndjson".into()],
            format: ScanFormat::JsonLines,
        });
        let err = convert(&doc).unwrap_err();
        assert!(matches!(err, Error::EngineFault(_)));
    }

    #[test]
    fn test_unknown_filter_column_rejected_at_conversion() {
        let doc = PlanDocument::new(PlanNode::Filter {
            input: Box::new(PlanNode::Values { schema: int_schema(), rows: vec![] }),
            predicate: Expr::Binary {
                op: BinaryOp::Eq,
                left: Box::new(Expr::Column("missing".into())),
                right: Box::new(Expr::Literal(Value::Int64(1))),
            },
        });
        let err = convert(&doc).unwrap_err();
        assert!(err.to_string().contains("unknown column"));
    }

    #[test]
    fn test_ragged_values_rows_rejected() {
        let doc = PlanDocument::new(PlanNode::Values {
            schema: int_schema(),
            rows: vec![vec![Value::Int64(1), Value::Int64(2)]],
        });
        assert!(convert(&doc).is_err());
    }

    #[test]
    fn test_explain_renders_tree() {
        let doc = PlanDocument::new(PlanNode::Take {
            input: Box::new(PlanNode::Values { schema: int_schema(), rows: vec![] }),
            limit: 5,
        });
        let plan = convert(&doc).unwrap();
        let text = plan.explain();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Take"));
        assert!(lines[1].starts_with("  Values"));
    }
}
