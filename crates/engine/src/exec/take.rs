// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use bumpalo::Bump;
use quiver_core::{Result, SchemaRef, Value};
use tracing::instrument;

use crate::batch::RowBatch;
use crate::builder::BatchBuilder;
use crate::exec::{Describe, ExecutionContext, QueryNode};

/// Caps the stream at `limit` rows, truncating the batch that crosses it.
/// Once the limit is reached the input is never pulled again.
pub struct TakeNode {
    input: Box<dyn QueryNode>,
    limit: usize,
    remaining: usize,
}

impl TakeNode {
    pub fn new(input: Box<dyn QueryNode>, limit: usize) -> Self {
        Self { input, limit, remaining: limit }
    }
}

impl QueryNode for TakeNode {
    fn initialize(&mut self, ctx: &ExecutionContext) -> Result<()> {
        self.input.initialize(ctx)
    }

    #[instrument(name = "exec::take::next", level = "trace", skip_all)]
    fn next(&mut self, arena: &Bump, ctx: &ExecutionContext) -> Result<Option<RowBatch>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        while let Some(batch) = self.input.next(arena, ctx)? {
            let row_count = batch.row_count();
            if row_count == 0 {
                continue;
            }
            if row_count <= self.remaining {
                self.remaining -= row_count;
                return Ok(Some(batch));
            }
            // Rebuild the prefix that still fits.
            let mut builder = BatchBuilder::new(batch.schema().clone());
            for row in 0..self.remaining {
                // SAFETY: the input batch lives in this task's arena, alive
                // for the whole call.
                let values: Vec<Value> =
                    (0..batch.column_count()).map(|col| unsafe { batch.value(col, row) }).collect();
                builder.push_row(&values)?;
            }
            self.remaining = 0;
            return Ok(Some(builder.finish(arena)));
        }
        Ok(None)
    }

    fn schema(&self) -> SchemaRef {
        self.input.schema()
    }

    fn describe(&self, out: &mut Describe<'_>) {
        out.line(format!("Take limit={}", self.limit));
        out.child(self.input.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quiver_core::{BatchSchema, ColumnType, FieldDef};

    use super::*;
    use crate::exec::ValuesNode;

    #[test]
    fn test_truncates_crossing_batch() {
        let schema = Arc::new(BatchSchema::new(vec![FieldDef::new("n", ColumnType::Int64, false)]));
        let rows = (0..10).map(|n| vec![Value::Int64(n)]).collect();
        let values = ValuesNode::new(schema, rows);
        let mut node = TakeNode::new(Box::new(values), 5);
        let ctx = ExecutionContext { batch_size: 3 };
        let arena = Bump::new();
        node.initialize(&ctx).unwrap();

        let mut total = 0;
        while let Some(batch) = node.next(&arena, &ctx).unwrap() {
            total += batch.row_count();
        }
        assert_eq!(total, 5);
        assert!(node.next(&arena, &ctx).unwrap().is_none());
    }

    #[test]
    fn test_describe_keeps_original_limit_after_drain() {
        let schema = Arc::new(BatchSchema::new(vec![FieldDef::new("n", ColumnType::Int64, false)]));
        let rows = (0..4).map(|n| vec![Value::Int64(n)]).collect();
        let values = ValuesNode::new(schema, rows);
        let mut node = TakeNode::new(Box::new(values), 3);
        let ctx = ExecutionContext { batch_size: 2 };
        let arena = Bump::new();
        node.initialize(&ctx).unwrap();
        while node.next(&arena, &ctx).unwrap().is_some() {}

        let mut out = String::new();
        node.describe(&mut Describe::new(&mut out));
        assert!(out.starts_with("Take limit=3"));
    }
}
