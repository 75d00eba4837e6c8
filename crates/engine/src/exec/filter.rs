// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use bumpalo::Bump;
use quiver_core::{Result, SchemaRef, Value};
use tracing::instrument;

use crate::batch::RowBatch;
use crate::builder::BatchBuilder;
use crate::exec::{Describe, ExecutionContext, QueryNode};
use crate::expr::Expr;

/// Keeps the rows whose predicate evaluates to `Bool(true)`; `Undefined`
/// drops the row. Skips empty output batches rather than yielding them.
pub struct FilterNode {
    input: Box<dyn QueryNode>,
    predicate: Expr,
}

impl FilterNode {
    pub fn new(input: Box<dyn QueryNode>, predicate: Expr) -> Self {
        Self { input, predicate }
    }
}

impl QueryNode for FilterNode {
    fn initialize(&mut self, ctx: &ExecutionContext) -> Result<()> {
        self.input.initialize(ctx)
    }

    #[instrument(name = "exec::filter::next", level = "trace", skip_all)]
    fn next(&mut self, arena: &Bump, ctx: &ExecutionContext) -> Result<Option<RowBatch>> {
        while let Some(batch) = self.input.next(arena, ctx)? {
            let mut builder = BatchBuilder::new(batch.schema().clone());
            for row in 0..batch.row_count() {
                if self.predicate.evaluate(&batch, row)? == Value::Bool(true) {
                    // SAFETY: the batch was produced by this task's arena,
                    // which is alive for the whole `next` call.
                    let values: Vec<Value> =
                        (0..batch.column_count()).map(|col| unsafe { batch.value(col, row) }).collect();
                    builder.push_row(&values)?;
                }
            }
            if !builder.is_empty() {
                return Ok(Some(builder.finish(arena)));
            }
        }
        Ok(None)
    }

    fn schema(&self) -> SchemaRef {
        self.input.schema()
    }

    fn describe(&self, out: &mut Describe<'_>) {
        out.line(format!("Filter {}", self.predicate));
        out.child(self.input.as_ref());
    }
}
