// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use bumpalo::Bump;
use quiver_core::{Result, SchemaRef, Value};
use tracing::instrument;

use crate::batch::RowBatch;
use crate::builder::BatchBuilder;
use crate::exec::{Describe, ExecutionContext, QueryNode};

/// Inline rows carried by the plan document itself.
pub struct ValuesNode {
    schema: SchemaRef,
    rows: Vec<Vec<Value>>,
    cursor: usize,
}

impl ValuesNode {
    pub fn new(schema: SchemaRef, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows, cursor: 0 }
    }
}

impl QueryNode for ValuesNode {
    fn initialize(&mut self, _ctx: &ExecutionContext) -> Result<()> {
        Ok(())
    }

    #[instrument(name = "exec::values::next", level = "trace", skip_all)]
    fn next(&mut self, arena: &Bump, ctx: &ExecutionContext) -> Result<Option<RowBatch>> {
        if self.cursor >= self.rows.len() {
            return Ok(None);
        }
        let mut builder = BatchBuilder::new(self.schema.clone());
        while self.cursor < self.rows.len() && builder.row_count() < ctx.batch_size {
            builder.push_row(&self.rows[self.cursor])?;
            self.cursor += 1;
        }
        Ok(Some(builder.finish(arena)))
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn describe(&self, out: &mut Describe<'_>) {
        out.line(format!("Values rows={}", self.rows.len()));
    }
}
