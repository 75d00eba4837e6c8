// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use bumpalo::Bump;
use quiver_core::{BatchSchema, FieldDef, Result, SchemaRef};
use tracing::instrument;

use crate::batch::RowBatch;
use crate::builder::BatchBuilder;
use crate::exec::{Describe, ExecutionContext, QueryNode};
use crate::expr::Expr;

/// One output column of a map operator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MapColumn {
    pub name: String,
    pub expr: Expr,
}

/// Projects each input batch through a list of named expressions.
pub struct MapNode {
    input: Box<dyn QueryNode>,
    columns: Vec<MapColumn>,
    schema: SchemaRef,
}

impl MapNode {
    /// Output types are inferred against the input schema up front, so a
    /// type error surfaces at plan conversion, not mid-stream.
    pub fn new(input: Box<dyn QueryNode>, columns: Vec<MapColumn>) -> Result<Self> {
        let input_schema = input.schema();
        let fields = columns
            .iter()
            .map(|column| {
                let ty = column.expr.infer_type(&input_schema)?;
                Ok(FieldDef::new(column.name.clone(), ty, true))
            })
            .collect::<Result<Vec<_>>>()?;
        let schema = Arc::new(BatchSchema::new(fields));
        Ok(Self { input, columns, schema })
    }
}

impl QueryNode for MapNode {
    fn initialize(&mut self, ctx: &ExecutionContext) -> Result<()> {
        self.input.initialize(ctx)
    }

    #[instrument(name = "exec::map::next", level = "trace", skip_all)]
    fn next(&mut self, arena: &Bump, ctx: &ExecutionContext) -> Result<Option<RowBatch>> {
        let Some(batch) = self.input.next(arena, ctx)? else {
            return Ok(None);
        };
        let mut builder = BatchBuilder::new(self.schema.clone());
        for row in 0..batch.row_count() {
            let values = self
                .columns
                .iter()
                .map(|column| column.expr.evaluate(&batch, row))
                .collect::<Result<Vec<_>>>()?;
            builder.push_row(&values)?;
        }
        Ok(Some(builder.finish(arena)))
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn describe(&self, out: &mut Describe<'_>) {
        let columns = self
            .columns
            .iter()
            .map(|column| format!("{}: {}", column.name, column.expr))
            .collect::<Vec<_>>()
            .join(", ");
        out.line(format!("Map [{}]", columns));
        out.child(self.input.as_ref());
    }
}
