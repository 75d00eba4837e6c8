// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

use std::sync::Arc;

use bumpalo::Bump;
use quiver_core::{Result, SchemaRef};
use tracing::instrument;

use crate::batch::RowBatch;
use crate::builder::BatchBuilder;
use crate::exec::{Describe, ExecutionContext, QueryNode};
use crate::registry;
use crate::source::SplitReader;
use crate::split::SplitQueue;

/// Reads rows from the splits attached to its queue, one split at a time.
///
/// The task guarantees the queue is closed before the first `next`, so an
/// empty queue means end of data, never "splits still arriving".
pub struct ScanNode {
    schema: SchemaRef,
    queue: Arc<SplitQueue>,
    current: Option<Box<dyn SplitReader>>,
}

impl ScanNode {
    pub fn new(schema: SchemaRef, queue: Arc<SplitQueue>) -> Self {
        Self { schema, queue, current: None }
    }

    fn next_reader(&mut self) -> Result<bool> {
        match self.queue.pop()? {
            Some(split) => {
                self.current = Some(registry::reader_for(&split)?);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl QueryNode for ScanNode {
    fn initialize(&mut self, _ctx: &ExecutionContext) -> Result<()> {
        debug_assert!(
            self.queue.is_closed().unwrap_or(false),
            "scan initialized before no_more_splits"
        );
        Ok(())
    }

    #[instrument(name = "exec::scan::next", level = "trace", skip_all)]
    fn next(&mut self, arena: &Bump, ctx: &ExecutionContext) -> Result<Option<RowBatch>> {
        let mut builder = BatchBuilder::new(self.schema.clone());
        loop {
            let reader = match &mut self.current {
                Some(reader) => reader,
                None => {
                    if self.next_reader()? {
                        continue;
                    }
                    break;
                }
            };
            match reader.next_row(&self.schema)? {
                Some(row) => {
                    builder.push_row(&row)?;
                    if builder.row_count() >= ctx.batch_size {
                        return Ok(Some(builder.finish(arena)));
                    }
                }
                None => self.current = None,
            }
        }
        if builder.is_empty() { Ok(None) } else { Ok(Some(builder.finish(arena))) }
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn describe(&self, out: &mut Describe<'_>) {
        let columns = self
            .schema
            .fields
            .iter()
            .map(|field| field.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        out.line(format!("Scan [{}]", columns));
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;

    use quiver_core::{BatchSchema, ColumnType, FieldDef, Value};

    use super::*;
    use crate::split::{ScanFormat, Split};

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("quiver-scan-{}-{}", std::process::id(), name));
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_scans_multiple_splits() {
        let a = write_temp("a", "{\"n\":1}\n{\"n\":2}\n");
        let b = write_temp("b", "{\"n\":3}\n");
        let queue = Arc::new(SplitQueue::new());
        for path in [&a, &b] {
            queue
                .push(Split {
                    path: path.clone(),
                    start: 0,
                    length: std::fs::metadata(path).unwrap().len(),
                    format: ScanFormat::JsonLines,
                })
                .unwrap();
        }
        queue.close().unwrap();

        let schema = Arc::new(BatchSchema::new(vec![FieldDef::new("n", ColumnType::Int64, false)]));
        let mut node = ScanNode::new(schema, queue);
        let ctx = ExecutionContext::default();
        let arena = Bump::new();
        node.initialize(&ctx).unwrap();

        let batch = node.next(&arena, &ctx).unwrap().unwrap();
        assert_eq!(batch.row_count(), 3);
        // SAFETY: arena alive for the duration of the test.
        unsafe {
            assert_eq!(batch.value(0, 0), Value::Int64(1));
            assert_eq!(batch.value(0, 2), Value::Int64(3));
        }
        assert!(node.next(&arena, &ctx).unwrap().is_none());
        std::fs::remove_file(a).ok();
        std::fs::remove_file(b).ok();
    }
}
