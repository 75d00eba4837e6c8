// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Batch wrapper and row views.
//!
//! A wrapper pairs one [`RowBatch`] with the handle of the task whose arena
//! backs it. The batch sits in a take-able cell: a successful columnar
//! export moves it out, and every later text or row access fails with
//! [`Error::StaleBatch`] instead of reading freed memory. Row views borrow
//! nothing; they re-read through the shared cell on demand, so a view held
//! across an export fails the same deterministic way.

use std::fmt;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use parking_lot::Mutex;
use quiver_core::{Error, Result, SchemaRef, Value};
use quiver_engine::RowBatch;

use crate::export;
use crate::handle::TaskHandle;
use crate::render;

pub(crate) struct BatchShared {
    handle: TaskHandle,
    cell: Mutex<Option<RowBatch>>,
}

impl BatchShared {
    pub(crate) fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    /// Run `f` against the batch, or fail if an export consumed it.
    pub(crate) fn with_batch<T>(&self, f: impl FnOnce(&RowBatch) -> T) -> Result<T> {
        match self.cell.lock().as_ref() {
            Some(batch) => Ok(f(batch)),
            None => Err(Error::StaleBatch),
        }
    }

    /// Move the batch out for export.
    pub(crate) fn take(&self) -> Result<RowBatch> {
        self.cell.lock().take().ok_or(Error::StaleBatch)
    }
}

/// Read-only foreign-object view over one result batch.
#[derive(Clone)]
pub struct BatchWrapper {
    shared: Arc<BatchShared>,
}

impl BatchWrapper {
    pub(crate) fn new(handle: TaskHandle, batch: RowBatch) -> Self {
        Self { shared: Arc::new(BatchShared { handle, cell: Mutex::new(Some(batch)) }) }
    }

    pub fn handle(&self) -> &TaskHandle {
        &self.shared.handle
    }

    pub fn schema(&self) -> SchemaRef {
        self.shared.handle.schema()
    }

    pub fn row_count(&self) -> Result<usize> {
        self.shared.with_batch(|batch| batch.row_count())
    }

    /// Human-readable table rendering of the whole batch.
    pub fn to_text(&self) -> Result<String> {
        self.shared.with_batch(render::render_batch)
    }

    /// Fresh cursor over the rows, starting at row zero. Cursors are
    /// independent; several may walk the same wrapper.
    pub fn rows(&self) -> Result<RowIter> {
        let rows = self.row_count()?;
        Ok(RowIter { shared: self.shared.clone(), next: 0, rows })
    }

    /// Zero-copy export into an Arrow [`RecordBatch`].
    ///
    /// Consumes the batch on success: the wrapper (and any row view over
    /// it) answers [`Error::StaleBatch`] afterwards. On
    /// [`Error::ExportFailed`] the batch stays in place and the wrapper
    /// remains fully usable.
    pub fn export_columnar(&self) -> Result<RecordBatch> {
        export::export_batch(&self.shared)
    }

    /// Export through the Arrow C Data Interface, for hand-off to another
    /// runtime in-process.
    pub fn export_ffi(&self) -> Result<(arrow::ffi::FFI_ArrowArray, arrow::ffi::FFI_ArrowSchema)> {
        export::export_batch_ffi(&self.shared)
    }
}

impl fmt::Debug for BatchWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.row_count().map(|r| r.to_string()).unwrap_or_else(|_| "consumed".into());
        f.debug_struct("BatchWrapper").field("rows", &rows).finish()
    }
}

/// Restartable-from-zero cursor over a wrapper's rows.
pub struct RowIter {
    shared: Arc<BatchShared>,
    next: usize,
    rows: usize,
}

impl Iterator for RowIter {
    type Item = RowView;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.rows {
            return None;
        }
        let view = RowView { shared: self.shared.clone(), row: self.next };
        self.next += 1;
        Some(view)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.rows - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for RowIter {}

/// One row index into a shared batch. Reads through on demand; never
/// copies cell data up front.
pub struct RowView {
    shared: Arc<BatchShared>,
    row: usize,
}

impl RowView {
    pub fn index(&self) -> usize {
        self.row
    }

    pub fn handle(&self) -> &TaskHandle {
        self.shared.handle()
    }

    /// All cells of this row as owned values.
    pub fn values(&self) -> Result<Vec<Value>> {
        self.shared.with_batch(|batch| {
            (0..batch.column_count())
                // SAFETY: the shared cell still holds the batch, so the
                // producing task is alive through our handle.
                .map(|column| unsafe { batch.value(column, self.row) })
                .collect()
        })
    }

    /// One line of `name: value` pairs.
    pub fn to_text(&self) -> Result<String> {
        self.shared.with_batch(|batch| render::render_row(batch, self.row))
    }
}

impl fmt::Debug for RowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowView").field("row", &self.row).finish()
    }
}

#[cfg(test)]
mod tests {
    use quiver_core::{BatchSchema, ColumnType, FieldDef};
    use quiver_engine::{BatchBuilder, PullSource};

    use super::*;

    struct ArenaSource {
        schema: SchemaRef,
        arena: Arena,
    }

    struct Arena(bumpalo::Bump);

    // Test-only: a single thread drives the source.
    unsafe impl Sync for Arena {}
    impl std::panic::RefUnwindSafe for Arena {}

    impl PullSource for ArenaSource {
        fn pull(&self) -> Result<Option<RowBatch>> {
            Ok(None)
        }

        fn schema(&self) -> SchemaRef {
            self.schema.clone()
        }
    }

    fn sample_wrapper() -> BatchWrapper {
        let schema = Arc::new(BatchSchema::new(vec![
            FieldDef::new("id", ColumnType::Int64, false),
            FieldDef::new("name", ColumnType::Utf8, true),
        ]));
        let source =
            Arc::new(ArenaSource { schema: schema.clone(), arena: Arena(bumpalo::Bump::new()) });
        let mut builder = BatchBuilder::new(schema);
        builder.push_row(&[Value::Int64(1), Value::Utf8("ada".into())]).unwrap();
        builder.push_row(&[Value::Int64(2), Value::Undefined]).unwrap();
        builder.push_row(&[Value::Int64(3), Value::Utf8("grace".into())]).unwrap();
        let batch = builder.finish(&source.arena.0);
        BatchWrapper::new(TaskHandle::new(source), batch)
    }

    #[test]
    fn test_rows_restart_from_zero() {
        let wrapper = sample_wrapper();
        assert_eq!(wrapper.rows().unwrap().count(), 3);
        let first_again = wrapper.rows().unwrap().next().unwrap();
        assert_eq!(first_again.index(), 0);
        assert_eq!(first_again.values().unwrap()[0], Value::Int64(1));
    }

    #[test]
    fn test_concurrent_cursors_are_independent() {
        let wrapper = sample_wrapper();
        let mut a = wrapper.rows().unwrap();
        let mut b = wrapper.rows().unwrap();
        a.next();
        a.next();
        assert_eq!(b.next().unwrap().index(), 0);
        assert_eq!(a.next().unwrap().index(), 2);
    }

    #[test]
    fn test_stale_after_take() {
        let wrapper = sample_wrapper();
        let view = wrapper.rows().unwrap().next().unwrap();
        wrapper.shared.take().unwrap();

        assert_eq!(wrapper.to_text().unwrap_err(), Error::StaleBatch);
        assert!(matches!(wrapper.rows().err(), Some(Error::StaleBatch)));
        assert_eq!(wrapper.row_count().unwrap_err(), Error::StaleBatch);
        assert_eq!(view.to_text().unwrap_err(), Error::StaleBatch);
        assert_eq!(wrapper.shared.take().unwrap_err(), Error::StaleBatch);
    }

    #[test]
    fn test_row_text_renders_undefined() {
        let wrapper = sample_wrapper();
        let rows: Vec<_> = wrapper.rows().unwrap().collect();
        let text = rows[1].to_text().unwrap();
        assert!(text.contains("id: 2"));
        assert!(text.contains("Undefined"));
    }
}
