// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Immutable, column-oriented result batches backed by the task arena.
//!
//! A [`RowBatch`] never owns its buffers: every [`RawBuffer`] is a view into
//! the bump arena of the [`ExecutionTask`](crate::ExecutionTask) that
//! produced it. Buffer layouts follow the Arrow memory format (LSB validity
//! bitmaps, i32 offsets, native-endian fixed-width data) so the interchange
//! exporter can hand them out without copying.
//!
//! Invariant: a batch and everything reached through it is valid exactly as
//! long as the owning task is alive. Cell accessors are `unsafe` because the
//! batch itself cannot enforce that; callers hold a task handle.

use std::ptr::NonNull;

use quiver_core::{ColumnType, SchemaRef, Value};

/// A raw view into task arena memory.
#[derive(Debug, Clone, Copy)]
pub struct RawBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

// The view is strictly read-only; keeping the backing arena alive is the
// holder's obligation either way, so crossing threads adds no new hazard.
unsafe impl Send for RawBuffer {}
unsafe impl Sync for RawBuffer {}

impl RawBuffer {
    /// Capture a view of a slice that lives in the task arena.
    pub(crate) fn from_arena(slice: &[u8]) -> Self {
        // An empty bump allocation yields a dangling but well-aligned
        // pointer, which is exactly what NonNull wants for len == 0.
        Self {
            ptr: NonNull::new(slice.as_ptr() as *mut u8).unwrap_or(NonNull::dangling()),
            len: slice.len(),
        }
    }

    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// # Safety
    ///
    /// The arena backing this buffer must still be alive and the returned
    /// slice must not outlive it.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

/// Per-type data buffers of one column.
#[derive(Debug)]
pub enum ColumnBuffers {
    /// No buffers at all; every cell reads as `Value::Undefined`.
    Undefined,
    /// One bit per row, LSB first.
    Bool { bits: RawBuffer },
    /// Eight bytes per row.
    Int64 { values: RawBuffer },
    /// Eight bytes per row.
    Float64 { values: RawBuffer },
    /// `row_count + 1` i32 offsets plus the concatenated bytes.
    Utf8 { offsets: RawBuffer, bytes: RawBuffer },
    /// `row_count + 1` i32 offsets into the flattened child column.
    List { offsets: RawBuffer, child: Box<ColumnData> },
}

/// One column of a batch: type, optional validity bitmap and data buffers.
#[derive(Debug)]
pub struct ColumnData {
    ty: ColumnType,
    row_count: usize,
    validity: Option<RawBuffer>,
    buffers: ColumnBuffers,
}

impl ColumnData {
    pub(crate) fn new(
        ty: ColumnType,
        row_count: usize,
        validity: Option<RawBuffer>,
        buffers: ColumnBuffers,
    ) -> Self {
        Self { ty, row_count, validity, buffers }
    }

    pub fn ty(&self) -> &ColumnType {
        &self.ty
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn validity(&self) -> Option<&RawBuffer> {
        self.validity.as_ref()
    }

    pub fn buffers(&self) -> &ColumnBuffers {
        &self.buffers
    }

    /// # Safety
    ///
    /// The owning task's arena must still be alive.
    pub unsafe fn is_valid(&self, row: usize) -> bool {
        debug_assert!(row < self.row_count);
        match &self.validity {
            None => !matches!(self.buffers, ColumnBuffers::Undefined),
            // SAFETY: forwarded from the caller.
            Some(bitmap) => unsafe { bit_at(bitmap.as_slice(), row) },
        }
    }

    /// Read one cell as a boxed [`Value`].
    ///
    /// # Safety
    ///
    /// The owning task's arena must still be alive.
    pub unsafe fn value(&self, row: usize) -> Value {
        debug_assert!(row < self.row_count);
        // SAFETY: forwarded from the caller for every buffer read below.
        unsafe {
            if !self.is_valid(row) {
                return Value::Undefined;
            }
            match &self.buffers {
                ColumnBuffers::Undefined => Value::Undefined,
                ColumnBuffers::Bool { bits } => Value::Bool(bit_at(bits.as_slice(), row)),
                ColumnBuffers::Int64 { values } => {
                    Value::Int64(read_fixed::<i64>(values.as_slice(), row))
                }
                ColumnBuffers::Float64 { values } => {
                    Value::Float64(read_fixed::<f64>(values.as_slice(), row))
                }
                ColumnBuffers::Utf8 { offsets, bytes } => {
                    let (start, end) = offset_range(offsets.as_slice(), row);
                    let data = &bytes.as_slice()[start..end];
                    // Builders only freeze valid utf8.
                    Value::Utf8(String::from_utf8_lossy(data).into_owned())
                }
                ColumnBuffers::List { offsets, child } => {
                    let (start, end) = offset_range(offsets.as_slice(), row);
                    Value::List((start..end).map(|idx| child.value(idx)).collect())
                }
            }
        }
    }
}

fn bit_at(bitmap: &[u8], idx: usize) -> bool {
    bitmap[idx / 8] >> (idx % 8) & 1 == 1
}

fn read_fixed<T: Copy>(data: &[u8], row: usize) -> T {
    let size = size_of::<T>();
    debug_assert!((row + 1) * size <= data.len());
    // SAFETY: builders allocate fixed-width buffers with the natural
    // alignment of T and row_count elements.
    unsafe { *(data.as_ptr().add(row * size) as *const T) }
}

fn offset_range(offsets: &[u8], row: usize) -> (usize, usize) {
    let start: i32 = read_fixed(offsets, row);
    let end: i32 = read_fixed(offsets, row + 1);
    (start as usize, end as usize)
}

/// An immutable batch of result rows, produced by one `next()` of the task.
#[derive(Debug)]
pub struct RowBatch {
    schema: SchemaRef,
    columns: Vec<ColumnData>,
    row_count: usize,
}

impl RowBatch {
    pub(crate) fn new(schema: SchemaRef, columns: Vec<ColumnData>, row_count: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.row_count() == row_count));
        Self { schema, columns, row_count }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnData] {
        &self.columns
    }

    /// Read one cell.
    ///
    /// # Safety
    ///
    /// The task that produced this batch must still be alive.
    pub unsafe fn value(&self, column: usize, row: usize) -> Value {
        // SAFETY: forwarded from the caller.
        unsafe { self.columns[column].value(row) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_at() {
        let bitmap = [0b0000_0101u8, 0b0000_0001];
        assert!(bit_at(&bitmap, 0));
        assert!(!bit_at(&bitmap, 1));
        assert!(bit_at(&bitmap, 2));
        assert!(bit_at(&bitmap, 8));
        assert!(!bit_at(&bitmap, 9));
    }

    #[test]
    fn test_raw_buffer_empty() {
        let buffer = RawBuffer::from_arena(&[]);
        assert!(buffer.is_empty());
        // SAFETY: zero-length view, nothing is dereferenced.
        assert_eq!(unsafe { buffer.as_slice() }, &[] as &[u8]);
    }
}
