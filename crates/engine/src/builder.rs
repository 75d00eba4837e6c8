// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Builders that accumulate row values and freeze them into arena-backed
//! [`ColumnData`]. Accumulation happens in ordinary `Vec`s; `freeze` copies
//! the finished layout into the task arena in one allocation per buffer.

use bumpalo::Bump;
use quiver_core::{ColumnType, Error, Result, SchemaRef, Value};

use crate::batch::{ColumnBuffers, ColumnData, RawBuffer, RowBatch};

pub enum ColumnBuilder {
    Undefined { len: usize },
    Bool { values: Vec<bool>, validity: Vec<bool> },
    Int64 { values: Vec<i64>, validity: Vec<bool> },
    Float64 { values: Vec<f64>, validity: Vec<bool> },
    Utf8 { offsets: Vec<i32>, bytes: Vec<u8>, validity: Vec<bool> },
    List { offsets: Vec<i32>, child: Box<ColumnBuilder>, validity: Vec<bool> },
}

impl ColumnBuilder {
    pub fn new(ty: &ColumnType) -> Self {
        match ty {
            ColumnType::Undefined => ColumnBuilder::Undefined { len: 0 },
            ColumnType::Bool => ColumnBuilder::Bool { values: Vec::new(), validity: Vec::new() },
            ColumnType::Int64 => ColumnBuilder::Int64 { values: Vec::new(), validity: Vec::new() },
            ColumnType::Float64 => {
                ColumnBuilder::Float64 { values: Vec::new(), validity: Vec::new() }
            }
            ColumnType::Utf8 => ColumnBuilder::Utf8 {
                offsets: vec![0],
                bytes: Vec::new(),
                validity: Vec::new(),
            },
            ColumnType::List(inner) => ColumnBuilder::List {
                offsets: vec![0],
                child: Box::new(ColumnBuilder::new(inner)),
                validity: Vec::new(),
            },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnBuilder::Undefined { len } => *len,
            ColumnBuilder::Bool { validity, .. }
            | ColumnBuilder::Int64 { validity, .. }
            | ColumnBuilder::Float64 { validity, .. }
            | ColumnBuilder::Utf8 { validity, .. }
            | ColumnBuilder::List { validity, .. } => validity.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one cell. `Undefined` appends a null in typed columns; an
    /// `Int64` value promotes losslessly into a `Float64` column.
    pub fn push(&mut self, value: &Value) -> Result<()> {
        match (self, value) {
            (ColumnBuilder::Undefined { len }, _) => {
                *len += 1;
                Ok(())
            }
            (ColumnBuilder::Bool { values, validity }, Value::Undefined) => {
                values.push(false);
                validity.push(false);
                Ok(())
            }
            (ColumnBuilder::Bool { values, validity }, Value::Bool(v)) => {
                values.push(*v);
                validity.push(true);
                Ok(())
            }
            (ColumnBuilder::Int64 { values, validity }, Value::Undefined) => {
                values.push(0);
                validity.push(false);
                Ok(())
            }
            (ColumnBuilder::Int64 { values, validity }, Value::Int64(v)) => {
                values.push(*v);
                validity.push(true);
                Ok(())
            }
            (ColumnBuilder::Float64 { values, validity }, Value::Undefined) => {
                values.push(0.0);
                validity.push(false);
                Ok(())
            }
            (ColumnBuilder::Float64 { values, validity }, Value::Float64(v)) => {
                values.push(*v);
                validity.push(true);
                Ok(())
            }
            (ColumnBuilder::Float64 { values, validity }, Value::Int64(v)) => {
                values.push(*v as f64);
                validity.push(true);
                Ok(())
            }
            (ColumnBuilder::Utf8 { offsets, bytes, validity }, Value::Undefined) => {
                offsets.push(bytes.len() as i32);
                validity.push(false);
                Ok(())
            }
            (ColumnBuilder::Utf8 { offsets, bytes, validity }, Value::Utf8(v)) => {
                bytes.extend_from_slice(v.as_bytes());
                offsets.push(bytes.len() as i32);
                validity.push(true);
                Ok(())
            }
            (ColumnBuilder::List { offsets, child, validity }, Value::Undefined) => {
                offsets.push(child.len() as i32);
                validity.push(false);
                Ok(())
            }
            (ColumnBuilder::List { offsets, child, validity }, Value::List(items)) => {
                for item in items {
                    child.push(item)?;
                }
                offsets.push(child.len() as i32);
                validity.push(true);
                Ok(())
            }
            (builder, value) => Err(Error::engine(format!(
                "cannot append {} value to {} column",
                value.column_type(),
                builder.ty()
            ))),
        }
    }

    fn ty(&self) -> ColumnType {
        match self {
            ColumnBuilder::Undefined { .. } => ColumnType::Undefined,
            ColumnBuilder::Bool { .. } => ColumnType::Bool,
            ColumnBuilder::Int64 { .. } => ColumnType::Int64,
            ColumnBuilder::Float64 { .. } => ColumnType::Float64,
            ColumnBuilder::Utf8 { .. } => ColumnType::Utf8,
            ColumnBuilder::List { child, .. } => ColumnType::List(Box::new(child.ty())),
        }
    }

    /// Copy the accumulated column into the arena. The returned buffers are
    /// views into `arena` and follow the Arrow memory layout.
    pub fn freeze(self, arena: &Bump) -> ColumnData {
        let ty = self.ty();
        match self {
            ColumnBuilder::Undefined { len } => {
                ColumnData::new(ty, len, None, ColumnBuffers::Undefined)
            }
            ColumnBuilder::Bool { values, validity } => {
                let row_count = values.len();
                let bits = freeze_bitmap(arena, &values);
                let validity = freeze_validity(arena, &validity);
                ColumnData::new(ty, row_count, validity, ColumnBuffers::Bool { bits })
            }
            ColumnBuilder::Int64 { values, validity } => {
                let row_count = values.len();
                let data = arena.alloc_slice_copy(&values);
                let values = RawBuffer::from_arena(cast_bytes(data));
                let validity = freeze_validity(arena, &validity);
                ColumnData::new(ty, row_count, validity, ColumnBuffers::Int64 { values })
            }
            ColumnBuilder::Float64 { values, validity } => {
                let row_count = values.len();
                let data = arena.alloc_slice_copy(&values);
                let values = RawBuffer::from_arena(cast_bytes(data));
                let validity = freeze_validity(arena, &validity);
                ColumnData::new(ty, row_count, validity, ColumnBuffers::Float64 { values })
            }
            ColumnBuilder::Utf8 { offsets, bytes, validity } => {
                let row_count = validity.len();
                let offsets = arena.alloc_slice_copy(&offsets);
                let offsets = RawBuffer::from_arena(cast_bytes(offsets));
                let bytes = RawBuffer::from_arena(arena.alloc_slice_copy(&bytes));
                let validity = freeze_validity(arena, &validity);
                ColumnData::new(ty, row_count, validity, ColumnBuffers::Utf8 { offsets, bytes })
            }
            ColumnBuilder::List { offsets, child, validity } => {
                let row_count = validity.len();
                let offsets = arena.alloc_slice_copy(&offsets);
                let offsets = RawBuffer::from_arena(cast_bytes(offsets));
                let child = Box::new(child.freeze(arena));
                let validity = freeze_validity(arena, &validity);
                ColumnData::new(ty, row_count, validity, ColumnBuffers::List { offsets, child })
            }
        }
    }
}

/// Pack bools into an LSB bitmap and copy it into the arena.
fn freeze_bitmap(arena: &Bump, bits: &[bool]) -> RawBuffer {
    let mut packed = vec![0u8; bits.len().div_ceil(8)];
    for (idx, set) in bits.iter().enumerate() {
        if *set {
            packed[idx / 8] |= 1 << (idx % 8);
        }
    }
    RawBuffer::from_arena(arena.alloc_slice_copy(&packed))
}

/// A validity buffer is only materialized when at least one null exists.
fn freeze_validity(arena: &Bump, validity: &[bool]) -> Option<RawBuffer> {
    if validity.iter().all(|v| *v) {
        None
    } else {
        Some(freeze_bitmap(arena, validity))
    }
}

fn cast_bytes<T: Copy>(data: &[T]) -> &[u8] {
    // SAFETY: T is a plain fixed-width numeric type; reinterpreting its
    // memory as bytes is always valid.
    unsafe { std::slice::from_raw_parts(data.as_ptr() as *const u8, size_of_val(data)) }
}

/// Accumulates whole rows against a schema and freezes them into a batch.
pub struct BatchBuilder {
    schema: SchemaRef,
    builders: Vec<ColumnBuilder>,
    rows: usize,
}

impl BatchBuilder {
    pub fn new(schema: SchemaRef) -> Self {
        let builders = schema.fields.iter().map(|f| ColumnBuilder::new(&f.ty)).collect();
        Self { schema, builders, rows: 0 }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn push_row(&mut self, row: &[Value]) -> Result<()> {
        if row.len() != self.builders.len() {
            return Err(Error::engine(format!(
                "row has {} values, schema expects {}",
                row.len(),
                self.builders.len()
            )));
        }
        for (idx, value) in row.iter().enumerate() {
            self.builders[idx].push(value).map_err(|err| match err {
                Error::EngineFault(msg) => Error::engine(format!(
                    "column '{}': {}",
                    self.schema.fields[idx].name, msg
                )),
                other => other,
            })?;
        }
        self.rows += 1;
        Ok(())
    }

    pub fn finish(self, arena: &Bump) -> RowBatch {
        let columns = self.builders.into_iter().map(|b| b.freeze(arena)).collect();
        RowBatch::new(self.schema, columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quiver_core::{BatchSchema, FieldDef};

    use super::*;

    fn schema() -> SchemaRef {
        Arc::new(BatchSchema::new(vec![
            FieldDef::new("id", ColumnType::Int64, false),
            FieldDef::new("name", ColumnType::Utf8, true),
        ]))
    }

    #[test]
    fn test_build_and_read_back() {
        let arena = Bump::new();
        let mut builder = BatchBuilder::new(schema());
        builder.push_row(&[Value::Int64(1), Value::Utf8("alice".into())]).unwrap();
        builder.push_row(&[Value::Int64(2), Value::Undefined]).unwrap();
        let batch = builder.finish(&arena);

        assert_eq!(batch.row_count(), 2);
        assert_eq!(batch.column_count(), 2);
        // SAFETY: the arena outlives the batch in this test.
        unsafe {
            assert_eq!(batch.value(0, 0), Value::Int64(1));
            assert_eq!(batch.value(1, 0), Value::Utf8("alice".into()));
            assert_eq!(batch.value(0, 1), Value::Int64(2));
            assert_eq!(batch.value(1, 1), Value::Undefined);
        }
    }

    #[test]
    fn test_validity_only_when_nulls_present() {
        let arena = Bump::new();
        let mut builder = ColumnBuilder::new(&ColumnType::Int64);
        builder.push(&Value::Int64(7)).unwrap();
        builder.push(&Value::Int64(8)).unwrap();
        let column = builder.freeze(&arena);
        assert!(column.validity().is_none());

        let mut builder = ColumnBuilder::new(&ColumnType::Int64);
        builder.push(&Value::Int64(7)).unwrap();
        builder.push(&Value::Undefined).unwrap();
        let column = builder.freeze(&arena);
        assert!(column.validity().is_some());
        // SAFETY: arena alive.
        unsafe {
            assert!(column.is_valid(0));
            assert!(!column.is_valid(1));
        }
    }

    #[test]
    fn test_int_promotes_to_float_column() {
        let arena = Bump::new();
        let mut builder = ColumnBuilder::new(&ColumnType::Float64);
        builder.push(&Value::Int64(3)).unwrap();
        let column = builder.freeze(&arena);
        // SAFETY: arena alive.
        assert_eq!(unsafe { column.value(0) }, Value::Float64(3.0));
    }

    #[test]
    fn test_type_mismatch_fails() {
        let mut builder = ColumnBuilder::new(&ColumnType::Bool);
        let err = builder.push(&Value::Int64(1)).unwrap_err();
        assert!(err.to_string().contains("Bool"));
    }

    #[test]
    fn test_nested_list_roundtrip() {
        let arena = Bump::new();
        let ty = ColumnType::List(Box::new(ColumnType::Int64));
        let mut builder = ColumnBuilder::new(&ty);
        builder.push(&Value::List(vec![Value::Int64(1), Value::Int64(2)])).unwrap();
        builder.push(&Value::Undefined).unwrap();
        builder.push(&Value::List(vec![Value::Int64(3)])).unwrap();
        let column = builder.freeze(&arena);
        // SAFETY: arena alive.
        unsafe {
            assert_eq!(column.value(0), Value::List(vec![Value::Int64(1), Value::Int64(2)]));
            assert_eq!(column.value(1), Value::Undefined);
            assert_eq!(column.value(2), Value::List(vec![Value::Int64(3)]));
        }
    }
}
