// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Zero-copy export into the Arrow columnar interchange format.
//!
//! Every exported buffer is a view into the producing task's arena, never a
//! copy. Lifetime is carried by an [`ExportPin`]: one pin per export, shared
//! as custom-allocation owner by all of the export's buffers, holding a
//! clone of the task handle. Arrow drops the pin when the importer releases
//! the last buffer, and that release is the only thing that unpins the
//! task. No destructor ordering is assumed anywhere.
//!
//! Error discipline: the schema mapping is validated before the batch is
//! moved out of its wrapper, so `ExportFailed` leaves the wrapper usable.
//! Failures after hand-off to Arrow surface as `ImportRejected` and the
//! batch stays consumed.

use std::sync::Arc;

use arrow::array::{Array, ArrayData, StructArray, make_array};
use arrow::buffer::Buffer;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ffi::{FFI_ArrowArray, FFI_ArrowSchema, from_ffi, to_ffi};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use quiver_core::{BatchSchema, ColumnType, Error, Result};
use quiver_engine::{ColumnBuffers, ColumnData, RawBuffer};
use tracing::instrument;

use crate::batch::BatchShared;
use crate::handle::TaskHandle;

/// Allocation owner installed on every exported buffer. Pins the task (and
/// with it the arena the buffers point into) until Arrow releases the last
/// buffer of the export. Satisfies [`arrow::alloc::Allocation`] through
/// arrow-buffer's blanket impl for `RefUnwindSafe + Send + Sync` types.
struct ExportPin {
    _handle: TaskHandle,
}

/// Map one column type to its Arrow equivalent. `Undefined` columns have no
/// interchange representation.
fn column_type_to_arrow(ty: &ColumnType) -> Result<DataType> {
    match ty {
        ColumnType::Undefined => {
            Err(Error::export("column type Undefined has no interchange representation"))
        }
        ColumnType::Bool => Ok(DataType::Boolean),
        ColumnType::Int64 => Ok(DataType::Int64),
        ColumnType::Float64 => Ok(DataType::Float64),
        ColumnType::Utf8 => Ok(DataType::Utf8),
        ColumnType::List(inner) => {
            let item = column_type_to_arrow(inner)?;
            Ok(DataType::List(Arc::new(Field::new_list_field(item, true))))
        }
    }
}

fn schema_to_arrow(schema: &BatchSchema) -> Result<Schema> {
    let fields = schema
        .fields
        .iter()
        .map(|field| {
            let ty = column_type_to_arrow(&field.ty)
                .map_err(|err| match err {
                    Error::ExportFailed(msg) => {
                        Error::export(format!("column '{}': {}", field.name, msg))
                    }
                    other => other,
                })?;
            Ok(Field::new(&field.name, ty, field.nullable))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::new(fields))
}

/// Wrap one arena buffer as an Arrow `Buffer` without copying.
fn view_buffer(raw: &RawBuffer, pin: &Arc<ExportPin>) -> Buffer {
    // SAFETY: the pointer and length describe live arena memory, and the
    // pin keeps the owning task (hence the arena) alive until Arrow drops
    // this buffer.
    unsafe { Buffer::from_custom_allocation(raw.as_ptr(), raw.len(), pin.clone()) }
}

fn column_to_array_data(column: &ColumnData, pin: &Arc<ExportPin>) -> Result<ArrayData> {
    let ty = column_type_to_arrow(column.ty())?;
    let mut builder = ArrayData::builder(ty).len(column.row_count());
    if let Some(validity) = column.validity() {
        builder = builder.null_bit_buffer(Some(view_buffer(validity, pin)));
    }
    builder = match column.buffers() {
        ColumnBuffers::Undefined => {
            return Err(Error::export("column type Undefined has no interchange representation"));
        }
        ColumnBuffers::Bool { bits } => builder.add_buffer(view_buffer(bits, pin)),
        ColumnBuffers::Int64 { values } | ColumnBuffers::Float64 { values } => {
            builder.add_buffer(view_buffer(values, pin))
        }
        ColumnBuffers::Utf8 { offsets, bytes } => {
            builder.add_buffer(view_buffer(offsets, pin)).add_buffer(view_buffer(bytes, pin))
        }
        ColumnBuffers::List { offsets, child } => builder
            .add_buffer(view_buffer(offsets, pin))
            .add_child_data(column_to_array_data(child, pin)?),
    };
    // The batch left its wrapper already; layout rejections are import-side.
    builder.build().map_err(|err| Error::import(err.to_string()))
}

/// Move the batch out of `shared` and export it as an Arrow [`RecordBatch`].
#[instrument(name = "export::batch", level = "trace", skip_all)]
pub(crate) fn export_batch(shared: &BatchShared) -> Result<RecordBatch> {
    // Validate the type mapping while the batch is still in place, so an
    // unrepresentable column leaves the wrapper usable.
    let arrow_schema = shared.with_batch(|batch| schema_to_arrow(batch.schema()))??;
    let batch = shared.take()?;

    let pin = Arc::new(ExportPin { _handle: shared.handle().clone() });
    let columns = batch
        .columns()
        .iter()
        .map(|column| column_to_array_data(column, &pin).map(make_array))
        .collect::<Result<Vec<_>>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(batch.row_count()));
    RecordBatch::try_new_with_options(Arc::new(arrow_schema), columns, &options)
        .map_err(|err| Error::import(err.to_string()))
}

/// Export through the Arrow C Data Interface: the whole batch as one struct
/// array plus its schema, each carrying a release callback for the importer.
#[instrument(name = "export::batch_ffi", level = "trace", skip_all)]
pub(crate) fn export_batch_ffi(
    shared: &BatchShared,
) -> Result<(FFI_ArrowArray, FFI_ArrowSchema)> {
    let record = export_batch(shared)?;
    let data = StructArray::from(record).into_data();
    to_ffi(&data).map_err(|err| Error::import(err.to_string()))
}

/// Import a batch handed over through the C Data Interface.
pub fn import_batch(array: FFI_ArrowArray, schema: &FFI_ArrowSchema) -> Result<RecordBatch> {
    // SAFETY: `array` is consumed by value, so it is imported exactly once,
    // and its buffers stay valid until its release callback runs.
    let data = unsafe { from_ffi(array, schema) }.map_err(|err| Error::import(err.to_string()))?;
    let array = StructArray::from(data);
    Ok(RecordBatch::from(array))
}
