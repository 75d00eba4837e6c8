// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use quiver_core::Result;

mod batch;
mod builder;
pub mod exec;
mod expr;
mod registry;
mod source;
mod split;
mod task;

pub use batch::{ColumnBuffers, ColumnData, RawBuffer, RowBatch};
pub use builder::{BatchBuilder, ColumnBuilder};
pub use exec::MapColumn;
pub use expr::{BinaryOp, Expr};
pub use registry::{ReaderFactory, reader_for, register_reader, reset_readers};
pub use source::{JsonLinesReader, SplitReader};
pub use split::{OperatorId, ScanFormat, Split, SplitQueue};
pub use task::{ExecutionTask, PullSource, live_task_count};
