// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The cross-runtime result bridge.
//!
//! Load a plan document in either wire format, execute it, and consume the
//! results as a stream of refcounted batch wrappers that can be rendered as
//! text, iterated row by row, or exported zero-copy into Arrow.
//!
//! ```no_run
//! use quiver_bridge::from_json;
//!
//! # fn main() -> quiver_bridge::Result<()> {
//! let mut stream = from_json(r#"{"root": {"Values": {"schema": [], "rows": []}}}"#)?;
//! while let Some(batch) = stream.advance()? {
//!     println!("{}", batch.to_text()?);
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use quiver_core::{Error, Result};

mod batch;
mod export;
mod handle;
mod render;
mod stream;

pub use batch::{BatchWrapper, RowIter, RowView};
pub use export::import_batch;
pub use handle::TaskHandle;
pub use stream::ResultStream;

use std::sync::Arc;

use quiver_engine::{ExecutionTask, exec::ExecutionContext};
use quiver_plan::PlanDocument;
use tracing::instrument;

/// Load a text-serialized plan and start executing it.
pub fn from_json(text: &str) -> Result<ResultStream> {
    execute_document(&quiver_plan::from_json_text(text)?)
}

/// Load a binary-serialized plan and start executing it.
pub fn from_binary(bytes: &[u8]) -> Result<ResultStream> {
    execute_document(&quiver_plan::from_binary(bytes)?)
}

/// Convert a plan document, attach its splits, and wrap the task in a
/// result stream. Nothing executes until the first `advance()`.
#[instrument(name = "bridge::execute_document", level = "trace", skip_all)]
pub fn execute_document(doc: &PlanDocument) -> Result<ResultStream> {
    let mut plan = quiver_plan::convert(doc)?;
    let task = ExecutionTask::new(plan.root, plan.queues, ExecutionContext::default());
    for (operator, splits) in plan.splits.drain() {
        for split in splits {
            task.add_split(operator, split)?;
        }
    }
    for operator in task.operator_ids().collect::<Vec<_>>() {
        task.no_more_splits(operator)?;
    }
    Ok(ResultStream::new(TaskHandle::new(Arc::new(task))))
}
