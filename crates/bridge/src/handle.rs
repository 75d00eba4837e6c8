// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The reference-counted task handle every downstream object holds.
//!
//! The count is the sole synchronization primitive for batch memory: the
//! task and its arena are dropped exactly when the last clone goes away,
//! whether that clone sits in a stream, a batch wrapper, a row view or an
//! exported interchange buffer's allocation owner.

use std::sync::Arc;

use quiver_core::{Result, SchemaRef};
use quiver_engine::{PullSource, RowBatch};

/// Shared handle to a live pull source.
#[derive(Clone)]
pub struct TaskHandle {
    inner: Arc<dyn PullSource>,
}

impl TaskHandle {
    pub fn new(source: Arc<dyn PullSource>) -> Self {
        Self { inner: source }
    }

    pub fn pull(&self) -> Result<Option<RowBatch>> {
        self.inner.pull()
    }

    pub fn schema(&self) -> SchemaRef {
        self.inner.schema()
    }

    /// Number of live clones of this handle. Observability for tests and
    /// leak diagnosis; never used for control flow.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
