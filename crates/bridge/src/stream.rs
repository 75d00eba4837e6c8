// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The result stream: host-side iteration over a task's batches.

use std::fmt;

use quiver_core::Result;
use tracing::instrument;

use crate::batch::BatchWrapper;
use crate::handle::TaskHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Active,
    Exhausted,
}

/// Pull-through adapter over one task. Single consumer; exactly one task
/// pull per `advance()`, no prefetch.
pub struct ResultStream {
    handle: TaskHandle,
    state: StreamState,
}

impl ResultStream {
    pub fn new(handle: TaskHandle) -> Self {
        Self { handle, state: StreamState::Active }
    }

    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == StreamState::Exhausted
    }

    /// Next batch, or `None` once the task is drained.
    ///
    /// Exhaustion is terminal and idempotent: after the first `None` the
    /// task is never pulled again. A task fault also exhausts the stream;
    /// a faulted stream must not be resumed.
    #[instrument(name = "stream::advance", level = "trace", skip_all)]
    pub fn advance(&mut self) -> Result<Option<BatchWrapper>> {
        if self.state == StreamState::Exhausted {
            return Ok(None);
        }
        match self.handle.pull() {
            Ok(Some(batch)) => Ok(Some(BatchWrapper::new(self.handle.clone(), batch))),
            Ok(None) => {
                self.state = StreamState::Exhausted;
                Ok(None)
            }
            Err(err) => {
                self.state = StreamState::Exhausted;
                Err(err)
            }
        }
    }
}

impl fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultStream").field("state", &self.state).finish_non_exhaustive()
    }
}

impl Iterator for ResultStream {
    type Item = Result<BatchWrapper>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use quiver_core::{BatchSchema, ColumnType, Error, FieldDef, SchemaRef, Value};
    use quiver_engine::{BatchBuilder, PullSource, RowBatch};

    use super::*;

    /// Emits `batches` single-row batches, counting every pull.
    struct CountingSource {
        schema: SchemaRef,
        batches: usize,
        pulls: AtomicUsize,
        fault_after: Option<usize>,
        arena: bumpalo_arena::SharedArena,
    }

    mod bumpalo_arena {
        pub struct SharedArena(bumpalo::Bump);

        // Test-only: the fake source is driven from one thread.
        unsafe impl Sync for SharedArena {}

        impl SharedArena {
            pub fn new() -> Self {
                Self(bumpalo::Bump::new())
            }

            pub fn get(&self) -> &bumpalo::Bump {
                &self.0
            }
        }

        impl std::panic::RefUnwindSafe for SharedArena {}
    }

    impl CountingSource {
        fn new(batches: usize, fault_after: Option<usize>) -> Self {
            let schema =
                Arc::new(BatchSchema::new(vec![FieldDef::new("n", ColumnType::Int64, false)]));
            Self {
                schema,
                batches,
                pulls: AtomicUsize::new(0),
                fault_after,
                arena: bumpalo_arena::SharedArena::new(),
            }
        }
    }

    impl PullSource for CountingSource {
        fn pull(&self) -> quiver_core::Result<Option<RowBatch>> {
            let pull = self.pulls.fetch_add(1, Ordering::SeqCst);
            if Some(pull) == self.fault_after {
                return Err(Error::engine("synthetic fault"));
            }
            if pull >= self.batches {
                return Ok(None);
            }
            let mut builder = BatchBuilder::new(self.schema.clone());
            builder.push_row(&[Value::Int64(pull as i64)]).unwrap();
            Ok(Some(builder.finish(self.arena.get())))
        }

        fn schema(&self) -> SchemaRef {
            self.schema.clone()
        }
    }

    #[test]
    fn test_exhaustion_is_idempotent_without_repulling() {
        let source = Arc::new(CountingSource::new(2, None));
        let mut stream = ResultStream::new(TaskHandle::new(source.clone()));
        assert!(stream.advance().unwrap().is_some());
        assert!(stream.advance().unwrap().is_some());
        assert!(stream.advance().unwrap().is_none());
        assert_eq!(source.pulls.load(Ordering::SeqCst), 3);

        // Further advances never reach the task again.
        assert!(stream.advance().unwrap().is_none());
        assert!(stream.advance().unwrap().is_none());
        assert_eq!(source.pulls.load(Ordering::SeqCst), 3);
        assert!(stream.is_exhausted());
    }

    #[test]
    fn test_fault_exhausts_stream() {
        let source = Arc::new(CountingSource::new(5, Some(1)));
        let mut stream = ResultStream::new(TaskHandle::new(source.clone()));
        assert!(stream.advance().unwrap().is_some());
        let err = stream.advance().unwrap_err();
        assert_eq!(err, Error::engine("synthetic fault"));
        // Terminal: no retry, no further pull.
        assert!(stream.advance().unwrap().is_none());
        assert_eq!(source.pulls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_each_batch_pins_the_task() {
        let source = Arc::new(CountingSource::new(2, None));
        let handle = TaskHandle::new(source);
        let base = handle.ref_count();
        let mut stream = ResultStream::new(handle.clone());
        assert_eq!(handle.ref_count(), base + 1);
        let batch = stream.advance().unwrap().unwrap();
        assert_eq!(handle.ref_count(), base + 2);
        drop(batch);
        assert_eq!(handle.ref_count(), base + 1);
    }

    #[test]
    fn test_iterator_drains() {
        let source = Arc::new(CountingSource::new(3, None));
        let stream = ResultStream::new(TaskHandle::new(source));
        let batches: Vec<_> = stream.collect::<quiver_core::Result<_>>().unwrap();
        assert_eq!(batches.len(), 3);
    }
}
