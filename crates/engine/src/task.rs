// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! The live execution task: arena, operator tree and split gate.
//!
//! An [`ExecutionTask`] owns the bump arena every result batch is allocated
//! from, which is why downstream holders of a batch must keep the task
//! alive. The bridge wraps the task in a reference-counted handle and pins
//! it from every object that can still read batch memory.

use std::collections::HashMap;
use std::panic::RefUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bumpalo::Bump;
use quiver_core::{Error, Result, SchemaRef};
use tracing::instrument;

use crate::batch::RowBatch;
use crate::exec::{ExecutionContext, QueryNode};
use crate::split::{OperatorId, Split, SplitQueue};

static LIVE_TASKS: AtomicUsize = AtomicUsize::new(0);

/// Number of execution tasks currently alive in this process. A gauge, used
/// by callers to assert that parse failures never construct a task and that
/// exports do not leak one.
pub fn live_task_count() -> usize {
    LIVE_TASKS.load(Ordering::SeqCst)
}

/// The narrow boundary the bridge pulls batches through.
///
/// `Send + Sync + RefUnwindSafe` because a handle to the source is smuggled
/// into exported interchange buffers as their allocation owner.
pub trait PullSource: Send + Sync + RefUnwindSafe {
    fn pull(&self) -> Result<Option<RowBatch>>;

    fn schema(&self) -> SchemaRef;
}

struct TaskCore {
    arena: Bump,
    root: Box<dyn QueryNode>,
    initialized: bool,
}

pub struct ExecutionTask {
    core: Mutex<TaskCore>,
    queues: HashMap<OperatorId, Arc<SplitQueue>>,
    ctx: ExecutionContext,
    schema: SchemaRef,
}

impl ExecutionTask {
    /// `queues` maps every split-consuming operator to the queue its scan
    /// node polls. Operators without splits simply do not appear.
    pub fn new(
        root: Box<dyn QueryNode>,
        queues: HashMap<OperatorId, Arc<SplitQueue>>,
        ctx: ExecutionContext,
    ) -> Self {
        LIVE_TASKS.fetch_add(1, Ordering::SeqCst);
        let schema = root.schema();
        Self { core: Mutex::new(TaskCore { arena: Bump::new(), root, initialized: false }), queues, ctx, schema }
    }

    pub fn add_split(&self, operator: OperatorId, split: Split) -> Result<()> {
        self.queue(operator)?.push(split)
    }

    pub fn no_more_splits(&self, operator: OperatorId) -> Result<()> {
        self.queue(operator)?.close()
    }

    pub fn operator_ids(&self) -> impl Iterator<Item = OperatorId> + '_ {
        self.queues.keys().copied()
    }

    fn queue(&self, operator: OperatorId) -> Result<&Arc<SplitQueue>> {
        self.queues
            .get(&operator)
            .ok_or_else(|| Error::engine(format!("operator {} does not take splits", operator)))
    }

    /// All split queues closed; the task may start producing.
    fn ready(&self) -> Result<bool> {
        for queue in self.queues.values() {
            if !queue.is_closed()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl PullSource for ExecutionTask {
    #[instrument(name = "task::pull", level = "trace", skip_all)]
    fn pull(&self) -> Result<Option<RowBatch>> {
        if !self.ready()? {
            return Err(Error::engine("pull before no_more_splits on every source"));
        }
        let mut core = self.core.lock().map_err(|_| Error::engine("task mutex poisoned"))?;
        let core = &mut *core;
        if !core.initialized {
            core.root.initialize(&self.ctx)?;
            core.initialized = true;
        }
        core.root.next(&core.arena, &self.ctx)
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }
}

impl Drop for ExecutionTask {
    fn drop(&mut self) {
        LIVE_TASKS.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use quiver_core::{BatchSchema, ColumnType, FieldDef, Value};

    use super::*;
    use crate::exec::{ScanNode, ValuesNode};
    use crate::split::ScanFormat;

    fn values_task() -> ExecutionTask {
        let schema = Arc::new(BatchSchema::new(vec![FieldDef::new("n", ColumnType::Int64, false)]));
        let rows = (0..3).map(|n| vec![Value::Int64(n)]).collect();
        ExecutionTask::new(
            Box::new(ValuesNode::new(schema, rows)),
            HashMap::new(),
            ExecutionContext::default(),
        )
    }

    #[test]
    fn test_pull_drains_and_stays_exhausted() {
        let task = values_task();
        let batch = task.pull().unwrap().unwrap();
        assert_eq!(batch.row_count(), 3);
        assert!(task.pull().unwrap().is_none());
        assert!(task.pull().unwrap().is_none());
    }

    #[test]
    fn test_pull_gated_on_split_setup() {
        let schema = Arc::new(BatchSchema::new(vec![FieldDef::new("n", ColumnType::Int64, false)]));
        let queue = Arc::new(SplitQueue::new());
        let operator = OperatorId(0);
        let mut queues = HashMap::new();
        queues.insert(operator, queue.clone());
        let task = ExecutionTask::new(
            Box::new(ScanNode::new(schema, queue)),
            queues,
            ExecutionContext::default(),
        );

        let err = task.pull().unwrap_err();
        assert!(err.to_string().contains("no_more_splits"));

        task.no_more_splits(operator).unwrap();
        assert!(task.pull().unwrap().is_none());
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let task = values_task();
        let split = Split {
            path: "/tmp/none".into(),
            start: 0,
            length: 0,
            format: ScanFormat::JsonLines,
        };
        assert!(task.add_split(OperatorId(9), split).is_err());
        assert!(task.no_more_splits(OperatorId(9)).is_err());
    }

    #[test]
    fn test_live_task_gauge() {
        let before = live_task_count();
        let task = values_task();
        assert_eq!(live_task_count(), before + 1);
        drop(task);
        assert_eq!(live_task_count(), before);
    }
}
