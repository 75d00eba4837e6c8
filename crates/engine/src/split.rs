// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Data-source splits and the per-operator split queue.
//!
//! A split names one physical chunk of data (path, byte range, format) for
//! a scan operator. All splits must be attached and the queue closed before
//! the task's first pull; the task enforces that gate.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use quiver_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Identifies one operator inside a converted plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorId(pub u32);

impl std::fmt::Display for OperatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// On-disk encoding of a scan source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanFormat {
    /// Newline-delimited JSON, one object per row.
    JsonLines,
}

impl std::fmt::Display for ScanFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanFormat::JsonLines => f.write_str("jsonlines"),
        }
    }
}

/// One physical chunk of data for a scan operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub path: PathBuf,
    pub start: u64,
    pub length: u64,
    pub format: ScanFormat,
}

#[derive(Debug, Default)]
struct QueueInner {
    splits: VecDeque<Split>,
    closed: bool,
}

/// FIFO of pending splits for one scan operator. Shared between the task
/// (attach side) and the scan node (consume side).
#[derive(Debug, Default)]
pub struct SplitQueue {
    inner: Mutex<QueueInner>,
}

impl SplitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, split: Split) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.closed {
            return Err(Error::engine("cannot add split after no_more_splits"));
        }
        inner.splits.push_back(split);
        Ok(())
    }

    pub fn close(&self) -> Result<()> {
        self.lock()?.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> Result<bool> {
        Ok(self.lock()?.closed)
    }

    pub fn pop(&self) -> Result<Option<Split>> {
        Ok(self.lock()?.splits.pop_front())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, QueueInner>> {
        self.inner.lock().map_err(|_| Error::engine("split queue mutex poisoned"))
    }
}
