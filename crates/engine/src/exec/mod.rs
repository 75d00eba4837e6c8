// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Volcano-style pull execution.
//!
//! Every operator is a [`QueryNode`]: `initialize` once, then `next` until
//! it returns `None`. Nodes allocate result batches from the task arena
//! passed down on every call; batches flow upward without copies.

use bumpalo::Bump;
use quiver_core::{Result, SchemaRef};

use crate::batch::RowBatch;

mod filter;
mod map;
mod scan;
mod take;
mod values;

pub use filter::FilterNode;
pub use map::{MapColumn, MapNode};
pub use scan::ScanNode;
pub use take::TakeNode;
pub use values::ValuesNode;

pub struct ExecutionContext {
    /// Upper bound on rows per produced batch.
    pub batch_size: usize,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self { batch_size: 1024 }
    }
}

pub trait QueryNode: Send {
    fn initialize(&mut self, ctx: &ExecutionContext) -> Result<()>;

    fn next(&mut self, arena: &Bump, ctx: &ExecutionContext) -> Result<Option<RowBatch>>;

    /// Output schema, known before execution starts.
    fn schema(&self) -> SchemaRef;

    /// One line for this operator, then its input via [`Describe::child`].
    fn describe(&self, out: &mut Describe<'_>);
}

/// Indenting sink for [`QueryNode::describe`].
pub struct Describe<'a> {
    out: &'a mut String,
    depth: usize,
}

impl<'a> Describe<'a> {
    pub fn new(out: &'a mut String) -> Self {
        Self { out, depth: 0 }
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    pub fn child(&mut self, node: &dyn QueryNode) {
        self.depth += 1;
        node.describe(self);
        self.depth -= 1;
    }
}
