// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Process-wide scan-format registry.
//!
//! Scan nodes resolve a reader factory by split format. Built-in formats are
//! installed lazily on first use; embedders may register additional formats
//! once, before execution. `reset_readers` restores the built-ins for test
//! isolation.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use quiver_core::{Error, Result};

use crate::source::{JsonLinesReader, SplitReader};
use crate::split::{ScanFormat, Split};

pub type ReaderFactory = fn(&Split) -> Result<Box<dyn SplitReader>>;

static READERS: Lazy<RwLock<HashMap<ScanFormat, ReaderFactory>>> =
    Lazy::new(|| RwLock::new(builtin_readers()));

fn builtin_readers() -> HashMap<ScanFormat, ReaderFactory> {
    let mut readers = HashMap::new();
    readers.insert(ScanFormat::JsonLines, open_json_lines as ReaderFactory);
    readers
}

fn open_json_lines(split: &Split) -> Result<Box<dyn SplitReader>> {
    Ok(Box::new(JsonLinesReader::open(split)?))
}

/// Open a reader for `split` through the registered factory.
pub fn reader_for(split: &Split) -> Result<Box<dyn SplitReader>> {
    let factory = READERS
        .read()
        .get(&split.format)
        .copied()
        .ok_or_else(|| Error::engine(format!("no reader registered for format {}", split.format)))?;
    factory(split)
}

/// Register a reader factory for `format`. Check-and-set: registering a
/// format twice is an error rather than a silent overwrite.
pub fn register_reader(format: ScanFormat, factory: ReaderFactory) -> Result<()> {
    let mut readers = READERS.write();
    if readers.contains_key(&format) {
        return Err(Error::engine(format!("reader for format {} already registered", format)));
    }
    readers.insert(format, factory);
    Ok(())
}

/// Restore the built-in registry. Test isolation hook.
#[doc(hidden)]
pub fn reset_readers() {
    *READERS.write() = builtin_readers();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_json_lines_registered() {
        reset_readers();
        let split = Split {
            path: "/nonexistent/quiver".into(),
            start: 0,
            length: 0,
            format: ScanFormat::JsonLines,
        };
        // Factory resolves; opening the missing file is the failure.
        let err = reader_for(&split).err().unwrap();
        assert!(err.to_string().contains("open"));
    }

    #[test]
    fn test_double_registration_rejected() {
        reset_readers();
        let result = register_reader(ScanFormat::JsonLines, |split| {
            Ok(Box::new(JsonLinesReader::open(split)?))
        });
        assert!(result.is_err());
        reset_readers();
    }
}
