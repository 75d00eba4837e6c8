// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Split readers turn one [`Split`] into a sequence of rows.
//!
//! Byte-range discipline matches the usual split contract: a reader whose
//! range starts mid-file skips its first line (it belongs to the previous
//! split, which reads one line past its own end), and every reader keeps
//! reading until a line *starts* past the end of its range. A line starting
//! exactly on a boundary is read by the split that ends there and skipped
//! by the one that starts there.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::PathBuf;

use quiver_core::{BatchSchema, ColumnType, Error, Result, Value};

use crate::split::Split;

/// Pull-based row reader over one split.
pub trait SplitReader: Send {
    fn next_row(&mut self, schema: &BatchSchema) -> Result<Option<Vec<Value>>>;
}

/// Newline-delimited JSON, one object per row, keyed by column name.
/// Missing keys and JSON nulls read as `Undefined` (a typed null once the
/// column builder sees them).
pub struct JsonLinesReader {
    reader: BufReader<File>,
    path: PathBuf,
    pos: u64,
    end: u64,
}

impl JsonLinesReader {
    pub fn open(split: &Split) -> Result<Self> {
        let file = File::open(&split.path)
            .map_err(|err| Error::engine(format!("open {}: {}", split.path.display(), err)))?;
        let mut reader = BufReader::new(file);
        let mut pos = split.start;
        if split.start > 0 {
            reader
                .seek(SeekFrom::Start(split.start))
                .map_err(|err| Error::engine(format!("seek {}: {}", split.path.display(), err)))?;
            // The first line belongs to the previous split, even when the
            // range starts exactly on a line boundary.
            let mut skipped = Vec::new();
            let n = reader
                .read_until(b'\n', &mut skipped)
                .map_err(|err| Error::engine(format!("read {}: {}", split.path.display(), err)))?;
            pos += n as u64;
        }
        Ok(Self { reader, path: split.path.clone(), pos, end: split.start + split.length })
    }
}

impl SplitReader for JsonLinesReader {
    fn next_row(&mut self, schema: &BatchSchema) -> Result<Option<Vec<Value>>> {
        loop {
            // A line starting exactly at `end` still belongs to this split;
            // the next split skips it as its first line.
            if self.pos > self.end {
                return Ok(None);
            }
            let mut line = Vec::new();
            let n = self
                .reader
                .read_until(b'\n', &mut line)
                .map_err(|err| Error::engine(format!("read {}: {}", self.path.display(), err)))?;
            if n == 0 {
                return Ok(None);
            }
            self.pos += n as u64;
            let text = std::str::from_utf8(&line)
                .map_err(|err| Error::engine(format!("{}: invalid utf8: {}", self.path.display(), err)))?
                .trim();
            if text.is_empty() {
                continue;
            }
            let json: serde_json::Value = serde_json::from_str(text).map_err(|err| {
                Error::engine(format!("{}: malformed record: {}", self.path.display(), err))
            })?;
            return Some(record_to_row(&json, schema, &self.path)).transpose();
        }
    }
}

fn record_to_row(json: &serde_json::Value, schema: &BatchSchema, path: &PathBuf) -> Result<Vec<Value>> {
    let object = json
        .as_object()
        .ok_or_else(|| Error::engine(format!("{}: record is not an object", path.display())))?;
    schema
        .fields
        .iter()
        .map(|field| match object.get(&field.name) {
            None | Some(serde_json::Value::Null) => Ok(Value::Undefined),
            Some(json) => json_to_value(json, &field.ty).map_err(|err| match err {
                Error::EngineFault(msg) => {
                    Error::engine(format!("{}: column '{}': {}", path.display(), field.name, msg))
                }
                other => other,
            }),
        })
        .collect()
}

fn json_to_value(json: &serde_json::Value, ty: &ColumnType) -> Result<Value> {
    match (ty, json) {
        (ColumnType::Undefined, _) => Ok(Value::Undefined),
        (ColumnType::Bool, serde_json::Value::Bool(v)) => Ok(Value::Bool(*v)),
        (ColumnType::Int64, serde_json::Value::Number(n)) => n
            .as_i64()
            .map(Value::Int64)
            .ok_or_else(|| Error::engine(format!("{} is not a 64-bit integer", n))),
        (ColumnType::Float64, serde_json::Value::Number(n)) => n
            .as_f64()
            .map(Value::Float64)
            .ok_or_else(|| Error::engine(format!("{} is not a float", n))),
        (ColumnType::Utf8, serde_json::Value::String(v)) => Ok(Value::Utf8(v.clone())),
        (ColumnType::List(inner), serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| {
                if item.is_null() {
                    Ok(Value::Undefined)
                } else {
                    json_to_value(item, inner)
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (ty, json) => Err(Error::engine(format!("expected {}, got {}", ty, json))),
    }
}
