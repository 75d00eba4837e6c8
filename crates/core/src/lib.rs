// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod error;
mod schema;
mod value;

pub use error::{Error, Result};
pub use schema::{BatchSchema, ColumnType, FieldDef, SchemaRef};
pub use value::Value;
