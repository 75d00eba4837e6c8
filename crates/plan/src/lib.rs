// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Plan documents: loading from either wire format and conversion into an
//! executable operator tree plus the splits each scan consumes.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use quiver_core::Result;

mod convert;
mod document;
mod loader;

pub use convert::{ConvertedPlan, convert};
pub use document::{PLAN_VERSION, PlanDocument, PlanNode};
pub use loader::{from_binary, from_json_text};
