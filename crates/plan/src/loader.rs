// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Plan intake from the two wire formats.
//!
//! No content sniffing: the caller picks the format. Every decode failure
//! maps to [`Error::ParseFailure`] with the decoder's message preserved.

use quiver_core::{Error, Result};
use tracing::instrument;

use crate::document::{PLAN_VERSION, PlanDocument};

/// Decode a text-serialized (JSON) plan document.
#[instrument(name = "plan::from_json_text", level = "trace", skip_all)]
pub fn from_json_text(text: &str) -> Result<PlanDocument> {
    let doc: PlanDocument =
        serde_json::from_str(text).map_err(|err| Error::parse(err.to_string()))?;
    check_version(doc)
}

/// Decode a binary-serialized (postcard) plan document.
#[instrument(name = "plan::from_binary", level = "trace", skip_all)]
pub fn from_binary(bytes: &[u8]) -> Result<PlanDocument> {
    let doc: PlanDocument =
        postcard::from_bytes(bytes).map_err(|err| Error::parse(err.to_string()))?;
    check_version(doc)
}

fn check_version(doc: PlanDocument) -> Result<PlanDocument> {
    if doc.version > PLAN_VERSION {
        return Err(Error::parse(format!(
            "unsupported plan version {}, newest supported is {}",
            doc.version, PLAN_VERSION
        )));
    }
    Ok(doc)
}
