// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Error taxonomy shared by every quiver crate.
//!
//! One variant per failure class; no failure is ever retried automatically.
//! Engine messages are carried verbatim so the caller sees what the engine
//! saw.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The plan document is malformed in its declared format. Raised at load
    /// time, before any execution task exists.
    #[error("plan parse failure: {0}")]
    ParseFailure(String),

    /// The engine raised a runtime error during planning or batch
    /// production. The stream that produced it is terminal.
    #[error("engine fault: {0}")]
    EngineFault(String),

    /// Access to a batch wrapper or row view after the batch was consumed by
    /// a columnar export. Always a programming error at the call site.
    #[error("batch already consumed by columnar export")]
    StaleBatch,

    /// The batch contains a type the interchange format cannot represent.
    /// The source batch is left unconsumed.
    #[error("columnar export failed: {0}")]
    ExportFailed(String),

    /// The interchange importer rejected the exported structures. The source
    /// batch was already handed off and stays consumed.
    #[error("columnar import rejected: {0}")]
    ImportRejected(String),
}

impl Error {
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::ParseFailure(msg.into())
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Error::EngineFault(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Error::ExportFailed(msg.into())
    }

    pub fn import(msg: impl Into<String>) -> Self {
        Error::ImportRejected(msg.into())
    }
}
