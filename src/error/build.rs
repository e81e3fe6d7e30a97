//! Contains the error type for building an index.

use crate::error::insert::InsertError;
use crate::error::LoadHeaderError;
use std::io;
use thiserror::Error;

/// Error from IndexBuilder::build().
#[derive(Debug, Error)]
pub enum BuildError {
    /// Config was set read-only.
    #[error("read only")]
    ReadOnly,
    /// Error opening the data file or reading its header.
    #[error("data open failed: {0}")]
    DataFileOpen(LoadHeaderError),
    /// Error creating or initializing the index file.
    #[error("index create failed: {0}")]
    IndexFileCreate(io::Error),
    /// Error reading a key from the data file.
    #[error("read key: {0}")]
    ReadKey(io::Error),
    /// A record starts beyond the range an index slot can address.
    #[error("record offset {0} does not fit in an index slot")]
    OffsetOverflow(u64),
    /// Error inserting a key into the index.
    #[error("insert: {0}")]
    Insert(#[from] InsertError),
    /// Error writing the level marker or syncing the index file.
    #[error("finish index: {0}")]
    Finish(io::Error),
}
