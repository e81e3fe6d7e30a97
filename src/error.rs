//! Implements the errors for a linear hash index and its data file.

pub mod build;
pub mod insert;

use std::io;
use thiserror::Error;

/// Error on loading a file (index or data) header.
#[derive(Debug, Error)]
pub enum LoadHeaderError {
    /// A count or width in the data file header was negative.
    #[error("invalid data header field {0}: {1}")]
    InvalidField(&'static str, i32),
    /// The trailing level marker of the index file is out of range.
    #[error("invalid index level {0}")]
    InvalidLevel(i32),
    /// The index file is not a whole number of buckets followed by the level marker.
    #[error("index file length {0} does not match level {1} with {2} elements per bucket")]
    InvalidIndexLength(u64, u32, u16),
    /// An underlying IO error while loading the header.
    #[error("io: {0}")]
    IO(#[from] io::Error),
}

/// Error decoding a fixed length record.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Fewer bytes were available than the record length requires.
    #[error("truncated record, needed {0} bytes but only {1} available")]
    TruncatedRecord(usize, usize),
}

/// Error on reading a record from the data file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Seeking or reading the data file failed.
    #[error("io: {0}")]
    IO(#[from] io::Error),
    /// The bytes at the offset did not decode to a record.
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
}

/// Error on opening an index and data file for queries.
#[derive(Debug, Error)]
pub enum OpenError {
    /// Error opening the data file or reading its header.
    #[error("data open failed: {0}")]
    DataFileOpen(LoadHeaderError),
    /// Error opening the index file or reading its level marker.
    #[error("index open failed: {0}")]
    IndexFileOpen(LoadHeaderError),
}

/// Error answering a query.  Note that a missing key is NOT an error.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The index bucket could not be read.
    #[error("index lookup: {0}")]
    Lookup(io::Error),
    /// The index pointed at a record that could not be read.
    #[error("record fetch: {0}")]
    Fetch(#[from] FetchError),
}

/// An interactive query key that is not a non-negative integer.
#[derive(Debug, Error)]
#[error("malformed key {0:?}, expected a non-negative integer")]
pub struct MalformedKeyError(pub String);
