//! Contains the error for the insert() function.

use std::io;
use thiserror::Error;

/// Custom error type for Inserts.
#[derive(Debug, Error)]
pub enum InsertError {
    /// Key or offset is negative, this includes the reserved empty slot value -1.
    #[error("invalid entry, key {0} offset {1}")]
    InvalidEntry(i32, i32),
    /// Index was opened read-only (for queries).
    #[error("read only")]
    ReadOnly,
    /// The keys bucket is full of entries for that same key, splitting can not make room.
    #[error("bucket for key {0} holds only that key")]
    Unsplittable(i32),
    /// Splitting would grow the address space past what an i32 key can reach.
    #[error("can not split past level {0}")]
    LevelOverflow(u32),
    /// Error reading or writing the bucket file.
    #[error("io: {0}")]
    IO(#[from] io::Error),
}
