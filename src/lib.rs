#![deny(missing_docs)]

//! Crate to implement a disk resident key lookup over flat files of fixed length records.
//! A data file holds a small header and then records that all have the same length, so a record
//! is addressed by offset arithmetic alone.  A second file holds the index, a linear hash table of
//! (key, offset) buckets that grows one doubling at a time as buckets overflow
//! (https://en.wikipedia.org/wiki/Linear_hashing).
//!
//! An index is built once by one writer and then opened read-only by any number of query
//! processes.  The trailing level marker in the index file is all a reader needs to rebuild the
//! address function.

pub mod db;
pub mod db_config;
pub mod db_files;
pub mod db_record;
pub mod error;
