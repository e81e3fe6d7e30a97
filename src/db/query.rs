//! Point queries against a finished index and its data file.

use crate::db::data_file::DataFile;
use crate::db::hdx_index::LinearHashIndex;
use crate::db_config::IndexConfig;
use crate::db_record::FixedRecord;
use crate::error::{LoadHeaderError, MalformedKeyError, OpenError, QueryError};
use std::fs::{File, OpenOptions};
use tracing::info;

/// Outcome of a query.  Not finding a key is a normal result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<R> {
    /// The key is indexed, record was read from offset.
    Found {
        /// Byte offset of the record in the data file.
        offset: i32,
        /// The decoded record.
        record: R,
    },
    /// The key is not in the index.
    NotFound(i32),
}

impl<R> QueryResult<R> {
    /// Was the key found?
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// The record if found.
    pub fn record(self) -> Option<R> {
        match self {
            Self::Found { record, .. } => Some(record),
            Self::NotFound(_) => None,
        }
    }
}

/// Answers key lookups from an index and data file opened read-only.
#[derive(Debug)]
pub struct IndexQueryService<R: FixedRecord> {
    index: LinearHashIndex<File>,
    data_file: DataFile<R>,
}

impl<R: FixedRecord> IndexQueryService<R> {
    /// Open the files in config.  Both headers (the data header and the index level) are read
    /// once here.
    pub fn open(config: &IndexConfig) -> Result<Self, OpenError> {
        let files = &config.files;
        let data_file = DataFile::open(files.data_path()).map_err(OpenError::DataFileOpen)?;
        let index_file = OpenOptions::new()
            .read(true)
            .open(files.index_path())
            .map_err(|e| OpenError::IndexFileOpen(LoadHeaderError::IO(e)))?;
        let index = LinearHashIndex::open(index_file, config.bucket_elements)
            .map_err(OpenError::IndexFileOpen)?;
        info!(
            index = %files.index_path().display(),
            records = data_file.len(),
            level = index.level(),
            "opened index"
        );
        Ok(Self { index, data_file })
    }

    /// Look up key and read its record.
    pub fn query(&mut self, key: i32) -> Result<QueryResult<R>, QueryError> {
        match self.index.lookup(key).map_err(QueryError::Lookup)? {
            Some(offset) => {
                let record = self.data_file.read_record_at(offset as u64)?;
                Ok(QueryResult::Found { offset, record })
            }
            None => Ok(QueryResult::NotFound(key)),
        }
    }

    /// Number of records in the data file.
    pub fn len(&self) -> u32 {
        self.data_file.len()
    }

    /// Is the data file empty?
    pub fn is_empty(&self) -> bool {
        self.data_file.is_empty()
    }

    /// Level of the index.
    pub fn level(&self) -> u32 {
        self.index.level()
    }
}

/// Parse a query key typed by a user.
pub fn parse_key(input: &str) -> Result<i32, MalformedKeyError> {
    match input.trim().parse::<i32>() {
        Ok(key) if key >= 0 => Ok(key),
        _ => Err(MalformedKeyError(input.to_string())),
    }
}
