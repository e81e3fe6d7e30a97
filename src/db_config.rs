//! Define the configuration used to build or query an index.

use crate::db::index_builder::{BuildSummary, IndexBuilder};
use crate::db::query::IndexQueryService;
use crate::db_files::IndexFiles;
use crate::db_record::FixedRecord;
use crate::error::build::BuildError;
use crate::error::OpenError;

/// Default blocking factor, slots per bucket.
pub const DEFAULT_BUCKET_ELEMENTS: u16 = 20;

/// Configuration for an index.
#[derive(Clone, Debug)]
pub struct IndexConfig {
    pub(crate) files: IndexFiles,
    pub(crate) bucket_elements: u16,
    pub(crate) write: bool,
}

impl IndexConfig {
    /// Create a new config.
    pub fn new(files: IndexFiles) -> Self {
        Self {
            files,
            bucket_elements: DEFAULT_BUCKET_ELEMENTS,
            write: true,
        }
    }

    /// Sets the elements in each bucket.  A query must use the same value the index was built with.
    /// Panics if bucket_elements is 0.
    pub fn set_bucket_elements(mut self, bucket_elements: u16) -> Self {
        if bucket_elements == 0 {
            panic!("Invalid bucket elements, must be at least 1");
        }
        self.bucket_elements = bucket_elements;
        self
    }

    /// Never write, building an index with this config is an error.
    pub fn read_only(mut self) -> Self {
        self.write = false;
        self
    }

    /// The data and index files.
    pub fn files(&self) -> &IndexFiles {
        &self.files
    }

    /// Slots in each bucket.
    pub fn bucket_elements(&self) -> u16 {
        self.bucket_elements
    }

    /// Build (or rebuild) the index file over the data file.
    pub fn build_index<R: FixedRecord>(self) -> Result<BuildSummary, BuildError> {
        IndexBuilder::new(self).build::<R>()
    }

    /// Consumes the config and opens the index and data file for queries.
    pub fn open_query<R: FixedRecord>(self) -> Result<IndexQueryService<R>, OpenError> {
        IndexQueryService::open(&self)
    }
}
