//! Batch build of an index file from a data file.

use crate::db::data_file::DataFile;
use crate::db::hdx_index::LinearHashIndex;
use crate::db_config::IndexConfig;
use crate::db_record::FixedRecord;
use crate::error::build::BuildError;
use std::fs::OpenOptions;
use tracing::info;

/// Result of a build.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// Records indexed.
    pub records: u32,
    /// Final level (also written at the end of the index file).
    pub level: u32,
    /// Final bucket count.
    pub buckets: u64,
    /// Splits done during the build.
    pub splits: u64,
}

/// Builds an index over every record of a data file.
#[derive(Debug)]
pub struct IndexBuilder {
    config: IndexConfig,
}

impl IndexBuilder {
    /// Create a builder for the files in config.
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    /// Replace the index file with a fresh index holding one (key, offset) per record, inserted in
    /// storage order, then append the level.
    pub fn build<R: FixedRecord>(&self) -> Result<BuildSummary, BuildError> {
        if !self.config.write {
            return Err(BuildError::ReadOnly);
        }
        let files = &self.config.files;
        let mut data_file: DataFile<R> =
            DataFile::open(files.data_path()).map_err(BuildError::DataFileOpen)?;
        let index_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(files.index_path())
            .map_err(BuildError::IndexFileCreate)?;
        let mut index = LinearHashIndex::create(index_file, self.config.bucket_elements)
            .map_err(BuildError::IndexFileCreate)?;

        for record in data_file.records() {
            let (_, key, offset) = record.map_err(BuildError::ReadKey)?;
            let offset = i32::try_from(offset).map_err(|_| BuildError::OffsetOverflow(offset))?;
            index.insert(key, offset)?;
        }
        let summary = BuildSummary {
            records: data_file.len(),
            level: index.level(),
            buckets: index.buckets(),
            splits: index.splits(),
        };
        index.finish().map_err(BuildError::Finish)?;
        info!(
            index = %files.index_path().display(),
            records = summary.records,
            level = summary.level,
            buckets = summary.buckets,
            splits = summary.splits,
            "built index"
        );
        Ok(summary)
    }
}
