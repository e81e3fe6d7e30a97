//! Main module for the index.  This implements the sync single threaded structures: the data file,
//! the linear hash index, and the build and query drivers over them.

pub mod bucket_iter;
pub mod data_file;
pub mod data_header;
pub mod hdx_index;
pub mod index_builder;
pub mod index_entry;
pub mod query;

pub use data_file::{write_data_file, DataFile};
pub use hdx_index::{BucketStore, IndexStats, LinearHashIndex};
pub use index_builder::{BuildSummary, IndexBuilder};
pub use index_entry::IndexEntry;
pub use query::{parse_key, IndexQueryService, QueryResult};
