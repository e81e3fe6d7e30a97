//! Define the files used by an index.

use std::path::{Path, PathBuf};

/// Extension of a data file.
pub const DATA_EXTENSION: &str = "bin";
/// Extension of an index file.
pub const INDEX_EXTENSION: &str = "idx";

/// Contains the paths of the data file and the index file built over it.
///
/// There are three ways to create a set of files:
/// - Supply a directory and name, the files are dir/name.bin and dir/name.idx.
/// - Supply a data file, the index sits next to it with the extension swapped to .idx.
/// - Supply both paths explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexFiles {
    data_file: PathBuf,
    index_file: PathBuf,
}

impl IndexFiles {
    /// Files named name in directory dir.
    pub fn with_dir<P, S>(dir: P, name: S) -> Self
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let base = dir.as_ref().join(name.as_ref());
        Self {
            data_file: base.with_extension(DATA_EXTENSION),
            index_file: base.with_extension(INDEX_EXTENSION),
        }
    }

    /// Index stored beside data with the idx extension.
    pub fn with_data<P: Into<PathBuf>>(data: P) -> Self {
        let data_file: PathBuf = data.into();
        let index_file = data_file.with_extension(INDEX_EXTENSION);
        Self {
            data_file,
            index_file,
        }
    }

    /// Explicit paths for both files.
    pub fn with_paths<P, Q>(data: P, index: Q) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        Self {
            data_file: data.into(),
            index_file: index.into(),
        }
    }

    /// Path to the data file.
    pub fn data_path(&self) -> &Path {
        &self.data_file
    }

    /// Path to the index file.
    pub fn index_path(&self) -> &Path {
        &self.index_file
    }
}
