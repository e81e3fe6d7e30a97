//! Command line front end: build an index over a data file, answer key queries from stdin, or
//! report the shape of an index.

use clap::{Parser, Subcommand};
use lhdx::db::{parse_key, IndexQueryService, LinearHashIndex, QueryResult};
use lhdx::db_config::{IndexConfig, DEFAULT_BUCKET_ELEMENTS};
use lhdx::db_files::IndexFiles;
use lhdx::db_record::SolarRecord;
use lhdx::error::build::BuildError;
use lhdx::error::{LoadHeaderError, OpenError, QueryError};
use std::fs::OpenOptions;
use std::io;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Input that ends a query session.
const END_OF_QUERIES: &str = "-1";

#[derive(Debug, Parser)]
#[command(name = "lhdx", version, about = "Linear hash index over fixed length record files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build (or rebuild) the index for a data file.
    Build {
        /// Data file to index.
        data: PathBuf,
        /// Index file to write, defaults to the data file with an .idx extension.
        #[arg(long)]
        index: Option<PathBuf>,
        /// Slots per bucket.
        #[arg(long, default_value_t = DEFAULT_BUCKET_ELEMENTS)]
        bucket_elements: u16,
    },
    /// Read keys from stdin and print the matching records, -1 ends.
    Query {
        /// Index file.
        index: PathBuf,
        /// Data file the index was built over.
        data: PathBuf,
        /// Slots per bucket, must match the build.
        #[arg(long, default_value_t = DEFAULT_BUCKET_ELEMENTS)]
        bucket_elements: u16,
    },
    /// Print the level, bucket count and fill of an index.
    Stats {
        /// Index file.
        index: PathBuf,
        /// Slots per bucket, must match the build.
        #[arg(long, default_value_t = DEFAULT_BUCKET_ELEMENTS)]
        bucket_elements: u16,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Build(#[from] BuildError),
    #[error("{0}")]
    Open(#[from] OpenError),
    #[error("{0}")]
    Query(#[from] QueryError),
    #[error("{0}")]
    LoadHeader(#[from] LoadHeaderError),
    #[error("bucket elements must be at least 1")]
    ZeroBucketElements,
    #[error("io: {0}")]
    IO(#[from] io::Error),
}

fn config(files: IndexFiles, bucket_elements: u16) -> Result<IndexConfig, CliError> {
    if bucket_elements == 0 {
        return Err(CliError::ZeroBucketElements);
    }
    Ok(IndexConfig::new(files).set_bucket_elements(bucket_elements))
}

fn build(data: PathBuf, index: Option<PathBuf>, bucket_elements: u16) -> Result<(), CliError> {
    let files = match index {
        Some(index) => IndexFiles::with_paths(data, index),
        None => IndexFiles::with_data(data),
    };
    let index_path = files.index_path().to_path_buf();
    config(files, bucket_elements)?.build_index::<SolarRecord>()?;
    println!("Successfully wrote {}", index_path.display());
    Ok(())
}

/// Prompt for keys on input until END_OF_QUERIES or end of input, answering each on output.
fn run_queries<I, O>(
    service: &mut IndexQueryService<SolarRecord>,
    input: I,
    output: &mut O,
) -> Result<(), CliError>
where
    I: BufRead,
    O: Write,
{
    writeln!(output, "{} records found.", service.len())?;
    writeln!(output, "Enter the key to search, -1 to end:")?;
    for line in input.lines() {
        let line = line?;
        for token in line.split_whitespace() {
            if token == END_OF_QUERIES {
                return Ok(());
            }
            match parse_key(token) {
                Ok(key) => match service.query(key)? {
                    QueryResult::Found { record, .. } => writeln!(
                        output,
                        "[{}] [{}] [{}]",
                        record.key, record.name, record.capacity_ac
                    )?,
                    QueryResult::NotFound(key) => {
                        writeln!(output, "The target value {key} was not found.")?
                    }
                },
                Err(e) => writeln!(output, "{e}")?,
            }
            writeln!(output, "Enter the key to search, -1 to end:")?;
        }
    }
    Ok(())
}

fn query(index: PathBuf, data: PathBuf, bucket_elements: u16) -> Result<(), CliError> {
    let mut service = config(IndexFiles::with_paths(data, index), bucket_elements)?
        .read_only()
        .open_query::<SolarRecord>()?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_queries(&mut service, stdin.lock(), &mut stdout)
}

fn stats(index: PathBuf, bucket_elements: u16) -> Result<(), CliError> {
    if bucket_elements == 0 {
        return Err(CliError::ZeroBucketElements);
    }
    let file = OpenOptions::new().read(true).open(index)?;
    let stats = LinearHashIndex::open(file, bucket_elements)?.stats()?;
    println!("level: {}", stats.level);
    println!("buckets: {}", stats.buckets);
    println!("bucket elements: {}", stats.bucket_elements);
    println!("values: {}", stats.values);
    println!("fullest bucket: {}", stats.fullest_bucket);
    println!("empty buckets: {}", stats.empty_buckets);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Build {
            data,
            index,
            bucket_elements,
        } => build(data, index, bucket_elements),
        Command::Query {
            index,
            data,
            bucket_elements,
        } => query(index, data, bucket_elements),
        Command::Stats {
            index,
            bucket_elements,
        } => stats(index, bucket_elements),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
