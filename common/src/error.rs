use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Input file {} not found, run the benchmarks first to generate results", .path.display())]
    MissingInputFile { path: PathBuf },
    #[error("Malformed row {row}: {source}")]
    Parse {
        row: u64,
        #[source]
        source: csv::Error,
    },
    #[error("No sequential baseline for N = {n}")]
    MissingBaselineRecord { n: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
