use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::{ReportError, Record};

/// Loads every row of a results CSV, in file order.
pub fn load_records(path: &Path) -> Result<Vec<Record>, ReportError> {
    if !path.exists() {
        return Err(ReportError::MissingInputFile {
            path: path.to_path_buf(),
        });
    }

    let records = read_records(File::open(path)?)?;
    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_records<R: Read>(input: R) -> Result<Vec<Record>, ReportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);

    reader
        .deserialize::<Record>()
        .enumerate()
        .map(|(idx, row)| {
            row.map_err(|source| ReportError::Parse {
                // header is line 1
                row: source.position().map_or(idx as u64 + 2, |p| p.line()),
                source,
            })
        })
        .collect()
}
