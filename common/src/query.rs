use itertools::Itertools;
use tracing::warn;

use crate::{
    ReportError, Record,
    record::SEQ_VERSION,
};

/// Exact-match conjunction over the record fields. Unset fields match anything.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Criteria<'a> {
    pub version: Option<&'a str>,
    pub n: Option<u64>,
    pub threads: Option<u32>,
}

impl<'a> Criteria<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: &'a str) -> Self {
        self.version = Some(version);
        self
    }

    pub fn n(mut self, n: u64) -> Self {
        self.n = Some(n);
        self
    }

    pub fn threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.version.is_none_or(|v| record.version == v)
            && self.n.is_none_or(|n| record.n == n)
            && self.threads.is_none_or(|t| record.threads == t)
    }
}

/// Sorted distinct values of one field
pub fn unique_values<'a, T, I, F>(records: I, key: F) -> Vec<T>
where
    I: IntoIterator<Item = &'a Record>,
    F: Fn(&Record) -> T,
    T: Ord,
{
    records.into_iter().map(key).sorted().dedup().collect()
}

/// Records matching all of `criteria`, in source order
pub fn filter<'a, I>(records: I, criteria: &Criteria<'_>) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|r| criteria.matches(r))
        .collect()
}

pub fn find<'a, I>(records: I, criteria: &Criteria<'_>) -> Option<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records.into_iter().find(|r| criteria.matches(r))
}

/// The sequential record for problem size `n`
pub fn baseline<'a, I>(records: I, n: u64) -> Result<&'a Record, ReportError>
where
    I: IntoIterator<Item = &'a Record>,
{
    find(records, &Criteria::new().version(SEQ_VERSION).n(n))
        .ok_or(ReportError::MissingBaselineRecord { n })
}

/// Like [`baseline`], but a missing record is only logged
pub fn try_baseline<'a, I>(records: I, n: u64) -> Option<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    match baseline(records, n) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!("{err}, derived values default to 0");
            None
        }
    }
}
