use serde::{Deserialize, Serialize};

use crate::SECONDS_TO_MS;

/// Version tag of the sequential baseline
pub const SEQ_VERSION: &str = "seq";

/// One measured benchmark configuration, as written by the benchmark runners.
///
/// The CSV headers are the ones produced by the runners (`versao`, `tempo_medio`, ...),
/// the english names are accepted as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "versao", alias = "version")]
    pub version: String,
    pub n: u64,
    pub threads: u32,
    /// Mean wall time in seconds
    #[serde(rename = "tempo_medio", alias = "mean_time")]
    pub mean_time: f64,
    /// Standard deviation of the wall time in seconds
    #[serde(rename = "desvio_padrao", alias = "std_dev")]
    pub std_dev: f64,
}

impl Record {
    pub fn new(version: &str, n: u64, threads: u32, mean_time: f64, std_dev: f64) -> Self {
        Self {
            version: version.to_owned(),
            n,
            threads,
            mean_time,
            std_dev,
        }
    }

    pub fn is_baseline(&self) -> bool {
        self.version == SEQ_VERSION
    }

    pub fn mean_time_ms(&self) -> f64 {
        self.mean_time * SECONDS_TO_MS
    }

    pub fn std_dev_ms(&self) -> f64 {
        self.std_dev * SECONDS_TO_MS
    }
}
