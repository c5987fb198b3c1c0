use std::path::PathBuf;

use common::{
    config::{Config, Settings},
    plot::Plot,
};
use parallel_region_basic::ParallelRegionBasic;
use saxpy_basic::SaxpyBasic;
use serde::{Deserialize, Serialize};

/// Crates whose log output follows the binary's default level
pub const PLOT_MODULES: &[&str] = &[
    "common",
    "plot_common",
    "saxpy_basic",
    "parallel_region_basic",
];

/// Touches every plot implementation so its `typetag` registration is linked in
pub fn init_plots() {
    _ = serde_json::to_string(&SaxpyBasic::default());
    _ = serde_json::to_string(&ParallelRegionBasic::default());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperimentKind {
    Saxpy,
    ParallelRegion,
}

impl ExperimentKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExperimentKind::Saxpy => "saxpy",
            ExperimentKind::ParallelRegion => "parallel_region",
        }
    }

    pub fn default_plots(&self) -> Vec<Box<dyn Plot>> {
        match self {
            ExperimentKind::Saxpy => vec![Box::new(SaxpyBasic::default())],
            ExperimentKind::ParallelRegion => vec![Box::new(ParallelRegionBasic::default())],
        }
    }

    /// Config for the layout the benchmark runners write: `results/<name>/table/results.csv`
    pub fn default_config(&self, input: Option<PathBuf>, output_dir: Option<PathBuf>) -> Config {
        let results = PathBuf::from("../../results").join(self.name());
        Config {
            name: self.name().to_owned(),
            settings: Settings::new(
                input.unwrap_or_else(|| results.join("table").join("results.csv")),
                output_dir.unwrap_or_else(|| results.join("charts")),
            ),
            plots: self.default_plots(),
        }
    }
}
