use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::plot::Plot;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub settings: Settings,
    pub plots: Vec<Box<dyn Plot>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Results CSV written by the benchmark runners
    pub input: PathBuf,
    /// Directory the charts are written to
    pub output_dir: PathBuf,
    /// Runs averaged per data point, only used in chart and table annotations
    #[serde(default = "default_num_runs")]
    pub num_runs: usize,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_num_runs() -> usize {
    5
}

fn default_width() -> u32 {
    1200
}

fn default_height() -> u32 {
    700
}

impl Settings {
    pub fn new(input: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input,
            output_dir,
            num_runs: default_num_runs(),
            width: default_width(),
            height: default_height(),
        }
    }

    pub fn plot_data_dir(&self) -> PathBuf {
        self.output_dir.join("plot_data")
    }
}
