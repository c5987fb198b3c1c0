use core::fmt::Debug;
use std::path::{Path, PathBuf};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::{Context, Result};
use futures::future::join_all;
use indicatif::ProgressBar;
use serde::Serialize;
use tokio::fs::{create_dir_all, write};
use tracing::debug;

use crate::{Record, config::Settings};

#[typetag::serde(tag = "type")]
#[async_trait::async_trait]
pub trait Plot: Debug + DynClone + Send + Sync {
    /// Name used in logs and progress output
    fn name(&self) -> &'static str;
    /// Renders the charts of this plot
    ///
    /// Arguments:
    /// * `records` - Every record of the results file, in file order
    /// * `settings` - Output directory, chart size and annotation settings
    ///
    /// Returns the paths of the written charts.
    async fn plot(&self, records: &[Record], settings: &Settings) -> Result<Vec<PathBuf>>;
}
clone_trait_object!(Plot);

pub async fn ensure_plot_dirs(dirs: &[PathBuf]) -> Result<()> {
    let create_jobs = dirs.iter().map(create_dir_all);
    for res in join_all(create_jobs).await {
        res?;
    }
    Ok(())
}

/// Dumps the series behind a chart to `plot_data/<stem>.json`
pub async fn write_plot_data<T: Serialize + ?Sized>(
    settings: &Settings,
    chart_path: &Path,
    data: &T,
) -> Result<PathBuf> {
    let stem = chart_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| eyre::eyre!("Invalid chart path {chart_path:?}"))?;
    let data_path = settings.plot_data_dir().join(format!("{stem}.json"));
    write(&data_path, serde_json::to_string(data)?)
        .await
        .context(format!("Write plot data {}", data_path.display()))?;
    Ok(data_path)
}

/// Runs every plot in order, stopping at the first failure
pub async fn plot(
    plots: &[Box<dyn Plot>],
    records: &[Record],
    settings: &Settings,
    progress: &ProgressBar,
) -> Result<Vec<PathBuf>> {
    if plots.is_empty() {
        debug!("No plots");
        return Ok(Vec::new());
    }

    ensure_plot_dirs(&[settings.output_dir.clone(), settings.plot_data_dir()]).await?;

    progress.set_length(plots.len() as u64);
    let mut written = Vec::new();
    for plot in plots {
        progress.set_message(plot.name());
        let files = plot
            .plot(records, settings)
            .await
            .context(format!("Render {}", plot.name()))?;
        debug!("{} wrote {} charts", plot.name(), files.len());
        written.extend(files);
        progress.inc(1);
    }
    progress.finish_and_clear();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct CountRecords;

    #[async_trait::async_trait]
    #[typetag::serde]
    impl Plot for CountRecords {
        fn name(&self) -> &'static str {
            "count-records"
        }

        async fn plot(&self, records: &[Record], settings: &Settings) -> Result<Vec<PathBuf>> {
            let path = settings.output_dir.join("count.txt");
            write(&path, records.len().to_string()).await?;
            write_plot_data(settings, &path, &[records.len()]).await?;
            Ok(vec![path])
        }
    }

    #[tokio::test]
    async fn runs_plots_into_fresh_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path().join("in.csv"), dir.path().join("out/charts"));
        let plots: Vec<Box<dyn Plot>> = vec![Box::new(CountRecords)];
        let records = vec![Record::new("seq", 1, 1, 1.0, 0.0)];

        let written = plot(&plots, &records, &settings, &ProgressBar::hidden())
            .await
            .unwrap();

        assert_eq!(written, vec![settings.output_dir.join("count.txt")]);
        let data = std::fs::read_to_string(settings.plot_data_dir().join("count.json")).unwrap();
        assert_eq!(data, "[1]");
    }

    #[tokio::test]
    async fn no_plots_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path().join("in.csv"), dir.path().join("charts"));
        let written = plot(&[], &[], &settings, &ProgressBar::hidden())
            .await
            .unwrap();
        assert!(written.is_empty());
        assert!(!settings.output_dir.exists());
    }
}
