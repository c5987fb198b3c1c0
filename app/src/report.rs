use std::path::{Path, PathBuf};

use common::{config::Config, loader::load_records, table::summary_table};
use console::style;
use eyre::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs::read_to_string;
use tracing::{debug, info};

pub async fn load_config(config_file: &Path) -> Result<Config> {
    if !config_file.exists() {
        bail!(
            "Config file {} not found, create one with `bench-report init`",
            config_file.display()
        );
    }
    let config: Config = serde_yml::from_str(
        &read_to_string(config_file)
            .await
            .context(format!("Read {}", config_file.display()))?,
    )
    .context(format!("Parse {}", config_file.display()))?;
    Ok(config)
}

/// Command line paths take precedence over the config file
pub fn apply_overrides(config: &mut Config, input: Option<PathBuf>, output_dir: Option<PathBuf>) {
    if let Some(input) = input {
        config.settings.input = input;
    }
    if let Some(output_dir) = output_dir {
        config.settings.output_dir = output_dir;
    }
}

fn progress_bar(no_progress: bool) -> Result<ProgressBar> {
    if no_progress {
        return Ok(ProgressBar::hidden());
    }
    Ok(ProgressBar::new(0).with_style(ProgressStyle::with_template(
        "{spinner} [{bar:30}] {pos}/{len} {msg}",
    )?))
}

pub async fn run_plots(config: &Config, no_progress: bool, skip_table: bool) -> Result<()> {
    let records = load_records(&config.settings.input)?;
    debug!("{}: {} records", config.name, records.len());

    let written = common::plot::plot(
        &config.plots,
        &records,
        &config.settings,
        &progress_bar(no_progress)?,
    )
    .await?;

    for path in &written {
        info!("Wrote {}", path.display());
        println!("{} {}", style("✓").green(), path.display());
    }

    if !skip_table {
        println!();
        print!("{}", summary_table(&records, config.settings.num_runs));
    }
    Ok(())
}

pub fn print_table(input: &Path, num_runs: usize) -> Result<()> {
    let records = load_records(input)?;
    print!("{}", summary_table(&records, num_runs));
    Ok(())
}
