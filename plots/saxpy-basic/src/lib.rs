use std::path::PathBuf;

use common::{
    Record,
    config::Settings,
    metrics::{MetricKind, derived_metric},
    plot::{Plot, write_plot_data},
    query::{Criteria, filter, find, try_baseline, unique_values},
    record::SEQ_VERSION,
    util::{cycled, group_thousands, size_label},
};
use eyre::Result;
use itertools::Itertools;
use plot_common::{
    BarPanel, BarSeries, Curve, Figure, LinePanel, RefLine, REFERENCE_COLOR, format_ms,
    format_speedup, methodology_note, render_bars, render_lines, single_bar_panel, size_color,
    size_marker,
};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const TIME_BY_VERSION: &str = "time_by_version.svg";
pub const SPEEDUP_BY_VERSION: &str = "speedup_by_version.svg";
pub const THREAD_SCALING: &str = "thread_scaling.svg";
pub const TIME_VS_THREADS: &str = "time_vs_threads.svg";

const SEQ_COLOR: RGBColor = RGBColor(0x34, 0x98, 0xdb);
const SIMD_COLOR: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
const PARALLEL_COLOR: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
/// One shade per thread count, light to dark
const THREAD_PALETTE: [RGBColor; 5] = [
    RGBColor(0xfe, 0xe0, 0x8b),
    RGBColor(0xfd, 0xae, 0x61),
    RGBColor(0xf4, 0x6d, 0x43),
    RGBColor(0xd7, 0x30, 0x27),
    RGBColor(0xa5, 0x00, 0x26),
];

/// Charts for the SAXPY experiment: sequential vs `omp simd` vs `omp parallel for simd`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaxpyBasic {
    #[serde(default = "default_thread_options")]
    pub thread_options: Vec<u32>,
    #[serde(default = "default_simd_version")]
    pub simd_version: String,
    #[serde(default = "default_parallel_version")]
    pub parallel_version: String,
}

fn default_thread_options() -> Vec<u32> {
    vec![1, 2, 4, 8, 16]
}

fn default_simd_version() -> String {
    "simd".to_owned()
}

fn default_parallel_version() -> String {
    "parallel_simd".to_owned()
}

impl Default for SaxpyBasic {
    fn default() -> Self {
        Self {
            thread_options: default_thread_options(),
            simd_version: default_simd_version(),
            parallel_version: default_parallel_version(),
        }
    }
}

#[async_trait::async_trait]
#[typetag::serde]
impl Plot for SaxpyBasic {
    fn name(&self) -> &'static str {
        "saxpy-basic"
    }

    async fn plot(&self, records: &[Record], settings: &Settings) -> Result<Vec<PathBuf>> {
        if records.is_empty() {
            warn!("No records, skipping SAXPY charts");
            return Ok(Vec::new());
        }

        Ok(vec![
            self.time_by_version(records, settings).await?,
            self.speedup_by_version(records, settings).await?,
            self.thread_scaling(records, settings).await?,
            self.time_vs_threads(records, settings).await?,
        ])
    }
}

impl SaxpyBasic {
    /// One panel per problem size with every version side by side
    async fn time_by_version(&self, records: &[Record], settings: &Settings) -> Result<PathBuf> {
        let panels = unique_values(records, |r| r.n)
            .into_iter()
            .map(|n| {
                let data_n = filter(records, &Criteria::new().n(n));
                let mut bars = Vec::new();
                for (label, version, color) in [
                    ("Seq", SEQ_VERSION, SEQ_COLOR),
                    ("SIMD", self.simd_version.as_str(), SIMD_COLOR),
                ] {
                    let record = find(data_n.iter().copied(), &Criteria::new().version(version));
                    if record.is_none() {
                        warn!("No {version} record for N = {n}");
                    }
                    bars.push((
                        label.to_owned(),
                        color,
                        record.map_or(0.0, Record::mean_time_ms),
                        record.map_or(0.0, Record::std_dev_ms),
                    ));
                }

                for &threads in &self.thread_options {
                    let criteria = Criteria::new()
                        .version(&self.parallel_version)
                        .threads(threads);
                    if let Some(record) = find(data_n.iter().copied(), &criteria) {
                        bars.push((
                            format!("P.SIMD {threads}T"),
                            PARALLEL_COLOR,
                            record.mean_time_ms(),
                            record.std_dev_ms(),
                        ));
                    }
                }

                single_bar_panel(
                    format!("N = {}", group_thousands(n)),
                    "Mean time (ms)",
                    bars,
                    format_ms,
                )
            })
            .collect::<Vec<_>>();

        let figure = Figure::new(settings, TIME_BY_VERSION)
            .with_title("SAXPY time by version (P.SIMD = parallel SIMD, T = threads)")
            .with_note(format!(
                "Each bar: mean of {} runs. Error bars: ±1 standard deviation.",
                settings.num_runs
            ));
        render_bars(&figure, &panels)?;
        write_plot_data(settings, figure.path(), &panels).await?;
        Ok(figure.path)
    }

    /// Speedup of SIMD and of parallel SIMD per thread count, grouped by problem size
    async fn speedup_by_version(&self, records: &[Record], settings: &Settings) -> Result<PathBuf> {
        let sizes = unique_values(records, |r| r.n);
        let baselines = sizes
            .iter()
            .map(|&n| try_baseline(records, n))
            .collect::<Vec<_>>();

        let speedups_of = |version: &str, threads: Option<u32>| -> Vec<f64> {
            sizes
                .iter()
                .zip(&baselines)
                .map(|(&n, &seq)| {
                    let mut criteria = Criteria::new().version(version).n(n);
                    criteria.threads = threads;
                    derived_metric(MetricKind::Speedup, seq, find(records, &criteria))
                })
                .collect()
        };

        let mut series = vec![
            BarSeries::new(
                "SIMD (1 thread)",
                SIMD_COLOR,
                speedups_of(self.simd_version.as_str(), None),
            )
            .with_value_labels(format_speedup),
        ];
        for (idx, &threads) in self.thread_options.iter().enumerate() {
            series.push(BarSeries::new(
                format!("P.SIMD ({threads} threads)"),
                cycled(&THREAD_PALETTE, idx),
                speedups_of(self.parallel_version.as_str(), Some(threads)),
            ));
        }

        let panel = BarPanel {
            title: "Speedup over the sequential version (values > 1 mean faster)".to_owned(),
            x_label: "Vector size (N)".to_owned(),
            y_label: "Speedup (vs sequential)".to_owned(),
            categories: sizes.iter().map(|&n| size_label(n)).collect(),
            series,
            ref_lines: vec![RefLine::new(1.0, REFERENCE_COLOR)],
            show_legend: true,
        };

        let figure = Figure::new(settings, SPEEDUP_BY_VERSION).with_note(format!(
            "Speedup = T_seq / T_version. Based on the mean of {} runs.",
            settings.num_runs
        ));
        render_bars(&figure, std::slice::from_ref(&panel))?;
        write_plot_data(settings, figure.path(), &panel).await?;
        Ok(figure.path)
    }

    /// Parallel SIMD speedup over the sequential version as threads grow
    async fn thread_scaling(&self, records: &[Record], settings: &Settings) -> Result<PathBuf> {
        let parallel = filter(records, &Criteria::new().version(&self.parallel_version));
        debug!("{} parallel records", parallel.len());

        let curves = unique_values(parallel.iter().copied(), |r| r.n)
            .into_iter()
            .enumerate()
            .map(|(idx, n)| {
                let seq = try_baseline(records, n);
                let rows = filter(parallel.iter().copied(), &Criteria::new().n(n))
                    .into_iter()
                    .sorted_by_key(|r| r.threads)
                    .collect::<Vec<_>>();

                let points = rows
                    .iter()
                    .map(|&r| {
                        let speedup = derived_metric(MetricKind::Speedup, seq, Some(r));
                        (f64::from(r.threads), speedup)
                    })
                    .collect();
                let errors = rows
                    .iter()
                    .map(|&r| derived_metric(MetricKind::PropagatedStd, seq, Some(r)))
                    .collect();

                Curve::new(format!("N = {}", group_thousands(n)), size_color(idx), points)
                    .with_errors(errors)
                    .with_marker(size_marker(idx))
            })
            .collect();

        let panel = LinePanel {
            title: "Parallel SIMD speedup vs sequential".to_owned(),
            x_label: "Threads".to_owned(),
            y_label: "Speedup (vs sequential)".to_owned(),
            x_ticks: thread_ticks(&parallel),
            curves,
            ref_lines: vec![
                RefLine::new(1.0, REFERENCE_COLOR).with_label("Sequential baseline (1x)"),
            ],
            y_from_zero: true,
        };

        let figure = Figure::new(settings, THREAD_SCALING).with_note(format!(
            "Speedup = T_seq / T_parallel_simd. Mean of {} runs. Error bars: ±1 standard deviation.",
            settings.num_runs
        ));
        render_lines(&figure, &panel)?;
        write_plot_data(settings, figure.path(), &panel).await?;
        Ok(figure.path)
    }

    /// Absolute parallel SIMD time, with the sequential time of each size as reference
    async fn time_vs_threads(&self, records: &[Record], settings: &Settings) -> Result<PathBuf> {
        let parallel = filter(records, &Criteria::new().version(&self.parallel_version));

        let mut curves = Vec::new();
        let mut ref_lines = Vec::new();
        for (idx, n) in unique_values(parallel.iter().copied(), |r| r.n)
            .into_iter()
            .enumerate()
        {
            let rows = filter(parallel.iter().copied(), &Criteria::new().n(n))
                .into_iter()
                .sorted_by_key(|r| r.threads)
                .collect::<Vec<_>>();
            curves.push(
                Curve::new(
                    format!("N = {}", group_thousands(n)),
                    size_color(idx),
                    rows.iter()
                        .map(|r| (f64::from(r.threads), r.mean_time_ms()))
                        .collect(),
                )
                .with_errors(rows.iter().map(|r| r.std_dev_ms()).collect())
                .with_marker(size_marker(idx)),
            );

            if let Some(seq) = find(records, &Criteria::new().version(SEQ_VERSION).n(n)) {
                ref_lines.push(RefLine::new(seq.mean_time_ms(), size_color(idx)).with_opacity(0.5));
            }
        }

        let panel = LinePanel {
            title: "Execution time vs threads (parallel SIMD, faint lines = sequential time)"
                .to_owned(),
            x_label: "Threads".to_owned(),
            y_label: "Mean time (ms)".to_owned(),
            x_ticks: thread_ticks(&parallel),
            curves,
            ref_lines,
            y_from_zero: true,
        };

        let figure = Figure::new(settings, TIME_VS_THREADS).with_note(methodology_note(settings.num_runs));
        render_lines(&figure, &panel)?;
        write_plot_data(settings, figure.path(), &panel).await?;
        Ok(figure.path)
    }
}

fn thread_ticks(records: &[&Record]) -> Vec<f64> {
    unique_values(records.iter().copied(), |r| r.threads)
        .into_iter()
        .map(f64::from)
        .collect()
}
