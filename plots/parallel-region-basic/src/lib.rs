use std::path::PathBuf;

use common::{
    Record,
    config::Settings,
    metrics::{MetricKind, derived_metric},
    plot::{Plot, write_plot_data},
    query::{Criteria, filter, find, try_baseline, unique_values},
    util::{group_thousands, size_label},
};
use eyre::Result;
use plot_common::{
    BarPanel, BarSeries, Curve, Figure, LinePanel, Marker, RefLine, REFERENCE_COLOR,
    methodology_note, render_bars, render_lines, size_color, size_marker,
};
use plotters::style::{BLUE, RGBColor};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const VERSION_COMPARISON: &str = "version_comparison.svg";
pub const RELATIVE_OVERHEAD: &str = "relative_overhead.svg";
pub const SPEEDUP_VS_SEQUENTIAL: &str = "speedup_vs_sequential.svg";
pub const ABSOLUTE_TIME: &str = "absolute_time.svg";

const NAIVE_COLOR: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
const FIXED_COLOR: RGBColor = RGBColor(0x2e, 0xcc, 0x71);

/// Charts for the parallel region experiment: two `parallel for` regions (naive) against a
/// single `parallel` region holding both loops (fixed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelRegionBasic {
    #[serde(default = "default_naive_version")]
    pub naive_version: String,
    #[serde(default = "default_fixed_version")]
    pub fixed_version: String,
}

fn default_naive_version() -> String {
    "ingenua".to_owned()
}

fn default_fixed_version() -> String {
    "arrumada".to_owned()
}

impl Default for ParallelRegionBasic {
    fn default() -> Self {
        Self {
            naive_version: default_naive_version(),
            fixed_version: default_fixed_version(),
        }
    }
}

/// Mean time and error in ms for one version at every thread count, 0 where missing
fn times_ms(data_n: &[&Record], version: &str, threads: &[u32]) -> (Vec<f64>, Vec<f64>) {
    threads
        .iter()
        .map(|&t| {
            find(
                data_n.iter().copied(),
                &Criteria::new().version(version).threads(t),
            )
            .map_or((0.0, 0.0), |r| (r.mean_time_ms(), r.std_dev_ms()))
        })
        .unzip()
}

#[async_trait::async_trait]
#[typetag::serde]
impl Plot for ParallelRegionBasic {
    fn name(&self) -> &'static str {
        "parallel-region-basic"
    }

    async fn plot(&self, records: &[Record], settings: &Settings) -> Result<Vec<PathBuf>> {
        let threads = self.thread_options(records);
        if threads.is_empty() {
            warn!("No {} records, skipping parallel region charts", self.naive_version);
            return Ok(Vec::new());
        }
        debug!("Thread counts: {threads:?}");

        Ok(vec![
            self.version_comparison(records, &threads, settings).await?,
            self.relative_overhead(records, &threads, settings).await?,
            self.speedup_vs_sequential(records, &threads, settings).await?,
            self.absolute_time(records, &threads, settings).await?,
        ])
    }
}

impl ParallelRegionBasic {
    fn thread_options(&self, records: &[Record]) -> Vec<u32> {
        let naive = filter(records, &Criteria::new().version(&self.naive_version));
        unique_values(naive, |r| r.threads)
    }

    async fn version_comparison(
        &self,
        records: &[Record],
        threads: &[u32],
        settings: &Settings,
    ) -> Result<PathBuf> {
        let panels = unique_values(records, |r| r.n)
            .into_iter()
            .map(|n| {
                let data_n = filter(records, &Criteria::new().n(n));
                let seq_ms = try_baseline(data_n.iter().copied(), n).map_or(0.0, Record::mean_time_ms);
                let (naive, naive_err) = times_ms(&data_n, &self.naive_version, threads);
                let (fixed, fixed_err) = times_ms(&data_n, &self.fixed_version, threads);

                BarPanel {
                    title: format!("N = {}", group_thousands(n)),
                    x_label: "Threads".to_owned(),
                    y_label: "Mean time (ms)".to_owned(),
                    categories: threads.iter().map(u32::to_string).collect(),
                    series: vec![
                        BarSeries::new("Naive (2x parallel for)", NAIVE_COLOR, naive)
                            .with_errors(naive_err),
                        BarSeries::new("Fixed (1x parallel)", FIXED_COLOR, fixed)
                            .with_errors(fixed_err),
                    ],
                    ref_lines: vec![
                        RefLine::new(seq_ms, BLUE).with_label(format!("Sequential ({seq_ms:.3}ms)")),
                    ],
                    show_legend: true,
                }
            })
            .collect::<Vec<_>>();

        let figure = Figure::new(settings, VERSION_COMPARISON)
            .with_title("Naive vs fixed parallel region (lower is better)")
            .with_note(format!(
                "Each bar: mean of {} runs. Error bars: ±1 standard deviation.",
                settings.num_runs
            ));
        render_bars(&figure, &panels)?;
        write_plot_data(settings, figure.path(), &panels).await?;
        Ok(figure.path)
    }

    /// Overhead of the naive version relative to the fixed one
    async fn relative_overhead(
        &self,
        records: &[Record],
        threads: &[u32],
        settings: &Settings,
    ) -> Result<PathBuf> {
        let curves = unique_values(records, |r| r.n)
            .into_iter()
            .enumerate()
            .map(|(idx, n)| {
                let data_n = filter(records, &Criteria::new().n(n));
                let points = threads
                    .iter()
                    .map(|&t| {
                        let naive = find(
                            data_n.iter().copied(),
                            &Criteria::new().version(&self.naive_version).threads(t),
                        );
                        let fixed = find(
                            data_n.iter().copied(),
                            &Criteria::new().version(&self.fixed_version).threads(t),
                        );
                        (
                            f64::from(t),
                            derived_metric(MetricKind::OverheadPct, fixed, naive),
                        )
                    })
                    .collect();
                Curve::new(format!("N = {}", group_thousands(n)), size_color(idx), points)
                    .with_marker(size_marker(idx))
            })
            .collect();

        let panel = LinePanel {
            title: "Overhead of the naive version over the fixed one (> 0: naive is slower)"
                .to_owned(),
            x_label: "Threads".to_owned(),
            y_label: "Naive overhead (%)".to_owned(),
            x_ticks: threads.iter().map(|&t| f64::from(t)).collect(),
            curves,
            ref_lines: vec![RefLine::new(0.0, REFERENCE_COLOR)],
            y_from_zero: false,
        };

        let figure = Figure::new(settings, RELATIVE_OVERHEAD).with_note(format!(
            "Overhead = (T_naive - T_fixed) / T_fixed × 100%. Mean of {} runs.",
            settings.num_runs
        ));
        render_lines(&figure, &panel)?;
        write_plot_data(settings, figure.path(), &panel).await?;
        Ok(figure.path)
    }

    /// Speedup of both versions over the sequential one, fixed solid and naive faded
    async fn speedup_vs_sequential(
        &self,
        records: &[Record],
        threads: &[u32],
        settings: &Settings,
    ) -> Result<PathBuf> {
        let mut curves = Vec::new();
        for (idx, n) in unique_values(records, |r| r.n).into_iter().enumerate() {
            let data_n = filter(records, &Criteria::new().n(n));
            let seq = try_baseline(data_n.iter().copied(), n);

            for (name, version, faded) in [
                ("Fixed", self.fixed_version.as_str(), false),
                ("Naive", self.naive_version.as_str(), true),
            ] {
                let rows = threads
                    .iter()
                    .filter_map(|&t| {
                        find(
                            data_n.iter().copied(),
                            &Criteria::new().version(version).threads(t),
                        )
                    })
                    .collect::<Vec<_>>();
                let points = rows
                    .iter()
                    .map(|&r| {
                        (
                            f64::from(r.threads),
                            derived_metric(MetricKind::Speedup, seq, Some(r)),
                        )
                    })
                    .collect();
                let errors = rows
                    .iter()
                    .map(|&r| derived_metric(MetricKind::PropagatedStd, seq, Some(r)))
                    .collect();

                let curve = Curve::new(format!("{name} {}", size_label(n)), size_color(idx), points)
                    .with_errors(errors);
                curves.push(if faded {
                    curve.with_marker(Marker::Square).faded()
                } else {
                    curve.with_marker(Marker::Circle)
                });
            }
        }

        let panel = LinePanel {
            title: "Speedup over the sequential version (solid = fixed, faded = naive)".to_owned(),
            x_label: "Threads".to_owned(),
            y_label: "Speedup (vs sequential)".to_owned(),
            x_ticks: threads.iter().map(|&t| f64::from(t)).collect(),
            curves,
            ref_lines: vec![RefLine::new(1.0, REFERENCE_COLOR).with_label("Baseline (1x)")],
            y_from_zero: true,
        };

        let figure = Figure::new(settings, SPEEDUP_VS_SEQUENTIAL).with_note(format!(
            "Speedup = T_seq / T_version. Mean of {} runs. Error bars: ±1 standard deviation.",
            settings.num_runs
        ));
        render_lines(&figure, &panel)?;
        write_plot_data(settings, figure.path(), &panel).await?;
        Ok(figure.path)
    }

    /// Fixed version time per thread count, sequential time as faint reference
    async fn absolute_time(
        &self,
        records: &[Record],
        threads: &[u32],
        settings: &Settings,
    ) -> Result<PathBuf> {
        let mut curves = Vec::new();
        let mut ref_lines = Vec::new();
        for (idx, n) in unique_values(records, |r| r.n).into_iter().enumerate() {
            let data_n = filter(records, &Criteria::new().n(n));
            let rows = threads
                .iter()
                .filter_map(|&t| {
                    find(
                        data_n.iter().copied(),
                        &Criteria::new().version(&self.fixed_version).threads(t),
                    )
                })
                .collect::<Vec<_>>();

            curves.push(
                Curve::new(
                    format!("Fixed {}", size_label(n)),
                    size_color(idx),
                    rows.iter()
                        .map(|r| (f64::from(r.threads), r.mean_time_ms()))
                        .collect(),
                )
                .with_errors(rows.iter().map(|r| r.std_dev_ms()).collect())
                .with_marker(Marker::Circle),
            );

            let seq_ms = try_baseline(data_n.iter().copied(), n).map_or(0.0, Record::mean_time_ms);
            ref_lines.push(RefLine::new(seq_ms, size_color(idx)).with_opacity(0.5));
        }

        let panel = LinePanel {
            title: "Execution time of the fixed version (faint lines = sequential time)".to_owned(),
            x_label: "Threads".to_owned(),
            y_label: "Mean time (ms)".to_owned(),
            x_ticks: threads.iter().map(|&t| f64::from(t)).collect(),
            curves,
            ref_lines,
            y_from_zero: true,
        };

        let figure = Figure::new(settings, ABSOLUTE_TIME).with_note(methodology_note(settings.num_runs));
        render_lines(&figure, &panel)?;
        write_plot_data(settings, figure.path(), &panel).await?;
        Ok(figure.path)
    }
}
