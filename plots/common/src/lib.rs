use std::path::{Path, PathBuf};

use common::{config::Settings, util::cycled};
use eyre::Result;
use plotters::{
    coord::{
        Shift,
        combinators::{BindKeyPoints, WithKeyPoints},
        ranged1d::{DefaultFormatting, KeyPointHint, Ranged},
        types::RangedCoordf64,
    },
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use serde::Serialize;
use tracing::debug;

pub const FONT: &str = "sans-serif";
pub const NOTE_COLOR: RGBColor = RGBColor(128, 128, 128);
pub const REFERENCE_COLOR: RGBColor = RGBColor(128, 128, 128);

/// One colour per problem size
pub const SIZE_PALETTE: [RGBColor; 3] = [
    RGBColor(0x34, 0x98, 0xdb),
    RGBColor(0x2e, 0xcc, 0x71),
    RGBColor(0xe7, 0x4c, 0x3c),
];
pub const SIZE_MARKERS: [Marker; 3] = [Marker::Circle, Marker::Square, Marker::Triangle];

const NOTE_AREA: i32 = 30;

type Chart<'a, 'b, X = RangedCoordf64> =
    ChartContext<'a, SVGBackend<'b>, Cartesian2d<X, RangedCoordf64>>;

/// `WithKeyPoints<RangedCoordf64>` with `DefaultFormatting`, so the mesh can be configured
struct KeyPointAxis(WithKeyPoints<RangedCoordf64>);

impl Ranged for KeyPointAxis {
    type ValueType = f64;
    type FormatOption = DefaultFormatting;

    fn range(&self) -> std::ops::Range<f64> {
        self.0.range()
    }

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.0.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        self.0.key_points(hint)
    }

    fn axis_pixel_range(&self, limit: (i32, i32)) -> std::ops::Range<i32> {
        self.0.axis_pixel_range(limit)
    }
}

/// Output file and framing shared by every panel of a chart
#[derive(Debug, Clone)]
pub struct Figure {
    pub path: PathBuf,
    pub size: (u32, u32),
    pub title: Option<String>,
    pub note: Option<String>,
}

impl Figure {
    pub fn new(settings: &Settings, file_name: &str) -> Self {
        Self {
            path: settings.output_dir.join(file_name),
            size: (settings.width, settings.height),
            title: None,
            note: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
}

/// Horizontal line across the whole panel
#[derive(Debug, Clone, Serialize)]
pub struct RefLine {
    pub y: f64,
    pub label: Option<String>,
    #[serde(skip)]
    pub color: RGBColor,
    #[serde(skip)]
    pub opacity: f64,
}

impl RefLine {
    pub fn new(y: f64, color: RGBColor) -> Self {
        Self {
            y,
            label: None,
            color,
            opacity: 0.7,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BarSeries {
    pub label: String,
    pub values: Vec<f64>,
    /// Symmetric error per value, empty for no error bars
    pub errors: Vec<f64>,
    #[serde(skip)]
    pub color: RGBColor,
    /// Per-bar colours overriding `color`
    #[serde(skip)]
    pub bar_colors: Vec<RGBColor>,
    #[serde(skip)]
    pub value_label: Option<fn(f64) -> String>,
}

impl BarSeries {
    pub fn new(label: impl Into<String>, color: RGBColor, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
            errors: Vec::new(),
            color,
            bar_colors: Vec::new(),
            value_label: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<f64>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_value_labels(mut self, format: fn(f64) -> String) -> Self {
        self.value_label = Some(format);
        self
    }
}

/// Grouped bars, one group per category and one bar per series in each group
#[derive(Debug, Clone, Serialize)]
pub struct BarPanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
    pub ref_lines: Vec<RefLine>,
    pub show_legend: bool,
}

/// A single bar per category, each with its own colour
pub fn single_bar_panel(
    title: impl Into<String>,
    y_label: impl Into<String>,
    bars: Vec<(String, RGBColor, f64, f64)>,
    value_label: fn(f64) -> String,
) -> BarPanel {
    let mut categories = Vec::with_capacity(bars.len());
    let mut colors = Vec::with_capacity(bars.len());
    let mut values = Vec::with_capacity(bars.len());
    let mut errors = Vec::with_capacity(bars.len());
    for (label, color, value, error) in bars {
        categories.push(label);
        colors.push(color);
        values.push(value);
        errors.push(error);
    }

    let mut series = BarSeries::new("", BLACK, values)
        .with_errors(errors)
        .with_value_labels(value_label);
    series.bar_colors = colors;

    BarPanel {
        title: title.into(),
        x_label: String::new(),
        y_label: y_label.into(),
        categories,
        series: vec![series],
        ref_lines: Vec::new(),
        show_legend: false,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Curve {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    /// Symmetric error per point, empty for no error bars
    pub errors: Vec<f64>,
    pub marker: Marker,
    /// Drawn translucent, used for secondary variants
    pub faded: bool,
    #[serde(skip)]
    pub color: RGBColor,
}

impl Curve {
    pub fn new(label: impl Into<String>, color: RGBColor, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            points,
            errors: Vec::new(),
            marker: Marker::Circle,
            faded: false,
            color,
        }
    }

    pub fn with_errors(mut self, errors: Vec<f64>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    pub fn faded(mut self) -> Self {
        self.faded = true;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LinePanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_ticks: Vec<f64>,
    pub curves: Vec<Curve>,
    pub ref_lines: Vec<RefLine>,
    /// Clamp the y axis at zero instead of fitting negative values
    pub y_from_zero: bool,
}

pub fn size_color(idx: usize) -> RGBColor {
    cycled(&SIZE_PALETTE, idx)
}

pub fn size_marker(idx: usize) -> Marker {
    cycled(&SIZE_MARKERS, idx)
}

pub fn methodology_note(num_runs: usize) -> String {
    format!("Each point: mean of {num_runs} runs. Error bars: ±1 standard deviation.")
}

pub fn format_ms(value: f64) -> String {
    format!("{value:.3}")
}

pub fn format_speedup(value: f64) -> String {
    format!("{value:.2}x")
}

/// Renders `panels` side by side into one figure
pub fn render_bars(figure: &Figure, panels: &[BarPanel]) -> Result<()> {
    let root = SVGBackend::new(&figure.path, figure.size).into_drawing_area();
    root.fill(&WHITE)?;
    let body = frame(&root, figure)?;

    let areas = body.split_evenly((1, panels.len().max(1)));
    for (area, panel) in areas.iter().zip(panels) {
        draw_bar_panel(area, panel)?;
    }

    root.present()?;
    debug!("Wrote {}", figure.path.display());
    Ok(())
}

pub fn render_lines(figure: &Figure, panel: &LinePanel) -> Result<()> {
    let root = SVGBackend::new(&figure.path, figure.size).into_drawing_area();
    root.fill(&WHITE)?;
    let body = frame(&root, figure)?;

    draw_line_panel(&body, panel)?;

    root.present()?;
    debug!("Wrote {}", figure.path.display());
    Ok(())
}

/// Draws the title and footnote, returns the area left for the panels
fn frame<'a>(
    root: &DrawingArea<SVGBackend<'a>, Shift>,
    figure: &Figure,
) -> Result<DrawingArea<SVGBackend<'a>, Shift>> {
    let (_, height) = root.dim_in_pixel();
    let (body, footer) = root.split_vertically(height as i32 - NOTE_AREA);

    if let Some(note) = &figure.note {
        let (width, footer_height) = footer.dim_in_pixel();
        let style = (FONT, 13)
            .into_font()
            .style(FontStyle::Italic)
            .color(&NOTE_COLOR)
            .pos(Pos::new(HPos::Center, VPos::Center));
        footer.draw_text(
            note,
            &style,
            (width as i32 / 2, footer_height as i32 / 2),
        )?;
    }

    Ok(match &figure.title {
        Some(title) => body.titled(title, (FONT, 22).into_font().style(FontStyle::Bold))?,
        None => body,
    })
}

fn draw_bar_panel(area: &DrawingArea<SVGBackend<'_>, Shift>, panel: &BarPanel) -> Result<()> {
    let num_categories = panel.categories.len().max(1);
    let x_range = (-0.5, num_categories as f64 - 0.5);
    let y_max = axis_max(
        panel
            .series
            .iter()
            .flat_map(|s| {
                s.values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| v + s.errors.get(i).copied().unwrap_or(0.0))
            })
            .chain(panel.ref_lines.iter().map(|l| l.y)),
    );

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, (FONT, 18).into_font().style(FontStyle::Bold))
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.0..x_range.1, 0f64..y_max)?;

    let categories = &panel.categories;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(num_categories + 1)
        .x_label_formatter(&|x| category_label(categories, *x))
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .draw()?;

    let group_width = 0.8;
    let bar_width = group_width / panel.series.len().max(1) as f64;
    let value_style = TextStyle::from((FONT, 11).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));

    let mut has_legend = false;
    for (j, series) in panel.series.iter().enumerate() {
        let offset = -group_width / 2.0 + j as f64 * bar_width;
        let color = series.color;
        let bars = series
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| (i as f64 + offset, v))
            .collect::<Vec<_>>();

        let anno = chart.draw_series(bars.iter().enumerate().map(|(i, &(x0, v))| {
            let fill = series.bar_colors.get(i).copied().unwrap_or(color);
            Rectangle::new([(x0, 0.0), (x0 + bar_width, v)], fill.filled())
        }))?;
        if !series.label.is_empty() {
            has_legend = true;
            anno.label(series.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
        chart.draw_series(bars.iter().map(|&(x0, v)| {
            Rectangle::new([(x0, 0.0), (x0 + bar_width, v)], BLACK.stroke_width(1))
        }))?;

        if !series.errors.is_empty() {
            chart.draw_series(bars.iter().zip(&series.errors).filter(|(_, e)| **e > 0.0).map(
                |(&(x0, v), &e)| {
                    ErrorBar::new_vertical(
                        x0 + bar_width / 2.0,
                        (v - e).max(0.0),
                        v,
                        v + e,
                        BLACK.stroke_width(1),
                        6,
                    )
                },
            ))?;
        }

        if let Some(format) = series.value_label {
            chart.draw_series(bars.iter().filter(|(_, v)| *v > 0.0).map(|&(x0, v)| {
                Text::new(
                    format(v),
                    (x0 + bar_width / 2.0, v + y_max * 0.02),
                    value_style.clone(),
                )
            }))?;
        }
    }

    has_legend |= draw_ref_lines(&mut chart, &panel.ref_lines, x_range)?;
    if panel.show_legend && has_legend {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

fn draw_line_panel(area: &DrawingArea<SVGBackend<'_>, Shift>, panel: &LinePanel) -> Result<()> {
    let x_min = panel.x_ticks.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = panel.x_ticks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (x_min, x_max) = if x_min.is_finite() && x_max.is_finite() {
        (x_min, x_max)
    } else {
        (0.0, 1.0)
    };
    let pad = ((x_max - x_min) * 0.05).max(0.5);
    let x_range = (x_min - pad, x_max + pad);

    let highs = panel
        .curves
        .iter()
        .flat_map(|c| {
            c.points
                .iter()
                .enumerate()
                .map(|(i, p)| p.1 + c.errors.get(i).copied().unwrap_or(0.0))
        })
        .chain(panel.ref_lines.iter().map(|l| l.y));
    let y_max = axis_max(highs);
    let y_min = if panel.y_from_zero {
        0.0
    } else {
        axis_min(
            panel
                .curves
                .iter()
                .flat_map(|c| {
                    c.points
                        .iter()
                        .enumerate()
                        .map(|(i, p)| p.1 - c.errors.get(i).copied().unwrap_or(0.0))
                })
                .chain(panel.ref_lines.iter().map(|l| l.y)),
        )
    };

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, (FONT, 18).into_font().style(FontStyle::Bold))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(
            KeyPointAxis((x_range.0..x_range.1).with_key_points(panel.x_ticks.clone())),
            y_min..y_max,
        )?;

    let ticks = &panel.x_ticks;
    chart
        .configure_mesh()
        .x_labels(ticks.len().max(2))
        .x_label_formatter(&|x| tick_label(ticks, *x))
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .draw()?;

    let mut has_legend = false;
    for curve in &panel.curves {
        let color = curve.color.mix(if curve.faded { 0.6 } else { 1.0 });
        let line_style = color.stroke_width(if curve.faded { 1 } else { 2 });

        let anno = chart.draw_series(LineSeries::new(curve.points.iter().copied(), line_style))?;
        if !curve.label.is_empty() {
            has_legend = true;
            anno.label(curve.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));
        }

        match curve.marker {
            Marker::Circle => {
                chart.draw_series(curve.points.iter().map(|&p| Circle::new(p, 5, color.filled())))?
            }
            Marker::Square => chart.draw_series(curve.points.iter().map(|&p| {
                EmptyElement::at(p) + Rectangle::new([(-4, -4), (4, 4)], color.filled())
            }))?,
            Marker::Triangle => chart.draw_series(
                curve
                    .points
                    .iter()
                    .map(|&p| TriangleMarker::new(p, 6, color.filled())),
            )?,
        };

        if !curve.errors.is_empty() {
            chart.draw_series(curve.points.iter().zip(&curve.errors).map(|(&(x, y), &e)| {
                ErrorBar::new_vertical(x, y - e, y, y + e, color.stroke_width(1), 8)
            }))?;
        }
    }

    has_legend |= draw_ref_lines(&mut chart, &panel.ref_lines, x_range)?;
    if has_legend {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

/// Returns whether any of the lines carries a legend entry
fn draw_ref_lines<X: Ranged<ValueType = f64>>(
    chart: &mut Chart<'_, '_, X>,
    lines: &[RefLine],
    x_range: (f64, f64),
) -> Result<bool> {
    let mut labelled = false;
    for line in lines {
        let style = line.color.mix(line.opacity).stroke_width(2);
        let anno = chart.draw_series(LineSeries::new(
            [(x_range.0, line.y), (x_range.1, line.y)],
            style,
        ))?;
        if let Some(label) = &line.label {
            labelled = true;
            anno.label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
    }
    Ok(labelled)
}

fn draw_legend<'a, X: Ranged<ValueType = f64>>(chart: &mut Chart<'a, 'a, X>) -> Result<()> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font((FONT, 12))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

fn tick_label(ticks: &[f64], x: f64) -> String {
    match ticks.iter().find(|t| (**t - x).abs() < 1e-6) {
        Some(t) => format!("{t:.0}"),
        None => String::new(),
    }
}

/// Upper axis bound with headroom for labels, 1 when nothing is positive
pub fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
    if max > 0.0 { max * 1.15 } else { 1.0 }
}

/// Lower axis bound, never above zero
pub fn axis_min(values: impl Iterator<Item = f64>) -> f64 {
    let min = values.filter(|v| v.is_finite()).fold(0.0, f64::min);
    if min < 0.0 { min * 1.15 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_bounds() {
        assert_eq!(axis_max([].into_iter()), 1.0);
        assert_eq!(axis_max([0.0, 0.0].into_iter()), 1.0);
        assert!((axis_max([1.0, 2.0, f64::NAN].into_iter()) - 2.3).abs() < 1e-12);
        assert_eq!(axis_min([1.0, 2.0].into_iter()), 0.0);
        assert!((axis_min([-10.0, 5.0].into_iter()) + 11.5).abs() < 1e-12);
    }

    #[test]
    fn labels_only_on_whole_positions() {
        let categories = vec!["Seq".to_owned(), "SIMD".to_owned()];
        assert_eq!(category_label(&categories, 1.0), "SIMD");
        assert_eq!(category_label(&categories, 0.5), "");
        assert_eq!(category_label(&categories, -0.5), "");
        assert_eq!(category_label(&categories, 2.0), "");

        let ticks = [1.0, 2.0, 4.0];
        assert_eq!(tick_label(&ticks, 4.0), "4");
        assert_eq!(tick_label(&ticks, 3.0), "");
    }

    #[test]
    fn single_bars_keep_their_colour() {
        let panel = single_bar_panel(
            "N = 1,000",
            "Mean time (ms)",
            vec![
                ("Seq".to_owned(), size_color(0), 2.0, 0.1),
                ("SIMD".to_owned(), size_color(1), 0.5, 0.02),
            ],
            format_ms,
        );
        assert_eq!(panel.categories, vec!["Seq", "SIMD"]);
        assert_eq!(panel.series.len(), 1);
        assert_eq!(panel.series[0].values, vec![2.0, 0.5]);
        assert_eq!(panel.series[0].errors, vec![0.1, 0.02]);
        assert_eq!(panel.series[0].bar_colors, vec![size_color(0), size_color(1)]);
    }

    #[test]
    fn renders_svg_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path().join("in.csv"), dir.path().to_path_buf());

        let figure = Figure::new(&settings, "bars.svg")
            .with_title("Bars")
            .with_note(methodology_note(5));
        let panel = BarPanel {
            title: "N = 1,000".to_owned(),
            x_label: "Threads".to_owned(),
            y_label: "Mean time (ms)".to_owned(),
            categories: vec!["1".to_owned(), "2".to_owned()],
            series: vec![
                BarSeries::new("A", size_color(0), vec![1.0, 2.0]).with_errors(vec![0.1, 0.2]),
                BarSeries::new("B", size_color(1), vec![0.5, 0.0]).with_value_labels(format_ms),
            ],
            ref_lines: vec![RefLine::new(1.5, REFERENCE_COLOR).with_label("Sequential")],
            show_legend: true,
        };
        render_bars(&figure, &[panel.clone(), panel]).unwrap();
        assert!(figure.path().exists());

        let figure = Figure::new(&settings, "lines.svg");
        let panel = LinePanel {
            title: "Overhead".to_owned(),
            x_label: "Threads".to_owned(),
            y_label: "%".to_owned(),
            x_ticks: vec![1.0, 2.0, 4.0],
            curves: vec![
                Curve::new("N = 1,000", size_color(0), vec![(1.0, -5.0), (2.0, 3.0), (4.0, 8.0)])
                    .with_errors(vec![1.0, 1.0, 1.0])
                    .with_marker(Marker::Triangle),
                Curve::new("N = 2,000", size_color(1), vec![(1.0, 1.0)])
                    .with_marker(Marker::Square)
                    .faded(),
            ],
            ref_lines: vec![RefLine::new(0.0, REFERENCE_COLOR)],
            y_from_zero: false,
        };
        render_lines(&figure, &panel).unwrap();
        let svg = std::fs::read_to_string(figure.path()).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn every_thread_count_gets_a_label() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path().join("in.csv"), dir.path().to_path_buf());
        let threads = [1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0];

        let figure = Figure::new(&settings, "wide.svg");
        let panel = LinePanel {
            title: "Speedup".to_owned(),
            x_label: "Threads".to_owned(),
            y_label: "Speedup".to_owned(),
            x_ticks: threads.to_vec(),
            curves: vec![Curve::new(
                "",
                size_color(0),
                threads.iter().map(|&t| (t, 0.5 / t)).collect(),
            )],
            ref_lines: Vec::new(),
            y_from_zero: true,
        };
        render_lines(&figure, &panel).unwrap();

        let svg = std::fs::read_to_string(figure.path()).unwrap();
        let labels = svg
            .split("<text")
            .skip(1)
            .filter_map(|s| s.split_once('>').and_then(|(_, rest)| rest.split_once("</text>")))
            .map(|(text, _)| text.trim().to_owned())
            .collect::<Vec<_>>();
        for t in threads {
            let label = format!("{t:.0}");
            assert!(labels.contains(&label), "no label for {label} in {labels:?}");
        }
    }
}
