//! Chart rendering with `plotters`.
//!
//! Every chart is a standalone PNG in the output directory. Text needs a
//! TrueType font registered at runtime; when none can be found the charts are
//! still drawn, just without captions, tick labels or annotations.

use crate::config::ChartStyle;
use crate::error::{AnalysisError, Result, ResultExt};
use crate::pipeline::OutlierView;
use crate::profiler::DataProfiler;
use crate::types::{AnalysisReport, CorrelationMatrix, GenreAggregate, columns};
use crate::utils::f64_values;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontStyle;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::DataFrame;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::{debug, info, warn};

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Locations searched when no explicit font is configured.
const SYSTEM_FONTS: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Font families registered so far, and whether registration succeeded.
static FONTS: OnceLock<Mutex<HashMap<String, bool>>> = OnceLock::new();

/// The fixed chart set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    PopularityVsVotes,
    GenreCountDistribution,
    VoteAverageDistribution,
    CorrelationHeatmap,
    MonthlyRelease,
    GenreFrequency,
    AvgVoteByGenre,
    ReleasesPerYear,
}

impl ChartKind {
    pub const ALL: [ChartKind; 8] = [
        Self::PopularityVsVotes,
        Self::GenreCountDistribution,
        Self::VoteAverageDistribution,
        Self::CorrelationHeatmap,
        Self::MonthlyRelease,
        Self::GenreFrequency,
        Self::AvgVoteByGenre,
        Self::ReleasesPerYear,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::PopularityVsVotes => "popularity_vs_votes.png",
            Self::GenreCountDistribution => "genre_count_distribution.png",
            Self::VoteAverageDistribution => "vote_average_distribution.png",
            Self::CorrelationHeatmap => "correlation_heatmap.png",
            Self::MonthlyRelease => "monthly_release.png",
            Self::GenreFrequency => "genre_frequency.png",
            Self::AvgVoteByGenre => "avg_vote_by_genre.png",
            Self::ReleasesPerYear => "movies_released_per_year.png",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::PopularityVsVotes => "Popularity vs Vote Count",
            Self::GenreCountDistribution => "Number of Genres per Movie",
            Self::VoteAverageDistribution => "Vote Average Distribution",
            Self::CorrelationHeatmap => "Correlation Heatmap",
            Self::MonthlyRelease => "Movie Releases by Month",
            Self::GenreFrequency => "Number of Movies per Genre",
            Self::AvgVoteByGenre => "Average Movie Vote by Genre",
            Self::ReleasesPerYear => "Number of Movies Released Per Year",
        }
    }
}

/// Pre-aggregated inputs of every chart.
#[derive(Debug, Clone, Default)]
pub struct ChartData {
    /// (popularity, vote count) pairs from the outlier view.
    pub scatter: Vec<(f64, f64)>,
    pub vote_averages: Vec<f64>,
    pub genre_count_distribution: BTreeMap<i64, usize>,
    pub correlation: Option<CorrelationMatrix>,
    pub releases_per_month: BTreeMap<i32, usize>,
    pub releases_per_year: BTreeMap<i32, usize>,
    pub genre_aggregates: Vec<GenreAggregate>,
}

impl ChartData {
    /// Gather chart inputs, reusing the aggregates already in the report.
    ///
    /// Only the per-record series and the genre count distribution are read
    /// from the tables.
    pub fn from_report(
        report: &AnalysisReport,
        cleaned: &DataFrame,
        view: &OutlierView,
        profiler: &DataProfiler,
    ) -> Result<Self> {
        let popularity = f64_values(&view.data, columns::POPULARITY)?;
        let votes = f64_values(&view.data, columns::VOTE_COUNT)?;
        let scatter = popularity
            .into_iter()
            .zip(votes)
            .filter_map(|(p, v)| Some((p?, v?)))
            .collect();

        Ok(Self {
            scatter,
            vote_averages: f64_values(cleaned, columns::VOTE_AVERAGE)?
                .into_iter()
                .flatten()
                .collect(),
            genre_count_distribution: profiler.genre_count_distribution(cleaned)?,
            correlation: Some(report.correlation.clone()),
            releases_per_month: report.releases_per_month.clone(),
            releases_per_year: report.releases_per_year.clone(),
            genre_aggregates: report.genre_aggregates.clone(),
        })
    }
}

/// Equal-width histogram over `[min, max]`.
///
/// Returns `(start, end, count)` per bin; the last bin is closed on the right.
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let (mut min, mut max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if min == max {
        min -= 0.5;
        max += 0.5;
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = min + width * i as f64;
            (start, start + width, count)
        })
        .collect()
}

/// Renders the chart set with an explicit [`ChartStyle`].
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    output_dir: PathBuf,
    style: ChartStyle,
    histogram_bins: usize,
}

impl ChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, style: ChartStyle, histogram_bins: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            style,
            histogram_bins,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render a single chart, creating the output directory if needed.
    pub fn render(&self, kind: ChartKind, data: &ChartData) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .context(format!("Failed to create {}", self.output_dir.display()))?;

        let path = self.output_dir.join(kind.file_name());
        let text = self.font_available();

        let drawn = match kind {
            ChartKind::PopularityVsVotes => self.draw_scatter(&path, kind, &data.scatter, text),
            ChartKind::GenreCountDistribution => {
                let (labels, values) = labelled(&data.genre_count_distribution);
                self.draw_bars(&path, kind, ("Genre Count", "Number of Movies"), &labels, &values, text)
            }
            ChartKind::VoteAverageDistribution => self.draw_histogram(
                &path,
                kind,
                &histogram(&data.vote_averages, self.histogram_bins),
                text,
            ),
            ChartKind::CorrelationHeatmap => match &data.correlation {
                Some(matrix) => self.draw_heatmap(&path, kind, matrix, text),
                None => self.draw_empty(&path, kind, text),
            },
            ChartKind::MonthlyRelease => {
                let (labels, values) = labelled(&data.releases_per_month);
                self.draw_bars(&path, kind, ("Month", "Number of Movies"), &labels, &values, text)
            }
            ChartKind::GenreFrequency => {
                let (labels, values): (Vec<String>, Vec<f64>) = data
                    .genre_aggregates
                    .iter()
                    .map(|g| (g.genre.clone(), g.movie_count as f64))
                    .unzip();
                self.draw_horizontal_bars(&path, kind, ("Count", "Genre"), &labels, &values, text)
            }
            ChartKind::AvgVoteByGenre => {
                let mut by_vote: Vec<(String, f64)> = data
                    .genre_aggregates
                    .iter()
                    .filter_map(|g| Some((g.genre.clone(), g.mean_vote?)))
                    .collect();
                by_vote.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                let (labels, values): (Vec<String>, Vec<f64>) = by_vote.into_iter().unzip();
                self.draw_horizontal_bars(&path, kind, ("Average Vote", "Genre"), &labels, &values, text)
            }
            ChartKind::ReleasesPerYear => {
                self.draw_year_bars(&path, kind, &data.releases_per_year, text)
            }
        };

        drawn.map_err(|e| AnalysisError::Plot(format!("{}: {}", kind.file_name(), e)))?;
        debug!("Chart saved: {}", path.display());
        Ok(path)
    }

    /// Render every chart in [`ChartKind::ALL`] order.
    pub fn render_all(&self, data: &ChartData) -> Result<Vec<PathBuf>> {
        let paths = ChartKind::ALL
            .iter()
            .map(|kind| self.render(*kind, data))
            .collect::<Result<Vec<_>>>()?;
        info!("Rendered {} charts into {}", paths.len(), self.output_dir.display());
        Ok(paths)
    }

    // ------------------------------------------------------------------
    // Style helpers
    // ------------------------------------------------------------------

    fn rgb(color: [u8; 3]) -> RGBColor {
        RGBColor(color[0], color[1], color[2])
    }

    fn text_style(&self, size: u32) -> TextStyle<'_> {
        (self.style.font_family.as_str(), size as f64).into_font().into()
    }

    fn font_available(&self) -> bool {
        let fonts = FONTS.get_or_init(|| Mutex::new(HashMap::new()));
        let mut registered = fonts.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(ok) = registered.get(&self.style.font_family) {
            return *ok;
        }
        let ok = register_font(&self.style);
        registered.insert(self.style.font_family.clone(), ok);
        ok
    }

    fn prepare<'a>(
        &self,
        path: &'a Path,
    ) -> std::result::Result<DrawingArea<BitMapBackend<'a>, Shift>, Box<dyn std::error::Error>> {
        let root =
            BitMapBackend::new(path, (self.style.width, self.style.height)).into_drawing_area();
        root.fill(&Self::rgb(self.style.background))?;
        Ok(root)
    }

    fn builder<'a, 'b, DB: DrawingBackend>(
        &'b self,
        root: &'a DrawingArea<DB, Shift>,
        kind: ChartKind,
        text: bool,
        y_label_size: u32,
    ) -> ChartBuilder<'a, 'b, DB> {
        let mut builder = ChartBuilder::on(root);
        builder.margin(15);
        if text {
            builder
                .caption(kind.title(), (self.style.font_family.as_str(), self.style.title_font_size))
                .x_label_area_size(self.style.label_font_size * 3)
                .y_label_area_size(y_label_size);
        }
        builder
    }

    fn draw_empty(&self, path: &Path, kind: ChartKind, text: bool) -> DrawResult {
        let root = self.prepare(path)?;
        if text {
            root.titled(kind.title(), self.text_style(self.style.title_font_size))?;
        }
        root.present()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Charts
    // ------------------------------------------------------------------

    fn draw_scatter(&self, path: &Path, kind: ChartKind, points: &[(f64, f64)], text: bool) -> DrawResult {
        let root = self.prepare(path)?;
        let x_max = upper_bound(points.iter().map(|p| p.0));
        let y_max = upper_bound(points.iter().map(|p| p.1));

        let mut chart = self
            .builder(&root, kind, text, self.style.label_font_size * 5)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

        if text {
            chart
                .configure_mesh()
                .light_line_style(Self::rgb(self.style.grid_color).mix(0.5).stroke_width(1))
                .bold_line_style(Self::rgb(self.style.grid_color).stroke_width(1))
                .label_style(self.text_style(self.style.label_font_size))
                .axis_desc_style(self.text_style(self.style.label_font_size))
                .x_desc("Popularity")
                .y_desc("Vote Count")
                .draw()?;
        }

        let color = Self::rgb(self.style.primary_color);
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, color.mix(0.7).filled())),
        )?;

        root.present()?;
        Ok(())
    }

    fn draw_bars(
        &self,
        path: &Path,
        kind: ChartKind,
        (x_desc, y_desc): (&str, &str),
        labels: &[String],
        values: &[f64],
        text: bool,
    ) -> DrawResult {
        if labels.is_empty() {
            return self.draw_empty(path, kind, text);
        }
        let root = self.prepare(path)?;
        let n = labels.len() as i32;
        let y_max = upper_bound(values.iter().copied());

        let mut chart = self
            .builder(&root, kind, text, self.style.label_font_size * 4)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_max)?;

        if text {
            let formatter = |v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            };
            chart
                .configure_mesh()
                .disable_x_mesh()
                .bold_line_style(Self::rgb(self.style.grid_color).stroke_width(1))
                .light_line_style(Self::rgb(self.style.background).stroke_width(1))
                .x_labels(labels.len())
                .x_label_formatter(&formatter)
                .label_style(self.text_style(self.style.label_font_size))
                .axis_desc_style(self.text_style(self.style.label_font_size))
                .x_desc(x_desc)
                .y_desc(y_desc)
                .draw()?;
        }

        let color = Self::rgb(self.style.primary_color);
        chart.draw_series(values.iter().enumerate().map(|(i, v)| {
            let i = i as i32;
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                color.filled(),
            );
            bar.set_margin(0, 0, 6, 6);
            bar
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_horizontal_bars(
        &self,
        path: &Path,
        kind: ChartKind,
        (x_desc, y_desc): (&str, &str),
        labels: &[String],
        values: &[f64],
        text: bool,
    ) -> DrawResult {
        if labels.is_empty() {
            return self.draw_empty(path, kind, text);
        }
        let root = self.prepare(path)?;
        let n = labels.len() as i32;
        let x_max = upper_bound(values.iter().copied());
        let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32;

        let mut chart = self
            .builder(&root, kind, text, self.style.label_font_size * (longest / 2 + 3))
            .build_cartesian_2d(0f64..x_max, (0..n).into_segmented())?;

        // first label on top
        let row = |i: usize| n - 1 - i as i32;

        if text {
            let formatter = |v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(r) => labels
                    .get((n - 1 - *r) as usize)
                    .cloned()
                    .unwrap_or_default(),
                _ => String::new(),
            };
            chart
                .configure_mesh()
                .disable_y_mesh()
                .bold_line_style(Self::rgb(self.style.grid_color).stroke_width(1))
                .light_line_style(Self::rgb(self.style.background).stroke_width(1))
                .y_labels(labels.len())
                .y_label_formatter(&formatter)
                .label_style(self.text_style(self.style.label_font_size))
                .axis_desc_style(self.text_style(self.style.label_font_size))
                .x_desc(x_desc)
                .y_desc(y_desc)
                .draw()?;
        }

        let color = Self::rgb(self.style.accent_color);
        chart.draw_series(values.iter().enumerate().map(|(i, v)| {
            let r = row(i);
            let mut bar = Rectangle::new(
                [(0.0, SegmentValue::Exact(r)), (*v, SegmentValue::Exact(r + 1))],
                color.filled(),
            );
            bar.set_margin(3, 3, 0, 0);
            bar
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_histogram(&self, path: &Path, kind: ChartKind, bins: &[(f64, f64, usize)], text: bool) -> DrawResult {
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            return self.draw_empty(path, kind, text);
        };
        let root = self.prepare(path)?;
        let y_max = upper_bound(bins.iter().map(|b| b.2 as f64));

        let mut chart = self
            .builder(&root, kind, text, self.style.label_font_size * 4)
            .build_cartesian_2d(first.0..last.1, 0f64..y_max)?;

        if text {
            chart
                .configure_mesh()
                .disable_x_mesh()
                .bold_line_style(Self::rgb(self.style.grid_color).stroke_width(1))
                .light_line_style(Self::rgb(self.style.background).stroke_width(1))
                .label_style(self.text_style(self.style.label_font_size))
                .axis_desc_style(self.text_style(self.style.label_font_size))
                .x_desc("Vote Average")
                .y_desc("Frequency")
                .draw()?;
        }

        let fill = Self::rgb(self.style.primary_color);
        let edge = Self::rgb(self.style.background);
        chart.draw_series(bins.iter().flat_map(|&(start, end, count)| {
            [
                Rectangle::new([(start, 0.0), (end, count as f64)], fill.mix(0.8).filled()),
                Rectangle::new([(start, 0.0), (end, count as f64)], edge.stroke_width(1)),
            ]
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_year_bars(&self, path: &Path, kind: ChartKind, counts: &BTreeMap<i32, usize>, text: bool) -> DrawResult {
        let (Some((&first, _)), Some((&last, _))) = (counts.first_key_value(), counts.last_key_value()) else {
            return self.draw_empty(path, kind, text);
        };
        let root = self.prepare(path)?;
        let y_max = upper_bound(counts.values().map(|c| *c as f64));

        let mut chart = self
            .builder(&root, kind, text, self.style.label_font_size * 4)
            .build_cartesian_2d(first as f64 - 0.5..last as f64 + 0.5, 0f64..y_max)?;

        if text {
            chart
                .configure_mesh()
                .disable_x_mesh()
                .bold_line_style(Self::rgb(self.style.grid_color).stroke_width(1))
                .light_line_style(Self::rgb(self.style.background).stroke_width(1))
                .x_label_formatter(&|x| format!("{:.0}", x))
                .label_style(self.text_style(self.style.label_font_size))
                .axis_desc_style(self.text_style(self.style.label_font_size))
                .x_desc("Year")
                .y_desc("Number of Movies")
                .draw()?;
        }

        let color = Self::rgb(self.style.primary_color);
        chart.draw_series(counts.iter().map(|(&year, &count)| {
            let x = year as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, count as f64)], color.filled())
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_heatmap(&self, path: &Path, kind: ChartKind, matrix: &CorrelationMatrix, text: bool) -> DrawResult {
        let n = matrix.columns.len() as i32;
        if n == 0 {
            return self.draw_empty(path, kind, text);
        }
        let root = self.prepare(path)?;
        let longest = matrix.columns.iter().map(|c| c.len()).max().unwrap_or(0) as u32;

        let mut chart = self
            .builder(&root, kind, text, self.style.label_font_size * (longest / 2 + 2))
            .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())?;

        // row 0 is drawn on top
        let flip = |i: i32| n - 1 - i;

        if text {
            let x_fmt = |v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(j) => matrix.columns.get(*j as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            };
            let y_fmt = |v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(r) => matrix
                    .columns
                    .get(flip(*r) as usize)
                    .cloned()
                    .unwrap_or_default(),
                _ => String::new(),
            };
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(matrix.columns.len())
                .y_labels(matrix.columns.len())
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .label_style(self.text_style(self.style.label_font_size))
                .draw()?;
        }

        let cells: Vec<(i32, i32, f64)> = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| (i, j, matrix.values[i as usize][j as usize]))
            .collect();

        chart.draw_series(cells.iter().map(|&(i, j, v)| {
            Rectangle::new(
                [
                    (SegmentValue::Exact(j), SegmentValue::Exact(flip(i))),
                    (SegmentValue::Exact(j + 1), SegmentValue::Exact(flip(i) + 1)),
                ],
                coolwarm(v).filled(),
            )
        }))?;

        if text {
            let annotation = self
                .text_style(self.style.label_font_size)
                .pos(Pos::new(HPos::Center, VPos::Center));
            chart.draw_series(cells.iter().map(|&(i, j, v)| {
                Text::new(
                    format!("{:.2}", v),
                    (SegmentValue::CenterOf(j), SegmentValue::CenterOf(flip(i))),
                    annotation.clone(),
                )
            }))?;
        }

        root.present()?;
        Ok(())
    }
}

/// Axis upper bound with headroom; 1.0 when there is nothing positive.
fn upper_bound(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0f64, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}

fn labelled<K: ToString>(counts: &BTreeMap<K, usize>) -> (Vec<String>, Vec<f64>) {
    counts
        .iter()
        .map(|(k, v)| (k.to_string(), *v as f64))
        .unzip()
}

/// Diverging blue-grey-red colour for a correlation in `[-1, 1]`.
fn coolwarm(value: f64) -> RGBColor {
    const COLD: [f64; 3] = [59.0, 76.0, 192.0];
    const MID: [f64; 3] = [221.0, 221.0, 221.0];
    const WARM: [f64; 3] = [180.0, 4.0, 38.0];

    let t = value.clamp(-1.0, 1.0);
    let (from, to, f) = if t < 0.0 { (MID, COLD, -t) } else { (MID, WARM, t) };
    let channel = |k: usize| (from[k] + (to[k] - from[k]) * f).round() as u8;
    RGBColor(channel(0), channel(1), channel(2))
}

/// Load a TrueType font and register it under the style's family name.
fn register_font(style: &ChartStyle) -> bool {
    let candidates = style
        .font_path
        .iter()
        .cloned()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

    for candidate in candidates {
        let Ok(bytes) = fs::read(&candidate) else {
            continue;
        };
        // plotters keeps a reference for the rest of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match plotters::style::register_font(&style.font_family, FontStyle::Normal, bytes) {
            Ok(()) => {
                info!("Using font {} for charts", candidate.display());
                return true;
            }
            Err(_) => warn!("Unusable font {}", candidate.display()),
        }
    }

    warn!("No TrueType font found; charts will be rendered without text");
    false
}
