//! Configuration types for the movie analysis pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! Defaults reproduce the conventional layout: `data/mymoviedb.csv` in,
//! charts under `visuals_output/`, cleaned data at `data/mymoviedb_cleaned.csv`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default placeholder written into missing text fields.
pub const DEFAULT_PLACEHOLDER: &str = "Not Available";

/// Visual style for rendered charts.
///
/// Passed explicitly to the chart renderer; there is no global plotting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Font family used for every text element.
    pub font_family: String,
    /// Explicit TrueType font to load. When `None`, common system locations
    /// are searched.
    pub font_path: Option<PathBuf>,
    pub title_font_size: u32,
    pub label_font_size: u32,
    /// RGB background colour.
    pub background: [u8; 3],
    /// RGB colour of the grid lines.
    pub grid_color: [u8; 3],
    /// RGB colour used for bars and markers.
    pub primary_color: [u8; 3],
    /// RGB colour used for secondary series.
    pub accent_color: [u8; 3],
}

impl Default for ChartStyle {
    fn default() -> Self {
        // 10x6 inch figure at 100 dpi on a white grid
        Self {
            width: 1000,
            height: 600,
            font_family: "sans-serif".to_string(),
            font_path: None,
            title_font_size: 26,
            label_font_size: 16,
            background: [255, 255, 255],
            grid_color: [221, 221, 221],
            primary_color: [76, 114, 176],
            accent_color: [221, 132, 82],
        }
    }
}

/// Configuration for the analysis pipeline.
///
/// Use [`AnalysisConfig::builder()`] to create a new configuration with a
/// fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use movie_eda::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .input_path("data/mymoviedb.csv")
///     .output_dir("visuals_output")
///     .iqr_multiplier(1.5)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Path of the CSV file to analyse.
    /// Default: "data/mymoviedb.csv"
    pub input_path: PathBuf,

    /// Directory receiving the chart images and the JSON report.
    /// Default: "visuals_output"
    pub output_dir: PathBuf,

    /// Destination of the cleaned CSV.
    /// Default: "data/mymoviedb_cleaned.csv"
    pub cleaned_csv_path: PathBuf,

    /// Text written into missing `Overview` and `Poster_Url` values.
    /// Default: "Not Available"
    pub placeholder: String,

    /// Separator between genre names in the `Genre` column.
    /// Default: ","
    pub genre_separator: String,

    /// The only byte that terminates a CSV record.
    /// Default: b'\n'
    pub line_terminator: u8,

    /// Multiplier applied to the IQR when computing outlier bounds.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Number of bins in the vote average histogram.
    /// Default: 10
    pub histogram_bins: usize,

    /// Whether to write `eda_report.json` next to the charts.
    /// Default: true
    pub generate_report: bool,

    /// Style passed to the chart renderer.
    pub chart_style: ChartStyle,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/mymoviedb.csv"),
            output_dir: PathBuf::from("visuals_output"),
            cleaned_csv_path: PathBuf::from("data/mymoviedb_cleaned.csv"),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            genre_separator: ",".to_string(),
            line_terminator: b'\n',
            iqr_multiplier: 1.5,
            histogram_bins: 10,
            generate_report: true,
            chart_style: ChartStyle::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidIqrMultiplier(
                self.iqr_multiplier,
            ));
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidHistogramBins(
                self.histogram_bins,
            ));
        }

        if self.genre_separator.is_empty()
            || self.genre_separator.contains('\n')
            || self.genre_separator.contains('\r')
        {
            return Err(ConfigValidationError::InvalidGenreSeparator(
                self.genre_separator.clone(),
            ));
        }

        if self.placeholder.trim().is_empty() {
            return Err(ConfigValidationError::EmptyPlaceholder);
        }

        if self.chart_style.width == 0 || self.chart_style.height == 0 {
            return Err(ConfigValidationError::InvalidChartSize {
                width: self.chart_style.width,
                height: self.chart_style.height,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid IQR multiplier: {0} (must be a positive finite number)")]
    InvalidIqrMultiplier(f64),

    #[error("Invalid histogram bins: {0} (must be at least 1)")]
    InvalidHistogramBins(usize),

    #[error("Invalid genre separator: {0:?}")]
    InvalidGenreSeparator(String),

    #[error("Placeholder text must not be empty")]
    EmptyPlaceholder,

    #[error("Invalid chart size: {width}x{height}")]
    InvalidChartSize { width: u32, height: u32 },
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    input_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    cleaned_csv_path: Option<PathBuf>,
    placeholder: Option<String>,
    genre_separator: Option<String>,
    line_terminator: Option<u8>,
    iqr_multiplier: Option<f64>,
    histogram_bins: Option<usize>,
    generate_report: Option<bool>,
    chart_style: Option<ChartStyle>,
}

impl AnalysisConfigBuilder {
    /// Set the CSV file to analyse.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the directory for charts and the JSON report.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the destination of the cleaned CSV.
    pub fn cleaned_csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cleaned_csv_path = Some(path.into());
        self
    }

    /// Set the placeholder used for missing text fields.
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    /// Set the separator between genre names.
    pub fn genre_separator(mut self, separator: impl Into<String>) -> Self {
        self.genre_separator = Some(separator.into());
        self
    }

    /// Set the record terminator byte.
    pub fn line_terminator(mut self, byte: u8) -> Self {
        self.line_terminator = Some(byte);
        self
    }

    /// Set the IQR multiplier for the outlier bounds.
    ///
    /// # Arguments
    /// * `k` - Positive factor (e.g., 1.5 for Tukey fences)
    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Enable or disable the JSON report.
    pub fn generate_report(mut self, generate: bool) -> Self {
        self.generate_report = Some(generate);
        self
    }

    /// Set the chart style.
    pub fn chart_style(mut self, style: ChartStyle) -> Self {
        self.chart_style = Some(style);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            input_path: self.input_path.unwrap_or(defaults.input_path),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            cleaned_csv_path: self.cleaned_csv_path.unwrap_or(defaults.cleaned_csv_path),
            placeholder: self.placeholder.unwrap_or(defaults.placeholder),
            genre_separator: self.genre_separator.unwrap_or(defaults.genre_separator),
            line_terminator: self.line_terminator.unwrap_or(defaults.line_terminator),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            generate_report: self.generate_report.unwrap_or(defaults.generate_report),
            chart_style: self.chart_style.unwrap_or(defaults.chart_style),
        };

        config.validate()?;
        Ok(config)
    }
}
