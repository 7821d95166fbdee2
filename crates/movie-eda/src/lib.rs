//! Movie Dataset Exploratory Analysis Library
//!
//! A batch analysis library for tabular movie datasets built with Rust and Polars.
//!
//! # Overview
//!
//! One run reads a CSV of movies and produces:
//!
//! - **Cleaning**: missing-value accounting, date parsing, placeholder fill,
//!   numeric coercion and duplicate removal
//! - **Derived features**: release year and month, genre count and min-max
//!   normalised popularity
//! - **Outlier view**: IQR-based popularity filter used for visualization only
//! - **Report**: descriptive statistics, most-voted movies, genre aggregates,
//!   release counts and a correlation matrix, optionally written as JSON
//! - **Charts**: a fixed set of PNG images
//! - **Cleaned CSV**: the cleaned table with its derived columns
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use movie_eda::{AnalysisConfig, AnalysisPipeline};
//!
//! let config = AnalysisConfig::builder()
//!     .input_path("data/mymoviedb.csv")
//!     .output_dir("visuals_output")
//!     .cleaned_csv_path("data/mymoviedb_cleaned.csv")
//!     .build()?;
//!
//! let result = AnalysisPipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! println!("Rows kept: {}", result.report.cleaning.rows_after);
//! println!("Charts written: {}", result.charts.len());
//! ```
//!
//! # Using the stages directly
//!
//! Every stage is usable on its own with an in-memory [`polars::prelude::DataFrame`]:
//!
//! ```rust,ignore
//! use movie_eda::{DataProfiler, FeatureDeriver, MovieCleaner, MovieLoader, OutlierFilter};
//!
//! let raw = MovieLoader::default().load_from_str(csv_text)?;
//! let (cleaned, cleaning) = MovieCleaner::default().clean(raw)?;
//! let enriched = FeatureDeriver::default().derive(cleaned)?;
//! let view = OutlierFilter::default().filter(&enriched)?;
//! let genres = DataProfiler::default().genre_aggregates(&enriched)?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod features;
pub mod loader;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{MovieCleaner, parse_date};
pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, ChartStyle, ConfigValidationError, DEFAULT_PLACEHOLDER,
};
pub use error::{AnalysisError, ResultExt};
pub use features::FeatureDeriver;
pub use loader::MovieLoader;
pub use pipeline::{
    AnalysisPipeline, AnalysisPipelineBuilder, AnalysisStage, ClosureProgressReporter,
    OutlierFilter, OutlierView, ProgressReporter, ProgressUpdate,
};
pub use profiler::DataProfiler;
pub use reporting::{
    ChartData, ChartKind, ChartRenderer, REPORT_FILE_NAME, ReportGenerator, ReportParams,
};
pub use types::{
    AnalysisReport, AnalysisResult, CleaningReport, ColumnStatistics, CorrelationMatrix,
    GenreAggregate, MovieRecord, OutlierBounds, OutlierSummary, columns,
};
