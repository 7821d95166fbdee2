//! Report generation module.
//!
//! This module turns the cleaned table into the run's outputs:
//! - [`ReportGenerator`] builds the [`AnalysisReport`](crate::types::AnalysisReport),
//!   writes `eda_report.json` and persists the cleaned CSV
//! - [`ChartRenderer`] renders the PNG chart set
//!
//! # Example
//!
//! ```rust,ignore
//! use movie_eda::reporting::{ChartData, ChartRenderer, ReportGenerator};
//!
//! let data = ChartData::from_report(&report, &cleaned, &view, &profiler)?;
//! let charts = ChartRenderer::new("visuals_output", style, 10).render_all(&data)?;
//! ReportGenerator::write_cleaned_csv(&mut cleaned, Path::new("data/mymoviedb_cleaned.csv"))?;
//! ```

mod charts;
mod generator;

pub use charts::{ChartData, ChartKind, ChartRenderer, histogram};
pub use generator::{REPORT_FILE_NAME, ReportGenerator, ReportParams};
