//! Pipeline module.
//!
//! This module provides the analysis pipeline, its progress reporting and
//! the outlier view used for visualization.

mod builder;
pub mod outliers;
pub mod progress;

pub use builder::{AnalysisPipeline, AnalysisPipelineBuilder};
pub use outliers::{OutlierFilter, OutlierView};
pub use progress::{AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
