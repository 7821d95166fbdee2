//! Progress reporting for the analysis pipeline.
//!
//! The pipeline emits a [`ProgressUpdate`] at the start of each stage and once
//! per rendered chart. Reporters receive updates synchronously on the thread
//! running the pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use movie_eda::AnalysisPipeline;
//!
//! let result = AnalysisPipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the analysis pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Reading and validating the input file
    Loading,
    /// Parsing dates, filling placeholders, dropping rows, coercing types
    Cleaning,
    /// Adding year, month, genre count and normalized popularity
    FeatureDerivation,
    /// Building the IQR view used by the scatter chart
    OutlierFiltering,
    /// Computing statistics and aggregates
    Profiling,
    /// Rendering chart images
    Plotting,
    /// Writing the cleaned CSV and the JSON report
    Writing,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl AnalysisStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Cleaning => "Cleaning Data",
            Self::FeatureDerivation => "Deriving Features",
            Self::OutlierFiltering => "Filtering Outliers",
            Self::Profiling => "Profiling Dataset",
            Self::Plotting => "Rendering Charts",
            Self::Writing => "Writing Outputs",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the whole run this stage typically takes.
    ///
    /// Weights of the working stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.10,
            Self::Cleaning => 0.15,
            Self::FeatureDerivation => 0.05,
            Self::OutlierFiltering => 0.05,
            Self::Profiling => 0.15,
            Self::Plotting => 0.40,
            Self::Writing => 0.10,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Cleaning => 0.10,
            Self::FeatureDerivation => 0.25,
            Self::OutlierFiltering => 0.30,
            Self::Profiling => 0.35,
            Self::Plotting => 0.50,
            Self::Writing => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: AnalysisStage,

    /// Optional detail within the stage (e.g., a chart file name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    pub fn new(stage: AnalysisStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        Self {
            stage,
            sub_stage: None,
            progress: (stage.base_progress() + stage.weight() * stage_progress).clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Update for item `current` of `total` within a stage.
    pub fn with_items(
        stage: AnalysisStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, stage_progress, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Complete, 1.0, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Failed, 0.0, message)
    }
}

/// Receives progress updates from the pipeline.
///
/// Implementations must be `Send + Sync` so a pipeline can be moved to a
/// worker thread together with its reporter.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WORKING_STAGES: [AnalysisStage; 7] = [
        AnalysisStage::Loading,
        AnalysisStage::Cleaning,
        AnalysisStage::FeatureDerivation,
        AnalysisStage::OutlierFiltering,
        AnalysisStage::Profiling,
        AnalysisStage::Plotting,
        AnalysisStage::Writing,
    ];

    #[test]
    fn test_stage_weights_sum() {
        let total: f32 = WORKING_STAGES.iter().map(|s| s.weight()).sum();
        assert!((total - 1.0).abs() < 0.01, "Weights should sum to ~1.0");
    }

    #[test]
    fn test_base_progress_is_cumulative() {
        let mut expected = 0.0;
        for stage in WORKING_STAGES {
            assert!((stage.base_progress() - expected).abs() < 1e-6, "{stage:?}");
            expected += stage.weight();
        }
    }

    #[test]
    fn test_progress_update_with_items() {
        let update = ProgressUpdate::with_items(
            AnalysisStage::Plotting,
            "genre_frequency.png",
            2,
            8,
            "Rendering genre frequency",
        );
        assert_eq!(update.stage, AnalysisStage::Plotting);
        assert_eq!(update.sub_stage.as_deref(), Some("genre_frequency.png"));
        assert_eq!(update.stage_progress, 0.25);
        assert!((update.progress - 0.6).abs() < 1e-6);
        assert_eq!(update.items_total, Some(8));
    }

    #[test]
    fn test_progress_update_terminal_states() {
        assert_eq!(ProgressUpdate::complete("Done").progress, 1.0);
        let failed = ProgressUpdate::failed("boom");
        assert_eq!(failed.stage, AnalysisStage::Failed);
        assert_eq!(failed.progress, 0.0);
    }

    #[test]
    fn test_stage_json_values() {
        let json = serde_json::to_string(&AnalysisStage::FeatureDerivation).unwrap();
        assert_eq!(json, "\"feature_derivation\"");

        let update = ProgressUpdate::new(AnalysisStage::Cleaning, 0.0, "Cleaning");
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"stage\":\"cleaning\""));
        assert!(!json.contains("sub_stage"));
    }

    #[test]
    fn test_closure_progress_reporter_across_threads() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let counter = call_count.clone();
        let reporter = Arc::new(ClosureProgressReporter::new(move |_update| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let worker = reporter.clone();
        std::thread::spawn(move || {
            worker.report(ProgressUpdate::new(AnalysisStage::Loading, 0.5, "Loading"));
        })
        .join()
        .unwrap();
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }
}
