//! Main analysis pipeline module.
//!
//! This module provides the `AnalysisPipeline` struct and builder that run
//! loading, cleaning, feature derivation, outlier filtering, reporting,
//! plotting and writing in sequence.

use crate::cleaner::MovieCleaner;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::features::FeatureDeriver;
use crate::loader::MovieLoader;
use crate::pipeline::outliers::OutlierFilter;
use crate::pipeline::progress::{
    AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::profiler::DataProfiler;
use crate::reporting::{ChartData, ChartKind, ChartRenderer, ReportGenerator, ReportParams};
use crate::types::{AnalysisResult, columns};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// The movie analysis pipeline.
///
/// Use [`AnalysisPipeline::builder()`] to create a pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use movie_eda::{AnalysisConfig, AnalysisPipeline};
///
/// let config = AnalysisConfig::builder()
///     .input_path("data/mymoviedb.csv")
///     .output_dir("visuals_output")
///     .build()?;
///
/// let result = AnalysisPipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
///
/// println!("{} rows kept", result.report.cleaning.rows_after);
/// ```
pub struct AnalysisPipeline {
    config: AnalysisConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    loader: MovieLoader,
    cleaner: MovieCleaner,
    deriver: FeatureDeriver,
    outlier_filter: OutlierFilter,
    profiler: DataProfiler,
    reporter: ReportGenerator,
    renderer: ChartRenderer,
}

// Pipelines can be moved to a worker thread
static_assertions::assert_impl_all!(AnalysisPipeline: Send);

impl AnalysisPipeline {
    pub fn builder() -> AnalysisPipelineBuilder {
        AnalysisPipelineBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage against the configured input file.
    ///
    /// Any stage failure aborts the run; a `Failed` progress update is
    /// emitted before the error is returned.
    pub fn run(&self) -> Result<AnalysisResult> {
        match self.run_internal() {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Analysis completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn stage(&self, stage: AnalysisStage, message: &str) {
        info!("{}", message);
        self.report_progress(ProgressUpdate::new(stage, 0.0, message));
    }

    fn run_internal(&self) -> Result<AnalysisResult> {
        let start_time = Instant::now();

        // Step 1: Load
        self.stage(AnalysisStage::Loading, "Step 1: Loading dataset...");
        let raw = self.loader.load(&self.config.input_path)?;

        // Step 2: Clean
        self.stage(AnalysisStage::Cleaning, "Step 2: Cleaning dataset...");
        let (cleaned, cleaning) = self.cleaner.clean(raw)?;

        // Step 3: Derive features
        self.stage(AnalysisStage::FeatureDerivation, "Step 3: Deriving features...");
        let mut enriched = self.deriver.derive(cleaned)?;

        // Step 4: Outlier view, used by the scatter chart only
        self.stage(AnalysisStage::OutlierFiltering, "Step 4: Filtering popularity outliers...");
        let view = self.outlier_filter.filter(&enriched)?;

        // Step 5: Statistics and aggregates
        self.stage(AnalysisStage::Profiling, "Step 5: Computing statistics...");
        let report = ReportGenerator::build_report(ReportParams {
            input_file: &self.config.input_path,
            df: &enriched,
            cleaning: &cleaning,
            outliers: view.summary(self.outlier_filter.column()),
            profiler: &self.profiler,
        })?;

        // Step 6: Charts
        self.stage(AnalysisStage::Plotting, "Step 6: Rendering charts...");
        let chart_data = ChartData::from_report(&report, &enriched, &view, &self.profiler)?;
        let total = ChartKind::ALL.len();
        let mut charts = Vec::with_capacity(total);
        for (i, kind) in ChartKind::ALL.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                AnalysisStage::Plotting,
                kind.file_name(),
                i,
                total,
                format!("Rendering {}", kind.title()),
            ));
            charts.push(self.renderer.render(*kind, &chart_data)?);
        }

        // Step 7: Persist
        self.stage(AnalysisStage::Writing, "Step 7: Writing outputs...");
        let cleaned_csv =
            ReportGenerator::write_cleaned_csv(&mut enriched, &self.config.cleaned_csv_path)?;
        let report_file = if self.config.generate_report {
            Some(self.reporter.write_report(&report)?)
        } else {
            None
        };

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!("Analysis finished in {} ms", duration_ms);

        Ok(AnalysisResult {
            report,
            charts,
            cleaned_csv,
            report_file,
            duration_ms,
        })
    }
}

/// Builder for [`AnalysisPipeline`].
#[derive(Default)]
pub struct AnalysisPipelineBuilder {
    config: Option<AnalysisConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(AnalysisPipelineBuilder: Send);

impl AnalysisPipelineBuilder {
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during the run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For anything beyond a closure, use
    /// [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<AnalysisPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(AnalysisPipeline {
            loader: MovieLoader::new(config.line_terminator),
            cleaner: MovieCleaner::new(config.placeholder.clone()),
            deriver: FeatureDeriver::new(config.genre_separator.clone()),
            outlier_filter: OutlierFilter::new(columns::POPULARITY, config.iqr_multiplier),
            profiler: DataProfiler::new(config.genre_separator.clone()),
            reporter: ReportGenerator::new(config.output_dir.clone()),
            renderer: ChartRenderer::new(
                config.output_dir.clone(),
                config.chart_style.clone(),
                config.histogram_bins,
            ),
            progress_reporter: self.progress_reporter,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = AnalysisPipeline::builder().build().unwrap();
        assert!(pipeline.progress_reporter.is_none());
        assert_eq!(pipeline.config().iqr_multiplier, 1.5);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let mut config = AnalysisConfig::default();
        config.histogram_bins = 0;
        let err = AnalysisPipeline::builder()
            .config(config)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_pipeline_builder_with_progress_callback() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let counter = call_count.clone();

        let pipeline = AnalysisPipeline::builder()
            .on_progress(move |_update| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        pipeline.report_progress(ProgressUpdate::new(AnalysisStage::Loading, 0.5, "Test"));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_missing_input_reports_failure() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = stages.clone();
        let config = AnalysisConfig::builder()
            .input_path("definitely/not/here.csv")
            .build()
            .unwrap();

        let err = AnalysisPipeline::builder()
            .config(config)
            .on_progress(move |update| seen.lock().unwrap().push(update.stage))
            .build()
            .unwrap()
            .run()
            .unwrap_err();

        assert!(matches!(err, AnalysisError::FileNotFound(_)));
        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&AnalysisStage::Loading));
        assert_eq!(stages.last(), Some(&AnalysisStage::Failed));
    }
}
