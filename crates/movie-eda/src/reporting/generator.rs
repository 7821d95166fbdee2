use crate::error::{Result, ResultExt};
use crate::profiler::DataProfiler;
use crate::types::{AnalysisReport, CleaningReport, OutlierSummary};
use chrono::Local;
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the JSON report inside the output directory.
pub const REPORT_FILE_NAME: &str = "eda_report.json";

/// Inputs for [`ReportGenerator::build_report`].
pub struct ReportParams<'a> {
    pub input_file: &'a Path,
    /// Cleaned table with derived columns.
    pub df: &'a DataFrame,
    pub cleaning: &'a CleaningReport,
    pub outliers: OutlierSummary,
    pub profiler: &'a DataProfiler,
}

/// Assembles the analysis report and writes the persisted outputs.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Compute every summary of the cleaned table.
    pub fn build_report(params: ReportParams<'_>) -> Result<AnalysisReport> {
        let ReportParams {
            input_file,
            df,
            cleaning,
            outliers,
            profiler,
        } = params;

        let report = AnalysisReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.display().to_string(),
            shape: df.shape(),
            cleaning: cleaning.clone(),
            statistics: profiler.describe(df)?,
            most_voted: profiler.most_voted(df)?,
            outliers,
            genre_aggregates: profiler.genre_aggregates(df)?,
            releases_per_year: profiler.releases_per_year(df)?,
            releases_per_month: profiler.releases_per_month(df)?,
            correlation: profiler.correlation_matrix(df)?,
        };

        debug!(
            "Report built: {} statistics, {} genres",
            report.statistics.len(),
            report.genre_aggregates.len()
        );
        Ok(report)
    }

    /// Write the report as pretty JSON into the output directory.
    pub fn write_report(&self, report: &AnalysisReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .context(format!("Failed to create {}", self.output_dir.display()))?;

        let report_path = self.output_dir.join(REPORT_FILE_NAME);
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }

    /// Write the cleaned table, header included, creating parent directories.
    pub fn write_cleaned_csv(df: &mut DataFrame, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .context(format!("Failed to create {}", parent.display()))?;
        }

        let mut file = File::create(path).context(format!("Failed to create {}", path.display()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(df)
            .context(format!("Failed to write {}", path.display()))?;

        info!("Cleaned dataset saved: {}", path.display());
        Ok(path.to_path_buf())
    }
}
