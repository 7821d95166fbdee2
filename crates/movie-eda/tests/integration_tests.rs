//! Integration tests for the movie analysis pipeline.
//!
//! These tests run the whole pipeline against small CSV fixtures and check
//! the files it leaves behind.

use movie_eda::{
    AnalysisConfig, AnalysisError, AnalysisPipeline, AnalysisResult, AnalysisStage, ChartKind,
    DataProfiler, FeatureDeriver, MovieCleaner, MovieLoader, OutlierFilter, ProgressUpdate,
    REPORT_FILE_NAME,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config_for(fixture: &str, out: &Path) -> AnalysisConfig {
    AnalysisConfig::builder()
        .input_path(fixtures_path().join(fixture))
        .output_dir(out.join("visuals_output"))
        .cleaned_csv_path(out.join("data").join("cleaned.csv"))
        .build()
        .unwrap()
}

fn run_fixture(fixture: &str) -> (TempDir, AnalysisResult) {
    let dir = tempfile::tempdir().unwrap();
    let result = AnalysisPipeline::builder()
        .config(config_for(fixture, dir.path()))
        .build()
        .unwrap()
        .run()
        .unwrap();
    (dir, result)
}

fn run_fixture_err(fixture: &str) -> AnalysisError {
    let dir = tempfile::tempdir().unwrap();
    AnalysisPipeline::builder()
        .config(config_for(fixture, dir.path()))
        .build()
        .unwrap()
        .run()
        .unwrap_err()
}

/// `Popularity_Norm` is the last column of the persisted CSV; empty cells are null.
fn persisted_popularity_norm(path: &Path) -> Vec<Option<f64>> {
    let content = fs::read_to_string(path).unwrap();
    let mut lines = content.lines();
    assert!(lines.next().unwrap().ends_with(",Popularity_Norm"));
    lines
        .map(|line| {
            let cell = line.rsplit(',').next().unwrap();
            (!cell.is_empty()).then(|| cell.parse::<f64>().unwrap())
        })
        .collect()
}

// ============================================================================
// Full Pipeline
// ============================================================================

#[test]
fn test_full_pipeline_sample() {
    let (_dir, result) = run_fixture("movies_sample.csv");
    let cleaning = &result.report.cleaning;

    assert_eq!(cleaning.rows_before, 5);
    assert_eq!(cleaning.rows_after, 3);
    assert_eq!(cleaning.unparsable_dates, 1);
    assert_eq!(cleaning.missing_dates, 1);
    assert_eq!(cleaning.duplicates_removed, 1);
    assert_eq!(cleaning.missing_values["Overview"], 1);
    assert_eq!(cleaning.missing_values["Poster_Url"], 1);
    assert_eq!(cleaning.placeholders_filled["Overview"], 1);

    // 8 canonical columns, the pass-through language column and 4 derived ones
    assert_eq!(result.report.shape, (3, 13));
}

#[test]
fn test_full_pipeline_report_contents() {
    let (_dir, result) = run_fixture("movies_sample.csv");
    let report = &result.report;

    assert_eq!(report.most_voted.len(), 1);
    assert_eq!(report.most_voted[0].title, "Spider-Man: No Way Home");
    assert_eq!(report.most_voted[0].vote_count, 8940);

    assert_eq!(report.genre_aggregates.len(), 6);
    let top = &report.genre_aggregates[0];
    assert_eq!(top.genre, "Thriller");
    assert_eq!(top.movie_count, 2);
    assert!((top.mean_vote.unwrap() - 7.2).abs() < 1e-9);

    assert_eq!(report.releases_per_year.get(&2021), Some(&1));
    assert_eq!(report.releases_per_year.get(&2022), Some(&2));
    assert_eq!(report.releases_per_month.get(&3), Some(&1));

    let diagonal = report.correlation.get("Popularity", "Popularity").unwrap();
    assert!((diagonal - 1.0).abs() < 1e-9);
}

#[test]
fn test_full_pipeline_writes_all_charts() {
    let (dir, result) = run_fixture("movies_sample.csv");

    assert_eq!(result.charts.len(), ChartKind::ALL.len());
    for kind in ChartKind::ALL {
        let path = dir.path().join("visuals_output").join(kind.file_name());
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']), "{} is not a PNG", path.display());
    }
}

#[test]
fn test_full_pipeline_writes_cleaned_csv() {
    let (dir, result) = run_fixture("movies_sample.csv");

    assert_eq!(result.cleaned_csv, dir.path().join("data").join("cleaned.csv"));
    let content = fs::read_to_string(&result.cleaned_csv).unwrap();
    let mut lines = content.lines();
    let header = lines.next().unwrap();

    assert!(header.starts_with("Release_Date,Title,Overview,Popularity"));
    assert!(header.ends_with("Year,Month,Genre_Count,Popularity_Norm"));
    assert_eq!(lines.count(), 3);
    assert!(content.contains("Not Available"));
    assert!(!content.contains("Broken Row"));
    assert_eq!(content.matches("The Batman").count(), 1);
}

#[test]
fn test_full_pipeline_writes_json_report() {
    let (dir, result) = run_fixture("movies_sample.csv");

    let report_file = result.report_file.unwrap();
    assert_eq!(report_file, dir.path().join("visuals_output").join(REPORT_FILE_NAME));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report_file).unwrap()).unwrap();
    assert_eq!(json["cleaning"]["duplicates_removed"], 1);
    assert_eq!(json["most_voted"][0]["title"], "Spider-Man: No Way Home");
}

#[test]
fn test_full_pipeline_without_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for("movies_sample.csv", dir.path());
    config.generate_report = false;

    let result = AnalysisPipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(result.report_file.is_none());
    assert!(!dir.path().join("visuals_output").join(REPORT_FILE_NAME).exists());
}

// ============================================================================
// Outliers
// ============================================================================

#[test]
fn test_outlier_hidden_from_view_but_kept_in_csv() {
    let (_dir, result) = run_fixture("popularity_outlier.csv");
    let outliers = &result.report.outliers;

    assert_eq!(outliers.column, "Popularity");
    assert_eq!(outliers.rows_removed, 1);
    assert_eq!(outliers.rows_kept, 8);
    let bounds = outliers.bounds.unwrap();
    assert_eq!(bounds.q1, 12.0);
    assert_eq!(bounds.q3, 16.0);
    assert_eq!(bounds.upper, 22.0);

    assert_eq!(result.report.cleaning.rows_after, 9);
    let content = fs::read_to_string(&result.cleaned_csv).unwrap();
    assert!(content.contains("Blockbuster"));
}

#[test]
fn test_persisted_popularity_norm_spans_unit_range() {
    let (_dir, result) = run_fixture("popularity_outlier.csv");
    let norms: Vec<f64> = persisted_popularity_norm(&result.cleaned_csv)
        .into_iter()
        .map(Option::unwrap)
        .collect();

    assert_eq!(norms.len(), 9);
    let min = norms.iter().copied().fold(f64::INFINITY, f64::min);
    let max = norms.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(min, 0.0);
    assert_eq!(max, 1.0);
}

// ============================================================================
// Null-like Tokens
// ============================================================================

#[test]
fn test_null_like_popularity_is_missing() {
    let (_dir, result) = run_fixture("null_tokens.csv");
    let report = &result.report;

    assert_eq!(report.cleaning.rows_after, 6);
    assert_eq!(report.cleaning.missing_values["Popularity"], 3);
    assert_eq!(report.cleaning.missing_values["Vote_Average"], 1);
    assert_eq!(report.cleaning.placeholders_filled["Overview"], 1);

    let popularity = report
        .statistics
        .iter()
        .find(|s| s.column == "Popularity")
        .unwrap();
    assert_eq!(popularity.count, 3);
    assert_eq!(popularity.mean, Some(20.0));
}

#[test]
fn test_null_like_popularity_keeps_outlier_view_intact() {
    let (_dir, result) = run_fixture("null_tokens.csv");
    let outliers = &result.report.outliers;

    let bounds = outliers.bounds.unwrap();
    assert_eq!(bounds.q1, 15.0);
    assert_eq!(bounds.q3, 25.0);
    assert!(bounds.lower.is_finite() && bounds.upper.is_finite());
    assert_eq!(outliers.rows_removed, 0);
    assert_eq!(outliers.rows_kept, 6);
}

#[test]
fn test_null_like_popularity_norm_is_empty_in_csv() {
    let (_dir, result) = run_fixture("null_tokens.csv");
    let norms = persisted_popularity_norm(&result.cleaned_csv);

    assert_eq!(norms, vec![Some(0.0), None, Some(0.5), None, None, Some(1.0)]);
    let content = fs::read_to_string(&result.cleaned_csv).unwrap();
    assert!(!content.contains("NaN"));
}

#[test]
fn test_stages_compose_without_pipeline() {
    let raw = MovieLoader::default()
        .load(&fixtures_path().join("popularity_outlier.csv"))
        .unwrap();
    let (cleaned, _) = MovieCleaner::default().clean(raw).unwrap();
    let enriched = FeatureDeriver::default().derive(cleaned).unwrap();

    let view = OutlierFilter::default().filter(&enriched).unwrap();
    assert_eq!(view.data.height(), 8);
    assert_eq!(enriched.height(), 9);

    let genres = DataProfiler::default().genre_aggregates(&enriched).unwrap();
    let names: Vec<&str> = genres.iter().map(|g| g.genre.as_str()).collect();
    assert_eq!(names[..4].to_vec(), vec!["Comedy", "Drama", "Horror", "Romance"]);
}

// ============================================================================
// Progress Reporting
// ============================================================================

#[test]
fn test_progress_updates_cover_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();

    AnalysisPipeline::builder()
        .config(config_for("movies_sample.csv", dir.path()))
        .on_progress(move |update| sink.lock().unwrap().push(update))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let updates = updates.lock().unwrap();
    for stage in [
        AnalysisStage::Loading,
        AnalysisStage::Cleaning,
        AnalysisStage::FeatureDerivation,
        AnalysisStage::OutlierFiltering,
        AnalysisStage::Profiling,
        AnalysisStage::Plotting,
        AnalysisStage::Writing,
    ] {
        assert!(updates.iter().any(|u| u.stage == stage), "no update for {:?}", stage);
    }

    let chart_updates = updates
        .iter()
        .filter(|u| u.items_total == Some(ChartKind::ALL.len()))
        .count();
    assert_eq!(chart_updates, ChartKind::ALL.len());

    let last = updates.last().unwrap();
    assert_eq!(last.stage, AnalysisStage::Complete);
    assert_eq!(last.progress, 1.0);

    let progress: Vec<f32> = updates.iter().map(|u| u.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_missing_input_file() {
    let err = run_fixture_err("does_not_exist.csv");
    assert!(matches!(err, AnalysisError::FileNotFound(_)));
    assert_eq!(err.error_code(), "FILE_NOT_FOUND");
}

#[test]
fn test_unparsable_vote_count_is_fatal() {
    let err = run_fixture_err("bad_vote_count.csv");
    assert!(err.is_type_conversion(), "unexpected error: {}", err);
    match err {
        AnalysisError::TypeConversionFailed { column, .. } => assert_eq!(column, "Vote_Count"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_column_is_rejected() {
    let err = run_fixture_err("missing_column.csv");
    match err {
        AnalysisError::MissingColumns(missing) => assert_eq!(missing, vec!["Poster_Url"]),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_failed_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let result = AnalysisPipeline::builder()
        .config(config_for("bad_vote_count.csv", dir.path()))
        .build()
        .unwrap()
        .run();

    assert!(result.is_err());
    assert!(!dir.path().join("data").join("cleaned.csv").exists());
    assert!(!dir.path().join("visuals_output").exists());
}
