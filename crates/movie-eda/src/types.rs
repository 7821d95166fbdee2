use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Canonical column names of the movie dataset.
///
/// The `mymoviedb.csv` header naming is the only accepted schema; variants with
/// other names must be renamed before analysis.
pub mod columns {
    pub const RELEASE_DATE: &str = "Release_Date";
    pub const TITLE: &str = "Title";
    pub const OVERVIEW: &str = "Overview";
    pub const POPULARITY: &str = "Popularity";
    pub const VOTE_COUNT: &str = "Vote_Count";
    pub const VOTE_AVERAGE: &str = "Vote_Average";
    pub const GENRE: &str = "Genre";
    pub const POSTER_URL: &str = "Poster_Url";

    pub const YEAR: &str = "Year";
    pub const MONTH: &str = "Month";
    pub const GENRE_COUNT: &str = "Genre_Count";
    pub const POPULARITY_NORM: &str = "Popularity_Norm";

    /// Columns every input file must provide.
    pub const REQUIRED: [&str; 8] = [
        RELEASE_DATE,
        TITLE,
        OVERVIEW,
        POPULARITY,
        VOTE_COUNT,
        VOTE_AVERAGE,
        GENRE,
        POSTER_URL,
    ];

    /// Numeric columns summarised by the descriptive statistics.
    pub const NUMERIC: [&str; 7] = [
        POPULARITY,
        VOTE_COUNT,
        VOTE_AVERAGE,
        YEAR,
        MONTH,
        GENRE_COUNT,
        POPULARITY_NORM,
    ];

    /// Columns entering the correlation heatmap.
    pub const CORRELATED: [&str; 4] = [POPULARITY, VOTE_COUNT, VOTE_AVERAGE, GENRE_COUNT];
}

/// A single movie row with its derived features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub title: String,
    pub genre: String,
    pub release_date: Option<NaiveDate>,
    pub overview: String,
    pub poster_url: String,
    pub popularity: Option<f64>,
    pub vote_count: i64,
    pub vote_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity_norm: Option<f64>,
}

/// What the cleaner did to the dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Rows handed to the cleaner.
    pub rows_before: usize,
    /// Rows retained after cleaning.
    pub rows_after: usize,
    /// Missing values per column, counted on the raw input.
    pub missing_values: BTreeMap<String, usize>,
    /// Release dates that were present but could not be parsed.
    pub unparsable_dates: usize,
    /// Rows dropped because their release date was missing or unparsable.
    pub missing_dates: usize,
    /// Placeholder substitutions per text column.
    pub placeholders_filled: BTreeMap<String, usize>,
    /// Exact duplicate rows removed.
    pub duplicates_removed: usize,
    /// Human-readable log of every cleaning action.
    pub actions: Vec<String>,
}

impl CleaningReport {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    pub fn total_missing(&self) -> usize {
        self.missing_values.values().sum()
    }
}

/// Inclusive popularity range outside of which a record is an outlier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl OutlierBounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Serializable outcome of the outlier filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierSummary {
    pub column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<OutlierBounds>,
    pub rows_kept: usize,
    pub rows_removed: usize,
}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Frequency and mean vote of a single genre over the exploded records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreAggregate {
    pub genre: String,
    pub movie_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_vote: Option<f64>,
}

/// Pearson correlation between a fixed set of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` x `columns.len()`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == row)?;
        let j = self.columns.iter().position(|c| c == col)?;
        Some(self.values[i][j])
    }
}

/// Everything the reporter computes about the cleaned dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: String,
    pub input_file: String,
    pub shape: (usize, usize),
    pub cleaning: CleaningReport,
    pub statistics: Vec<ColumnStatistics>,
    pub most_voted: Vec<MovieRecord>,
    pub outliers: OutlierSummary,
    pub genre_aggregates: Vec<GenreAggregate>,
    pub releases_per_year: BTreeMap<i32, usize>,
    pub releases_per_month: BTreeMap<i32, usize>,
    pub correlation: CorrelationMatrix,
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub report: AnalysisReport,
    /// Paths of the chart images written.
    pub charts: Vec<PathBuf>,
    /// Path of the cleaned CSV.
    pub cleaned_csv: PathBuf,
    /// Path of the JSON report, when enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_file: Option<PathBuf>,
    pub duration_ms: u64,
}
