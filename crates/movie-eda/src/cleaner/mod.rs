//! Data cleaning for the movie dataset.
//!
//! This module provides:
//! - Missing value accounting on the raw input
//! - Release date parsing (unparsable dates become null)
//! - Placeholder filling for free-text columns
//! - Removal of undated rows and exact duplicates
//! - Strict coercion of the vote and popularity columns

mod converters;
mod sanitizers;

pub use converters::parse_date;

use crate::config::DEFAULT_PLACEHOLDER;
use crate::error::{Result, ResultExt};
use crate::types::{CleaningReport, columns};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Cleaner for the movie dataset.
#[derive(Debug, Clone)]
pub struct MovieCleaner {
    placeholder: String,
}

impl Default for MovieCleaner {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER)
    }
}

impl MovieCleaner {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    /// Clean a freshly loaded dataset.
    ///
    /// Steps, in order:
    /// 1. Count missing values per column
    /// 2. Parse `Release_Date`, nulling anything unparsable
    /// 3. Fill missing `Overview` and `Poster_Url` with the placeholder
    /// 4. Drop rows without a release date
    /// 5. Coerce `Vote_Count` to Int64, `Vote_Average` and `Popularity` to Float64
    /// 6. Remove exact duplicate rows, keeping the first
    ///
    /// Coercion failures are fatal; nothing else raises.
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, CleaningReport)> {
        let mut df = df;
        let mut report = CleaningReport {
            rows_before: df.height(),
            ..Default::default()
        };

        info!("Cleaning {} rows...", report.rows_before);

        // 1. Missing values on the raw input
        for col in df.get_columns() {
            report
                .missing_values
                .insert(col.name().to_string(), col.null_count());
        }
        let total_missing = report.total_missing();
        if total_missing > 0 {
            report
                .actions
                .push(format!("Found {} missing values", total_missing));
            for (name, count) in report.missing_values.iter().filter(|(_, c)| **c > 0) {
                debug!("  {}: {} missing", name, count);
            }
        } else {
            report.actions.push("No missing values found".to_string());
        }

        // 2. Release dates
        let (dates, unparsable) = converters::string_to_date(
            df.column(columns::RELEASE_DATE)?.as_materialized_series(),
        )
        .context("Failed to parse release dates")?;
        df.replace(columns::RELEASE_DATE, dates)?;
        report.unparsable_dates = unparsable;
        if unparsable > 0 {
            warn!("{} release dates could not be parsed", unparsable);
            report
                .actions
                .push(format!("Nulled {} unparsable release dates", unparsable));
        }

        // 3. Placeholders
        let filled = sanitizers::fill_placeholders(
            &mut df,
            &[columns::OVERVIEW, columns::POSTER_URL],
            &self.placeholder,
        )?;
        for (name, count) in filled {
            if count > 0 {
                report.actions.push(format!(
                    "Filled {} missing values in '{}' with '{}'",
                    count, name, self.placeholder
                ));
            }
            report.placeholders_filled.insert(name, count);
        }

        // 4. Undated rows
        let (dated, missing_dates) = sanitizers::drop_nulls_in(df, columns::RELEASE_DATE)?;
        df = dated;
        report.missing_dates = missing_dates;
        if missing_dates > 0 {
            report.actions.push(format!(
                "Dropped {} rows without a release date",
                missing_dates
            ));
            debug!("Dropped {} rows without a release date", missing_dates);
        }

        // 5. Declared types, so duplicates compare parsed numbers
        let vote_count =
            converters::coerce_to_int64(df.column(columns::VOTE_COUNT)?.as_materialized_series())?;
        df.replace(columns::VOTE_COUNT, vote_count)?;

        for name in [columns::VOTE_AVERAGE, columns::POPULARITY] {
            let coerced = converters::coerce_to_float64(df.column(name)?.as_materialized_series())?;
            df.replace(name, coerced)?;
        }
        report.actions.push(format!(
            "Converted '{}' to Int64, '{}' and '{}' to Float64",
            columns::VOTE_COUNT,
            columns::VOTE_AVERAGE,
            columns::POPULARITY
        ));

        // 6. Duplicates
        let before_duplicates = df.height();
        let (unique, duplicates_removed) = sanitizers::remove_duplicates(df)?;
        df = unique;
        report.duplicates_removed = duplicates_removed;
        if duplicates_removed > 0 {
            let pct = (duplicates_removed as f64 / before_duplicates as f64) * 100.0;
            report.actions.push(format!(
                "Removed {} duplicate rows ({:.1}%)",
                duplicates_removed, pct
            ));
            debug!("Removed {} duplicate rows", duplicates_removed);
        } else {
            report.actions.push("No duplicate rows found".to_string());
        }

        report.rows_after = df.height();
        info!(
            "Cleaning complete: {} -> {} rows",
            report.rows_before, report.rows_after
        );

        Ok((df, report))
    }

    /// Remove exact duplicate rows only.
    ///
    /// Applying this twice removes nothing the second time.
    pub fn deduplicate(&self, df: DataFrame) -> Result<(DataFrame, usize)> {
        Ok(sanitizers::remove_duplicates(df)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_frame() -> DataFrame {
        df![
            "Release_Date" => [Some("2021-12-15"), Some("not a date"), Some("2022-03-01"), Some("2022-03-01"), None],
            "Title" => ["Spider-Man", "Broken", "The Batman", "The Batman", "Undated"],
            "Overview" => [Some("Peter Parker"), Some("x"), None, None, Some("y")],
            "Popularity" => ["5083.954", "1.0", "3827.658", "3827.658", "2.0"],
            "Vote_Count" => ["8940", "1", "1151", "1151", "3"],
            "Vote_Average" => [Some("8.3"), Some("5.0"), Some("8.1"), Some("8.1"), None],
            "Genre" => ["Action, Adventure", "Drama", "Crime, Mystery", "Crime, Mystery", "Drama"],
            "Poster_Url" => [Some("http://a"), None, Some("http://c"), Some("http://c"), None],
        ]
        .unwrap()
    }

    #[test]
    fn test_clean_duplicates_compare_parsed_numbers() {
        let raw = df![
            "Release_Date" => ["2022-03-01", "2022-03-01"],
            "Title" => ["The Batman", "The Batman"],
            "Overview" => ["Gotham", "Gotham"],
            "Popularity" => ["3827.658", "3827.6580"],
            "Vote_Count" => ["1151", "1151.0"],
            "Vote_Average" => ["8.1", "8.10"],
            "Genre" => ["Crime, Mystery", "Crime, Mystery"],
            "Poster_Url" => ["http://c", "http://c"],
        ]
        .unwrap();
        let (df, report) = MovieCleaner::default().clean(raw).unwrap();

        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("Vote_Count").unwrap().i64().unwrap().get(0), Some(1151));
    }

    #[test]
    fn test_clean_counts_and_types() {
        let (df, report) = MovieCleaner::default().clean(raw_frame()).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(report.rows_before, 5);
        assert_eq!(report.rows_after, 2);
        assert_eq!(report.unparsable_dates, 1);
        assert_eq!(report.missing_dates, 2);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.missing_values["Overview"], 2);
        assert_eq!(report.missing_values["Release_Date"], 1);
        assert_eq!(report.placeholders_filled["Poster_Url"], 2);

        assert_eq!(df.column("Release_Date").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("Vote_Count").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Vote_Average").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Popularity").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_clean_leaves_no_null_dates() {
        let (df, _) = MovieCleaner::default().clean(raw_frame()).unwrap();
        assert_eq!(df.column("Release_Date").unwrap().null_count(), 0);
    }

    #[test]
    fn test_clean_fills_placeholder() {
        let (df, _) = MovieCleaner::new("N/A").clean(raw_frame()).unwrap();
        let overview = df.column("Overview").unwrap();

        assert_eq!(overview.null_count(), 0);
        assert_eq!(overview.str().unwrap().get(1), Some("N/A"));
    }

    #[test]
    fn test_deduplicate_idempotent() {
        let cleaner = MovieCleaner::default();
        let (df, _) = cleaner.clean(raw_frame()).unwrap();
        let (again, removed) = cleaner.deduplicate(df.clone()).unwrap();

        assert_eq!(removed, 0);
        assert!(df.equals_missing(&again));
    }

    #[test]
    fn test_clean_rejects_non_numeric_vote_count() {
        let mut df = raw_frame();
        let votes = Series::new("Vote_Count".into(), &["8940", "1", "lots", "lots", "3"]);
        df.replace("Vote_Count", votes).unwrap();

        let err = MovieCleaner::default().clean(df).unwrap_err();
        assert!(err.is_type_conversion());
    }

    #[test]
    fn test_clean_empty_frame() {
        let df = raw_frame().head(Some(0));
        let (df, report) = MovieCleaner::default().clean(df).unwrap();

        assert_eq!(df.height(), 0);
        assert_eq!(report.duplicates_removed, 0);
    }
}
