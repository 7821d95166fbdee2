//! Derived columns computed from the cleaned dataset.

use crate::error::Result;
use crate::types::columns;
use crate::utils::{date_values, f64_values, string_values};
use chrono::Datelike;
use polars::prelude::*;
use tracing::{debug, info};

/// Adds `Year`, `Month`, `Genre_Count` and `Popularity_Norm`.
#[derive(Debug, Clone)]
pub struct FeatureDeriver {
    genre_separator: String,
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::new(",")
    }
}

impl FeatureDeriver {
    pub fn new(genre_separator: impl Into<String>) -> Self {
        Self {
            genre_separator: genre_separator.into(),
        }
    }

    /// Append the derived columns, replacing them if already present.
    ///
    /// Expects a cleaned frame: `Release_Date` must be a `Date` column and
    /// `Popularity` numeric.
    pub fn derive(&self, df: DataFrame) -> Result<DataFrame> {
        let mut df = df;
        info!("Deriving features for {} rows...", df.height());

        let dates = date_values(&df, columns::RELEASE_DATE)?;
        let years: Vec<Option<i32>> = dates.iter().map(|d| d.map(|d| d.year())).collect();
        let months: Vec<Option<i32>> = dates.iter().map(|d| d.map(|d| d.month() as i32)).collect();
        df.with_column(Series::new(columns::YEAR.into(), years))?;
        df.with_column(Series::new(columns::MONTH.into(), months))?;

        let genre_counts: Vec<u32> = string_values(&df, columns::GENRE)?
            .iter()
            .map(|g| genre_count(g.as_deref().unwrap_or(""), &self.genre_separator))
            .collect();
        df.with_column(Series::new(columns::GENRE_COUNT.into(), genre_counts))?;

        let popularity = f64_values(&df, columns::POPULARITY)?;
        let normalized = min_max_normalize(&popularity);
        df.with_column(Series::new(columns::POPULARITY_NORM.into(), normalized))?;

        debug!("Derived columns: Year, Month, Genre_Count, Popularity_Norm");
        Ok(df)
    }
}

/// Number of tokens in a genre string.
///
/// Empty input still yields one (empty) token.
pub fn genre_count(genre: &str, separator: &str) -> u32 {
    genre.split(separator).count() as u32
}

/// Rescale values linearly to `[0, 1]`.
///
/// Nulls and non-finite values map to null. When every remaining value is
/// equal the result is `0.0`.
pub fn min_max_normalize(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let finite = values.iter().flatten().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let spread = max - min;

    values
        .iter()
        .map(|v| {
            v.filter(|v| v.is_finite()).map(|v| {
                if spread > 0.0 && spread.is_finite() {
                    (v - min) / spread
                } else {
                    0.0
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::date_to_days;
    use chrono::NaiveDate;

    fn cleaned_frame(genres: &[Option<&str>], popularity: &[Option<f64>]) -> DataFrame {
        let day = date_to_days(NaiveDate::from_ymd_opt(2021, 12, 15).unwrap());
        let dates = Series::new(
            columns::RELEASE_DATE.into(),
            vec![Some(day); genres.len()],
        )
        .cast(&DataType::Date)
        .unwrap();
        DataFrame::new(vec![
            dates.into(),
            Series::new(columns::GENRE.into(), genres).into(),
            Series::new(columns::POPULARITY.into(), popularity).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_genre_count() {
        assert_eq!(genre_count("Action,Comedy", ","), 2);
        assert_eq!(genre_count("Action, Adventure, Science Fiction", ","), 3);
        assert_eq!(genre_count("Drama", ","), 1);
        assert_eq!(genre_count("", ","), 1);
        assert_eq!(genre_count("Drama|Comedy", "|"), 2);
    }

    #[test]
    fn test_min_max_normalize() {
        let normalized = min_max_normalize(&[Some(10.0), Some(20.0), None, Some(15.0)]);
        assert_eq!(normalized, vec![Some(0.0), Some(1.0), None, Some(0.5)]);
    }

    #[test]
    fn test_min_max_normalize_zero_spread() {
        let normalized = min_max_normalize(&[Some(3.0), Some(3.0)]);
        assert_eq!(normalized, vec![Some(0.0), Some(0.0)]);
        assert!(min_max_normalize(&[]).is_empty());
        assert_eq!(min_max_normalize(&[None]), vec![None]);
    }

    #[test]
    fn test_min_max_normalize_skips_non_finite() {
        let normalized = min_max_normalize(&[Some(1.0), Some(f64::NAN), Some(3.0), Some(2.0)]);
        assert_eq!(normalized, vec![Some(0.0), None, Some(1.0), Some(0.5)]);

        let normalized = min_max_normalize(&[Some(f64::INFINITY), Some(4.0), Some(8.0)]);
        assert_eq!(normalized, vec![None, Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_derive_adds_columns() {
        let df = cleaned_frame(
            &[Some("Action,Comedy"), Some("Drama"), None],
            &[Some(1.0), Some(5.0), Some(3.0)],
        );
        let df = FeatureDeriver::default().derive(df).unwrap();

        let years: Vec<i32> = df.column("Year").unwrap().i32().unwrap().into_no_null_iter().collect();
        assert_eq!(years, vec![2021, 2021, 2021]);
        let months: Vec<i32> = df.column("Month").unwrap().i32().unwrap().into_no_null_iter().collect();
        assert_eq!(months, vec![12, 12, 12]);

        let counts: Vec<u32> = df
            .column("Genre_Count")
            .unwrap()
            .u32()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(counts, vec![2, 1, 1]);

        let norm: Vec<f64> = df
            .column("Popularity_Norm")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(norm, vec![0.0, 1.0, 0.5]);
        assert!(norm.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_derive_is_repeatable() {
        let df = cleaned_frame(&[Some("Drama")], &[Some(2.0)]);
        let deriver = FeatureDeriver::default();
        let once = deriver.derive(df).unwrap();
        let twice = deriver.derive(once.clone()).unwrap();

        assert_eq!(once.width(), twice.width());
        assert!(once.equals_missing(&twice));
    }
}
