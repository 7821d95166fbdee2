//! Dataset profiling for the analysis report.
//!
//! This module provides:
//! - Descriptive statistics for the numeric columns
//! - The most-voted records
//! - Genre explosion and per-genre aggregates
//! - Release counts per year and month
//! - The Pearson correlation matrix behind the heatmap

pub mod statistics;

use crate::error::Result;
use crate::types::{ColumnStatistics, CorrelationMatrix, GenreAggregate, MovieRecord, columns};
use crate::utils::{date_values, f64_values, i64_values, non_null_f64, string_values};
use chrono::Datelike;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub use statistics::{describe_values, pearson, quantile};

/// Computes summaries over a cleaned, feature-enriched movie table.
#[derive(Debug, Clone)]
pub struct DataProfiler {
    genre_separator: String,
}

impl Default for DataProfiler {
    fn default() -> Self {
        Self::new(",")
    }
}

impl DataProfiler {
    pub fn new(genre_separator: impl Into<String>) -> Self {
        Self {
            genre_separator: genre_separator.into(),
        }
    }

    /// Descriptive statistics for every numeric column that is present.
    pub fn describe(&self, df: &DataFrame) -> Result<Vec<ColumnStatistics>> {
        let mut stats = Vec::new();
        for name in columns::NUMERIC {
            if df.column(name).is_err() {
                continue;
            }
            let values = non_null_f64(df, name)?;
            stats.push(describe_values(name, &values));
        }
        debug!("Described {} numeric columns", stats.len());
        Ok(stats)
    }

    /// Every record tied at the maximum vote count, in table order.
    pub fn most_voted(&self, df: &DataFrame) -> Result<Vec<MovieRecord>> {
        let votes = i64_values(df, columns::VOTE_COUNT)?;
        let Some(max) = votes.iter().flatten().max().copied() else {
            return Ok(Vec::new());
        };

        let indices: Vec<usize> = votes
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == Some(max))
            .map(|(i, _)| i)
            .collect();

        let rows = RecordColumns::collect(df)?;
        Ok(indices.into_iter().map(|i| rows.record(i)).collect())
    }

    /// One row per (movie, genre) pair.
    ///
    /// Genre tokens are trimmed; empty tokens are discarded, so a movie with
    /// no genre does not appear at all.
    pub fn explode_genres(&self, df: &DataFrame) -> Result<DataFrame> {
        let genres = string_values(df, columns::GENRE)?;
        let mut indices: Vec<IdxSize> = Vec::new();
        let mut tokens: Vec<String> = Vec::new();

        for (row, genre) in genres.iter().enumerate() {
            let Some(genre) = genre else { continue };
            for token in split_genres(genre, &self.genre_separator) {
                indices.push(row as IdxSize);
                tokens.push(token.to_string());
            }
        }

        let idx = IdxCa::from_vec("idx".into(), indices);
        let mut exploded = df.take(&idx)?;
        exploded.replace(columns::GENRE, Series::new(columns::GENRE.into(), tokens))?;

        debug!(
            "Exploded {} movies into {} genre rows",
            df.height(),
            exploded.height()
        );
        Ok(exploded)
    }

    /// Movie count and mean vote per genre, most frequent first.
    ///
    /// Ties in count are ordered by genre name.
    pub fn genre_aggregates(&self, df: &DataFrame) -> Result<Vec<GenreAggregate>> {
        let exploded = self.explode_genres(df)?;
        let genres = string_values(&exploded, columns::GENRE)?;
        let votes = f64_values(&exploded, columns::VOTE_AVERAGE)?;

        // genre -> (movies, vote sum, votes present)
        let mut totals: HashMap<String, (usize, f64, usize)> = HashMap::new();
        for (genre, vote) in genres.into_iter().zip(votes) {
            let Some(genre) = genre else { continue };
            let entry = totals.entry(genre).or_insert((0, 0.0, 0));
            entry.0 += 1;
            if let Some(vote) = vote {
                entry.1 += vote;
                entry.2 += 1;
            }
        }

        let mut aggregates: Vec<GenreAggregate> = totals
            .into_iter()
            .map(|(genre, (movie_count, sum, n))| GenreAggregate {
                genre,
                movie_count,
                mean_vote: (n > 0).then(|| sum / n as f64),
            })
            .collect();
        aggregates.sort_by(|a, b| {
            b.movie_count
                .cmp(&a.movie_count)
                .then_with(|| a.genre.cmp(&b.genre))
        });

        Ok(aggregates)
    }

    /// Number of releases per calendar year, ascending.
    pub fn releases_per_year(&self, df: &DataFrame) -> Result<BTreeMap<i32, usize>> {
        self.count_dates_by(df, |d| d.year())
    }

    /// Number of releases per calendar month (1-12).
    pub fn releases_per_month(&self, df: &DataFrame) -> Result<BTreeMap<i32, usize>> {
        self.count_dates_by(df, |d| d.month() as i32)
    }

    /// Number of movies per distinct `Genre_Count` value.
    pub fn genre_count_distribution(&self, df: &DataFrame) -> Result<BTreeMap<i64, usize>> {
        let mut counts = BTreeMap::new();
        for count in i64_values(df, columns::GENRE_COUNT)?.into_iter().flatten() {
            *counts.entry(count).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Pairwise Pearson correlation among the correlated columns present.
    ///
    /// Each pair uses the rows where both values are present. Zero-variance
    /// pairs are 0; the diagonal is always 1.
    pub fn correlation_matrix(&self, df: &DataFrame) -> Result<CorrelationMatrix> {
        let present: Vec<&str> = columns::CORRELATED
            .iter()
            .copied()
            .filter(|name| df.column(name).is_ok())
            .collect();

        let data: Vec<Vec<Option<f64>>> = present
            .iter()
            .map(|name| f64_values(df, name))
            .collect::<Result<_>>()?;

        let n = present.len();
        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let (x, y): (Vec<f64>, Vec<f64>) = data[i]
                    .iter()
                    .zip(&data[j])
                    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                    .unzip();
                let r = pearson(&x, &y);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix {
            columns: present.iter().map(|s| s.to_string()).collect(),
            values,
        })
    }

    fn count_dates_by(
        &self,
        df: &DataFrame,
        key: impl Fn(chrono::NaiveDate) -> i32,
    ) -> Result<BTreeMap<i32, usize>> {
        let mut counts = BTreeMap::new();
        for date in date_values(df, columns::RELEASE_DATE)?.into_iter().flatten() {
            *counts.entry(key(date)).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// Trimmed, non-empty genre tokens.
pub fn split_genres<'a>(genre: &'a str, separator: &'a str) -> impl Iterator<Item = &'a str> {
    genre
        .split(separator)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Column vectors needed to materialize [`MovieRecord`]s.
struct RecordColumns {
    title: Vec<Option<String>>,
    genre: Vec<Option<String>>,
    overview: Vec<Option<String>>,
    poster_url: Vec<Option<String>>,
    release_date: Vec<Option<chrono::NaiveDate>>,
    popularity: Vec<Option<f64>>,
    vote_count: Vec<Option<i64>>,
    vote_average: Vec<Option<f64>>,
    year: Option<Vec<Option<i64>>>,
    month: Option<Vec<Option<i64>>>,
    genre_count: Option<Vec<Option<i64>>>,
    popularity_norm: Option<Vec<Option<f64>>>,
}

impl RecordColumns {
    fn collect(df: &DataFrame) -> Result<Self> {
        let optional_int = |name: &str| -> Result<Option<Vec<Option<i64>>>> {
            match df.column(name) {
                Ok(_) => Ok(Some(i64_values(df, name)?)),
                Err(_) => Ok(None),
            }
        };

        Ok(Self {
            title: string_values(df, columns::TITLE)?,
            genre: string_values(df, columns::GENRE)?,
            overview: string_values(df, columns::OVERVIEW)?,
            poster_url: string_values(df, columns::POSTER_URL)?,
            release_date: date_values(df, columns::RELEASE_DATE)?,
            popularity: f64_values(df, columns::POPULARITY)?,
            vote_count: i64_values(df, columns::VOTE_COUNT)?,
            vote_average: f64_values(df, columns::VOTE_AVERAGE)?,
            year: optional_int(columns::YEAR)?,
            month: optional_int(columns::MONTH)?,
            genre_count: optional_int(columns::GENRE_COUNT)?,
            popularity_norm: match df.column(columns::POPULARITY_NORM) {
                Ok(_) => Some(f64_values(df, columns::POPULARITY_NORM)?),
                Err(_) => None,
            },
        })
    }

    fn record(&self, i: usize) -> MovieRecord {
        let text = |values: &[Option<String>]| values[i].clone().unwrap_or_default();
        MovieRecord {
            title: text(&self.title),
            genre: text(&self.genre),
            release_date: self.release_date[i],
            overview: text(&self.overview),
            poster_url: text(&self.poster_url),
            popularity: self.popularity[i],
            vote_count: self.vote_count[i].unwrap_or_default(),
            vote_average: self.vote_average[i],
            year: self.year.as_ref().and_then(|v| v[i]).map(|y| y as i32),
            month: self.month.as_ref().and_then(|v| v[i]).map(|m| m as i32),
            genre_count: self.genre_count.as_ref().and_then(|v| v[i]).map(|c| c as u32),
            popularity_norm: self.popularity_norm.as_ref().and_then(|v| v[i]),
        }
    }
}
