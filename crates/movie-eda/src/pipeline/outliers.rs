//! Outlier filtering module.
//!
//! Builds an IQR-bounded view of the table for visualization. The input table
//! is never modified and the persisted output keeps every record.

use crate::error::Result;
use crate::profiler::statistics::quantile_sorted;
use crate::types::{OutlierBounds, OutlierSummary, columns};
use crate::utils::f64_values;
use polars::prelude::*;
use tracing::{debug, warn};

/// A filtered copy of the table with the bounds that produced it.
#[derive(Debug, Clone)]
pub struct OutlierView {
    /// Records inside the bounds, plus records with a null or non-finite value.
    pub data: DataFrame,
    /// `None` when the column had no values to bound.
    pub bounds: Option<OutlierBounds>,
    /// Number of records excluded from the view.
    pub removed: usize,
}

impl OutlierView {
    pub fn summary(&self, column: &str) -> OutlierSummary {
        OutlierSummary {
            column: column.to_string(),
            bounds: self.bounds,
            rows_kept: self.data.height(),
            rows_removed: self.removed,
        }
    }
}

/// IQR-based outlier filter over one numeric column.
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    column: String,
    multiplier: f64,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self::new(columns::POPULARITY, 1.5)
    }
}

impl OutlierFilter {
    pub fn new(column: impl Into<String>, multiplier: f64) -> Self {
        Self {
            column: column.into(),
            multiplier,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Compute `[Q1 - k*IQR, Q3 + k*IQR]` from the finite values.
    pub fn bounds(&self, values: &[f64]) -> Option<OutlierBounds> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile_sorted(&sorted, 0.25)?;
        let q3 = quantile_sorted(&sorted, 0.75)?;
        let iqr = q3 - q1;

        Some(OutlierBounds {
            q1,
            q3,
            iqr,
            lower: q1 - self.multiplier * iqr,
            upper: q3 + self.multiplier * iqr,
        })
    }

    /// Build the view; an empty table yields an empty view with no bounds.
    pub fn filter(&self, df: &DataFrame) -> Result<OutlierView> {
        let values = f64_values(df, &self.column)?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();

        let Some(bounds) = self.bounds(&present) else {
            debug!("No values in '{}', outlier filter is a no-op", self.column);
            return Ok(OutlierView {
                data: df.clone(),
                bounds: None,
                removed: 0,
            });
        };

        let keep: Vec<bool> = values
            .iter()
            .map(|v| v.is_none_or(|v| !v.is_finite() || bounds.contains(v)))
            .collect();
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let data = df.filter(&mask)?;
        let removed = df.height() - data.height();

        if removed > 0 {
            warn!(
                "Excluded {} outliers in '{}' outside [{:.3}, {:.3}] from the view",
                removed, self.column, bounds.lower, bounds.upper
            );
        }

        Ok(OutlierView {
            data,
            bounds: Some(bounds),
            removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn popularity_frame(values: &[Option<f64>]) -> DataFrame {
        DataFrame::new(vec![
            Series::new(columns::POPULARITY.into(), values).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_filter_excludes_extreme_value() {
        let mut values: Vec<Option<f64>> = (1..=9).map(|v| Some(v as f64)).collect();
        values.push(Some(1000.0));
        let df = popularity_frame(&values);

        let view = OutlierFilter::default().filter(&df).unwrap();

        assert_eq!(view.removed, 1);
        assert_eq!(view.data.height(), 9);
        assert_eq!(df.height(), 10);
        let max = view.data.column("Popularity").unwrap().f64().unwrap().max();
        assert_eq!(max, Some(9.0));
    }

    #[test]
    fn test_bounds_use_linear_quartiles() {
        let bounds = OutlierFilter::default()
            .bounds(&[1.0, 2.0, 3.0, 4.0])
            .unwrap();
        assert_eq!(bounds.q1, 1.75);
        assert_eq!(bounds.q3, 3.25);
        assert_eq!(bounds.iqr, 1.5);
        assert_eq!(bounds.lower, 1.75 - 2.25);
        assert_eq!(bounds.upper, 3.25 + 2.25);
    }

    #[test]
    fn test_filter_keeps_nulls() {
        let df = popularity_frame(&[Some(1.0), None, Some(2.0), Some(3.0)]);
        let view = OutlierFilter::default().filter(&df).unwrap();

        assert_eq!(view.removed, 0);
        assert_eq!(view.data.height(), 4);
    }

    #[test]
    fn test_filter_ignores_nan() {
        let df = popularity_frame(&[Some(1.0), Some(f64::NAN), Some(3.0), Some(2.0)]);
        let view = OutlierFilter::default().filter(&df).unwrap();

        let bounds = view.bounds.unwrap();
        assert!(bounds.lower.is_finite() && bounds.upper.is_finite());
        assert_eq!(bounds.q1, 1.5);
        assert_eq!(bounds.q3, 2.5);
        assert_eq!(view.removed, 0);
        assert_eq!(view.data.height(), 4);
    }

    #[test]
    fn test_bounds_skip_infinite_values() {
        let filter = OutlierFilter::default();
        assert_eq!(
            filter.bounds(&[1.0, 2.0, 3.0, 4.0, f64::INFINITY]),
            filter.bounds(&[1.0, 2.0, 3.0, 4.0])
        );
        assert!(filter.bounds(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_filter_empty_table() {
        let df = popularity_frame(&[]);
        let view = OutlierFilter::default().filter(&df).unwrap();

        assert!(view.bounds.is_none());
        assert_eq!(view.removed, 0);
        assert_eq!(view.data.height(), 0);
    }

    #[test]
    fn test_filter_constant_values_keeps_all() {
        let df = popularity_frame(&[Some(5.0); 6]);
        let view = OutlierFilter::new("Popularity", 3.0).filter(&df).unwrap();
        assert_eq!(view.removed, 0);

        let summary = view.summary("Popularity");
        assert_eq!(summary.rows_kept, 6);
        assert_eq!(summary.bounds.map(|b| b.iqr), Some(0.0));
    }
}
