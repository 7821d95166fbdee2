//! Shared utilities for the movie analysis pipeline.
//!
//! Typed accessors over `DataFrame` columns and date conversions used by the
//! cleaner, the feature deriver and the reporter.

use crate::error::{AnalysisError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Days between 0001-01-01 and the Unix epoch, the origin of polars `Date`.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Date Utilities
// =============================================================================

/// Convert a polars `Date` physical value into a calendar date.
pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// Convert a calendar date into a polars `Date` physical value.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

// =============================================================================
// Column Access
// =============================================================================

/// Owned names of all columns, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Borrow a column as a series, mapping absence to [`AnalysisError::ColumnNotFound`].
pub fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| AnalysisError::ColumnNotFound(name.to_string()))
}

/// Values of a column as text, whatever its dtype.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let casted = series(df, name)?.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Values of a numeric column as `f64`.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let casted = series(df, name)?.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Non-null values of a numeric column as `f64`.
pub fn non_null_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(f64_values(df, name)?.into_iter().flatten().collect())
}

/// Values of an integer column as `i64`.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let casted = series(df, name)?.cast(&DataType::Int64)?;
    Ok(casted.i64()?.into_iter().collect())
}

/// Values of a `Date` column as calendar dates.
pub fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    let col = series(df, name)?;
    if col.dtype() != &DataType::Date {
        return Err(AnalysisError::TypeConversionFailed {
            column: name.to_string(),
            target_type: "Date".to_string(),
            reason: format!("column has dtype {}", col.dtype()),
        });
    }
    let physical = col.cast(&DataType::Int32)?;
    Ok(physical
        .i32()?
        .into_iter()
        .map(|v| v.and_then(days_to_date))
        .collect())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a string Series with a specific value.
///
/// Returns the filled series and the number of values replaced.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<(Series, usize)> {
    let casted = series.cast(&DataType::String)?;
    let str_series = casted.str()?;
    let mut filled = 0;
    let values: Vec<String> = str_series
        .into_iter()
        .map(|opt_val| match opt_val {
            Some(val) => val.to_string(),
            None => {
                filled += 1;
                fill_value.to_string()
            }
        })
        .collect();

    Ok((Series::new(series.name().clone(), values), filled))
}

// =============================================================================
// Tests
// =============================================================================
