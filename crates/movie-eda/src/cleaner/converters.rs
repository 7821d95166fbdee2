//! Type conversion functions for data cleaning.

use crate::error::{AnalysisError, Result};
use crate::utils::{date_to_days, is_numeric_dtype};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Date-only layouts tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

/// Date-time layouts whose date part is kept.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a single release date, returning `None` for anything unrecognised.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(datetime.date());
        }
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Convert a text column into a polars `Date` column.
///
/// Unparsable values become null. Returns the converted series and the number
/// of values that were present but could not be parsed.
pub(crate) fn string_to_date(series: &Series) -> PolarsResult<(Series, usize)> {
    if series.dtype() == &DataType::Date {
        return Ok((series.clone(), 0));
    }

    let casted = series.cast(&DataType::String)?;
    let str_series = casted.str()?;
    let mut unparsable = 0;

    let days: Vec<Option<i32>> = str_series
        .into_iter()
        .map(|opt_val| {
            let val = opt_val?;
            let parsed = parse_date(val);
            if parsed.is_none() && !val.trim().is_empty() {
                unparsable += 1;
            }
            parsed.map(date_to_days)
        })
        .collect();

    let dates = Series::new(series.name().clone(), days).cast(&DataType::Date)?;
    Ok((dates, unparsable))
}

fn conversion_error(column: &str, target: &str, reason: String) -> AnalysisError {
    AnalysisError::TypeConversionFailed {
        column: column.to_string(),
        target_type: target.to_string(),
        reason,
    }
}

fn parse_integer(value: &str) -> Option<i64> {
    if let Ok(int_val) = value.parse::<i64>() {
        return Some(int_val);
    }
    // "8940.0" style exports truncate toward zero
    value
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
        .map(|f| f.trunc() as i64)
}

/// Strictly coerce a column to `Int64`.
///
/// Nulls and unparsable values are both errors.
pub(crate) fn coerce_to_int64(series: &Series) -> Result<Series> {
    let column = series.name().to_string();

    if is_numeric_dtype(series.dtype()) {
        if series.null_count() > 0 {
            return Err(conversion_error(
                &column,
                "Int64",
                format!("{} missing values", series.null_count()),
            ));
        }
        let casted = series.cast(&DataType::Float64)?;
        let values: Vec<i64> = casted
            .f64()?
            .into_no_null_iter()
            .map(|f| f.trunc() as i64)
            .collect();
        return Ok(Series::new(series.name().clone(), values));
    }

    let casted = series.cast(&DataType::String)?;
    let str_series = casted.str()?;
    let mut values = Vec::with_capacity(str_series.len());

    for (row, opt_val) in str_series.into_iter().enumerate() {
        let val = opt_val
            .ok_or_else(|| conversion_error(&column, "Int64", format!("missing value at row {row}")))?;
        let parsed = parse_integer(val.trim()).ok_or_else(|| {
            conversion_error(&column, "Int64", format!("row {row}: {val:?} is not a number"))
        })?;
        values.push(parsed);
    }

    Ok(Series::new(series.name().clone(), values))
}

/// NaN counts as missing; infinities are rejected.
fn finite_or_missing(column: &str, row: usize, value: f64) -> Result<Option<f64>> {
    if value.is_nan() {
        Ok(None)
    } else if value.is_infinite() {
        Err(conversion_error(
            column,
            "Float64",
            format!("row {row}: {value} is not a finite number"),
        ))
    } else {
        Ok(Some(value))
    }
}

/// Strictly coerce a column to `Float64`, keeping nulls as nulls.
pub(crate) fn coerce_to_float64(series: &Series) -> Result<Series> {
    let column = series.name().to_string();
    let mut values: Vec<Option<f64>> = Vec::with_capacity(series.len());

    if is_numeric_dtype(series.dtype()) {
        let casted = series.cast(&DataType::Float64)?;
        for (row, opt_val) in casted.f64()?.into_iter().enumerate() {
            values.push(match opt_val {
                Some(v) => finite_or_missing(&column, row, v)?,
                None => None,
            });
        }
        return Ok(Series::new(series.name().clone(), values));
    }

    let casted = series.cast(&DataType::String)?;
    let str_series = casted.str()?;

    for (row, opt_val) in str_series.into_iter().enumerate() {
        match opt_val {
            None => values.push(None),
            Some(val) if val.trim().is_empty() => values.push(None),
            Some(val) => {
                let parsed = val.trim().parse::<f64>().map_err(|_| {
                    conversion_error(
                        &column,
                        "Float64",
                        format!("row {row}: {val:?} is not a number"),
                    )
                })?;
                values.push(finite_or_missing(&column, row, parsed)?);
            }
        }
    }

    Ok(Series::new(series.name().clone(), values))
}
