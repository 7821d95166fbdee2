//! Row-level sanitization: placeholders, undated rows and duplicates.

use crate::utils::fill_string_nulls;
use polars::prelude::*;
use tracing::debug;

/// Replace nulls in the given text columns with `placeholder`.
///
/// Returns how many values were filled per column. Columns that are absent
/// are skipped.
pub(crate) fn fill_placeholders(
    df: &mut DataFrame,
    columns: &[&str],
    placeholder: &str,
) -> PolarsResult<Vec<(String, usize)>> {
    let mut filled_counts = Vec::with_capacity(columns.len());

    for col_name in columns {
        let Ok(col) = df.column(col_name) else {
            continue;
        };
        let (filled, count) = fill_string_nulls(col.as_materialized_series(), placeholder)?;
        df.replace(col_name, filled)?;
        debug!("Filled {} missing values in '{}'", count, col_name);
        filled_counts.push((col_name.to_string(), count));
    }

    Ok(filled_counts)
}

/// Drop every row whose value in `column` is null.
pub(crate) fn drop_nulls_in(df: DataFrame, column: &str) -> PolarsResult<(DataFrame, usize)> {
    let before = df.height();
    let mask = df.column(column)?.as_materialized_series().is_not_null();
    let df = df.filter(&mask)?;
    let removed = before - df.height();
    Ok((df, removed))
}

/// Remove exact full-row duplicates, keeping the first occurrence in order.
pub(crate) fn remove_duplicates(df: DataFrame) -> PolarsResult<(DataFrame, usize)> {
    let before = df.height();
    let df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let removed = before - df.height();
    Ok((df, removed))
}
