//! CSV loading for the movie dataset.
//!
//! Every column is read as text; typing is left to the cleaner so that
//! coercion failures surface as [`AnalysisError::TypeConversionFailed`]
//! instead of silent schema inference.

use crate::error::{AnalysisError, Result, ResultExt};
use crate::types::columns;
use crate::utils::column_names;
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Field values read as missing, on top of empty fields.
pub const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Reads delimited movie files into a [`DataFrame`].
#[derive(Debug, Clone)]
pub struct MovieLoader {
    line_terminator: u8,
}

impl Default for MovieLoader {
    fn default() -> Self {
        Self {
            line_terminator: b'\n',
        }
    }
}

impl MovieLoader {
    /// Create a loader that only ends records on `line_terminator`.
    ///
    /// Quoted fields may contain any other byte, including `\r` and, inside
    /// quotes, the terminator itself.
    pub fn new(line_terminator: u8) -> Self {
        Self { line_terminator }
    }

    /// Load the file at `path` and validate its header.
    pub fn load(&self, path: &Path) -> Result<DataFrame> {
        if !path.exists() {
            return Err(AnalysisError::FileNotFound(path.to_path_buf()));
        }

        info!("Loading dataset from: {}", path.display());
        let df = self
            .read_options()
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
            .context(format!("Failed to parse {}", path.display()))?;

        self.validate(df)
    }

    /// Load CSV content that is already in memory.
    pub fn load_from_str(&self, content: &str) -> Result<DataFrame> {
        let cursor = Cursor::new(content.to_string());
        let df = self
            .read_options()
            .into_reader_with_file_handle(cursor)
            .finish()
            .context("Failed to parse CSV content")?;

        self.validate(df)
    }

    fn read_options(&self) -> CsvReadOptions {
        CsvReadOptions::default()
            .with_has_header(true)
            // zero inference rows reads every column as String
            .with_infer_schema_length(Some(0))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(b',')
                    .with_quote_char(Some(b'"'))
                    .with_eol_char(self.line_terminator)
                    .with_missing_is_null(true)
                    .with_null_values(Some(NullValues::AllColumns(
                        NA_TOKENS.iter().map(|t| (*t).into()).collect(),
                    ))),
            )
    }

    fn validate(&self, df: DataFrame) -> Result<DataFrame> {
        let present = column_names(&df);

        let missing: Vec<String> = columns::REQUIRED
            .iter()
            .filter(|name| !present.iter().any(|p| p == *name))
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(AnalysisError::MissingColumns(missing));
        }

        info!("Dataset loaded successfully: {:?}", df.shape());
        for col in df.get_columns() {
            debug!("  {}: {} missing", col.name(), col.null_count());
        }

        Ok(df)
    }
}
