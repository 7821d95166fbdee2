//! CLI entry point for the movie dataset analysis.

use anyhow::{Context, Result};
use clap::Parser;
use movie_eda::{AnalysisConfig, AnalysisPipeline, AnalysisResult, DEFAULT_PLACEHOLDER};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory analysis of a movie dataset",
    long_about = "Cleans a movie CSV, derives features, renders charts and writes \
                  the cleaned dataset.\n\n\
                  EXAMPLES:\n  \
                  # Analyse data/mymoviedb.csv into visuals_output/\n  \
                  movie-eda\n\n  \
                  # Custom paths, stricter outlier fence\n  \
                  movie-eda -i movies.csv -o charts/ --cleaned out/movies.csv --iqr-multiplier 3\n\n  \
                  # Machine-readable summary\n  \
                  movie-eda --json | jq .report.cleaning"
)]
struct Args {
    /// Path to the movie CSV file
    #[arg(short, long, default_value = "data/mymoviedb.csv")]
    input: PathBuf,

    /// Directory receiving the chart images and the JSON report
    #[arg(short, long, default_value = "visuals_output")]
    output_dir: PathBuf,

    /// Path of the cleaned CSV
    #[arg(long, default_value = "data/mymoviedb_cleaned.csv")]
    cleaned: PathBuf,

    /// Text written into missing Overview and Poster_Url cells
    #[arg(long, default_value = DEFAULT_PLACEHOLDER)]
    placeholder: String,

    /// Separator between genre names
    #[arg(long, default_value = ",")]
    genre_separator: String,

    /// IQR multiplier for the popularity outlier fence
    #[arg(long, default_value = "1.5")]
    iqr_multiplier: f64,

    /// Do not write eda_report.json
    #[arg(long)]
    no_report: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final summary)
    #[arg(short, long)]
    quiet: bool,

    /// Print the analysis result as JSON instead of the text summary
    ///
    /// Disables all logging so stdout only carries the JSON document.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = AnalysisConfig::builder()
        .input_path(&args.input)
        .output_dir(&args.output_dir)
        .cleaned_csv_path(&args.cleaned)
        .placeholder(&args.placeholder)
        .genre_separator(&args.genre_separator)
        .iqr_multiplier(args.iqr_multiplier)
        .generate_report(!args.no_report)
        .build()
        .context("Invalid arguments")?;

    let result = AnalysisPipeline::builder()
        .config(config)
        .on_progress(|update| {
            debug!("[{:>3.0}%] {}", update.progress * 100.0, update.message);
        })
        .build()?
        .run()
        .with_context(|| format!("Analysis of {} failed", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        write_summary(&mut io::stdout().lock(), &result)?;
    }

    Ok(())
}

/// Print a human-readable summary of the run to `out`.
fn write_summary(out: &mut impl Write, result: &AnalysisResult) -> io::Result<()> {
    let report = &result.report;
    let cleaning = &report.cleaning;

    writeln!(out, "\n{}", "=".repeat(60))?;
    writeln!(out, "MOVIE DATASET ANALYSIS")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "  Input: {}", report.input_file)?;
    writeln!(
        out,
        "  Rows: {} -> {} ({} removed)",
        cleaning.rows_before,
        cleaning.rows_after,
        cleaning.rows_removed()
    )?;
    writeln!(out, "  Rows without a release date: {}", cleaning.missing_dates)?;
    writeln!(out, "  Duplicates removed: {}", cleaning.duplicates_removed)?;

    if let Some(bounds) = &report.outliers.bounds {
        writeln!(
            out,
            "  Popularity fence: [{:.3}, {:.3}], {} outliers hidden from scatter",
            bounds.lower, bounds.upper, report.outliers.rows_removed
        )?;
    }

    writeln!(out, "\nMISSING VALUES ({} total)", cleaning.total_missing())?;
    writeln!(out, "{}", "-".repeat(40))?;
    for (column, count) in &cleaning.missing_values {
        writeln!(out, "  {:<20} {:>8}", column, count)?;
    }

    if !report.statistics.is_empty() {
        writeln!(out, "\nSTATISTICS")?;
        writeln!(out, "{}", "-".repeat(100))?;
        writeln!(
            out,
            "  {:<16} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for stats in &report.statistics {
            writeln!(
                out,
                "  {:<16} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                stats.column,
                stats.count,
                fmt_stat(stats.mean),
                fmt_stat(stats.std),
                fmt_stat(stats.min),
                fmt_stat(stats.q25),
                fmt_stat(stats.median),
                fmt_stat(stats.q75),
                fmt_stat(stats.max),
            )?;
        }
    }

    if !report.most_voted.is_empty() {
        writeln!(out, "\nMOST VOTED")?;
        writeln!(out, "{}", "-".repeat(40))?;
        for movie in &report.most_voted {
            writeln!(out, "  {} ({} votes)", movie.title, movie.vote_count)?;
        }
    }

    if !report.genre_aggregates.is_empty() {
        writeln!(out, "\nTOP GENRES")?;
        writeln!(out, "{}", "-".repeat(40))?;
        for genre in report.genre_aggregates.iter().take(5) {
            match genre.mean_vote {
                Some(mean) => writeln!(
                    out,
                    "  {:<20} {:>6} movies, mean vote {:.2}",
                    genre.genre, genre.movie_count, mean
                )?,
                None => writeln!(out, "  {:<20} {:>6} movies", genre.genre, genre.movie_count)?,
            }
        }
    }

    writeln!(out, "\nOUTPUTS")?;
    writeln!(out, "{}", "-".repeat(40))?;
    writeln!(out, "  Cleaned CSV: {}", result.cleaned_csv.display())?;
    if let Some(path) = &result.report_file {
        writeln!(out, "  Report: {}", path.display())?;
    }
    for chart in &result.charts {
        writeln!(out, "  Chart: {}", chart.display())?;
    }
    writeln!(out, "\nCompleted in {} ms", result.duration_ms)
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}
