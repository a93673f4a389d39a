//! Trend CLI - Command-line interface for Outcome Trend
//!
//! Commands:
//! - series: Build the rolling outcome series from a complaints payload
//! - filter: Print the records matching a set of field=value expressions
//! - participants: Rank participants by number of records
//! - validate: Report records the pipeline can only place approximately

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use outcome_trend::config::{DateBounds, PipelineConfig};
use outcome_trend::matcher::MatchSpec;
use outcome_trend::participants::ParticipantIndex;
use outcome_trend::types::{Record, TrendSeries};
use outcome_trend::{ComplaintsAdapter, TrendError, TrendPipeline, TREND_VERSION};

/// Trend - rolling outcome series from sparse complaint logs
#[derive(Parser)]
#[command(name = "trend")]
#[command(version = TREND_VERSION)]
#[command(about = "Turn complaint logs into contiguous rolling outcome series", long_about = None)]
struct Cli {
    /// Log pipeline stages to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the rolling outcome series
    Series {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,

        /// Pipeline configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rolling window in days (overrides config)
        #[arg(short, long)]
        window: Option<usize>,

        /// Drop records dated on or before this day (YYYY-MM-DD)
        #[arg(long)]
        after: Option<String>,

        /// Drop records dated on or after this day (YYYY-MM-DD)
        #[arg(long)]
        before: Option<String>,

        /// Keep every dated record (no 2008..2050 clipping when no bounds are given)
        #[arg(long, conflicts_with_all = ["after", "before"])]
        unbounded: bool,

        /// Keep only records matching field=value (repeatable, comma for sets)
        #[arg(short = 'm', long = "match")]
        matches: Vec<String>,
    },

    /// Print records matching field=value expressions
    Filter {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        format: OutputFormat,

        /// Match expression field=value (repeatable, comma for sets)
        #[arg(short = 'm', long = "match", required = true)]
        matches: Vec<String>,
    },

    /// Rank participants by number of records
    Participants {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Members payload; defaults to the distinct tags found in the input
        #[arg(long)]
        members: Option<PathBuf>,

        /// Pipeline configuration file (JSON) for field names
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report records with missing or unparseable fields
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Pipeline configuration file (JSON) for field names
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Complaints payload: keyed object, wrapped list or bare array
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one item per line)
    Ndjson,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), TrendCliError> {
    match cli.command {
        Commands::Series {
            input,
            input_format,
            format,
            config,
            window,
            after,
            before,
            unbounded,
            matches,
        } => {
            let mut pipeline_config = load_config(config.as_deref())?;
            if let Some(window) = window {
                pipeline_config = pipeline_config.with_window_length(window);
            }
            pipeline_config.date_bounds =
                series_bounds(pipeline_config.date_bounds, after, before, unbounded)?;
            cmd_series(&input, input_format, format, pipeline_config, &matches)
        }

        Commands::Filter {
            input,
            input_format,
            format,
            matches,
        } => cmd_filter(&input, input_format, format, &matches),

        Commands::Participants {
            input,
            input_format,
            members,
            config,
            json,
        } => cmd_participants(&input, input_format, members.as_deref(), config.as_deref(), json),

        Commands::Validate {
            input,
            input_format,
            config,
            json,
        } => cmd_validate(&input, input_format, config.as_deref(), json),
    }
}

fn cmd_series(
    input: &Path,
    input_format: InputFormat,
    format: OutputFormat,
    config: PipelineConfig,
    matches: &[String],
) -> Result<(), TrendCliError> {
    let records = read_records(input, &input_format)?;
    if records.is_empty() {
        return Err(TrendCliError::NoRecords);
    }

    let pipeline = TrendPipeline::new(config)?.with_filter(parse_matches(matches)?);
    let series = pipeline.run(records)?;

    print!("{}", format_series(&series, &format)?);
    Ok(())
}

fn cmd_filter(
    input: &Path,
    input_format: InputFormat,
    format: OutputFormat,
    matches: &[String],
) -> Result<(), TrendCliError> {
    let records = read_records(input, &input_format)?;
    let spec = parse_matches(matches)?;
    let kept = outcome_trend::filter(&records, &spec);

    print!("{}", format_records(&kept, &format)?);
    Ok(())
}

fn cmd_participants(
    input: &Path,
    input_format: InputFormat,
    members: Option<&Path>,
    config: Option<&Path>,
    json: bool,
) -> Result<(), TrendCliError> {
    let records = read_records(input, &input_format)?;
    let config = load_config(config)?;
    let tags_field = &config.fields.tags;

    let index = match members {
        Some(path) => {
            let members = ComplaintsAdapter::parse_members(&fs::read_to_string(path)?)?;
            ParticipantIndex::build(&records, &members, tags_field)
        }
        None => ParticipantIndex::from_records(&records, tags_field),
    };

    let counts = index.counts();
    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        println!("Participants (ascending by records)");
        println!("====================================");
        for entry in &counts {
            println!("  {:>5}  {}", entry.count, entry.name);
        }
    }
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    config: Option<&Path>,
    json: bool,
) -> Result<(), TrendCliError> {
    let records = read_records(input, &input_format)?;
    let config = load_config(config)?;
    let results = ComplaintsAdapter::validate_records(&records, &config.fields);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                record_id: r.record_id.clone(),
                errors: r.errors.iter().map(|e| e.to_string()).collect(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Record {} (index {}): {}",
                    err.record_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.errors.join("; ")
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(TrendCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, TrendCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_records(input: &Path, format: &InputFormat) -> Result<Vec<Record>, TrendCliError> {
    let data = read_input(input)?;
    let records = match format {
        InputFormat::Json => ComplaintsAdapter::parse_payload(&data)?,
        InputFormat::Ndjson => ComplaintsAdapter::parse_ndjson(&data)?,
    };
    Ok(records)
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, TrendCliError> {
    match path {
        Some(path) => Ok(PipelineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(PipelineConfig::default()),
    }
}

/// Flags win over the config file; with neither, clip to the plausible window
fn series_bounds(
    configured: Option<DateBounds>,
    after: Option<String>,
    before: Option<String>,
    unbounded: bool,
) -> Result<Option<DateBounds>, TrendError> {
    if unbounded {
        return Ok(None);
    }
    if after.is_some() || before.is_some() {
        return DateBounds::parse(after.as_deref(), before.as_deref()).map(Some);
    }
    Ok(Some(configured.unwrap_or_else(DateBounds::plausible)))
}

fn parse_matches(matches: &[String]) -> Result<MatchSpec, TrendCliError> {
    let mut spec = MatchSpec::new();
    for expression in matches {
        spec = spec.with_assignment(expression)?;
    }
    Ok(spec)
}

fn format_series(series: &TrendSeries, format: &OutputFormat) -> Result<String, TrendCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for point in &series.points {
                lines.push(serde_json::to_string(point)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(series)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(series)? + "\n"),
    }
}

fn format_records(records: &[Record], format: &OutputFormat) -> Result<String, TrendCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)? + "\n"),
    }
}

// Error types

#[derive(Debug)]
enum TrendCliError {
    Io(io::Error),
    Pipeline(TrendError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
}

impl From<io::Error> for TrendCliError {
    fn from(e: io::Error) -> Self {
        TrendCliError::Io(e)
    }
}

impl From<TrendError> for TrendCliError {
    fn from(e: TrendError) -> Self {
        TrendCliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for TrendCliError {
    fn from(e: serde_json::Error) -> Self {
        TrendCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TrendCliError> for CliError {
    fn from(e: TrendCliError) -> Self {
        match e {
            TrendCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TrendCliError::Pipeline(e) => {
                let (code, hint) = match &e {
                    TrendError::InvalidParameter(_) => (
                        "INVALID_PARAMETER",
                        "Check --window (>= 1), --match field=value and sort_keys in the config",
                    ),
                    TrendError::InvalidPattern(_) => {
                        ("INVALID_PATTERN", "Check sort_keys patterns in the config file")
                    }
                    TrendError::DateParseError(_) => ("DATE_ERROR", "Dates must be YYYY-MM-DD"),
                    _ => ("PARSE_ERROR", "Ensure input is a complaints payload"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            TrendCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TrendCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            TrendCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Records with bad dates attach to the first day bucket".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    record_id: Option<String>,
    errors: Vec<String>,
}
