//! devimpact CLI - Command-line interface for the impact engine
//!
//! Commands:
//! - score: Compute impact profiles from raw activity stats
//! - smooth: Apply one EMA smoothing step
//! - verify: Print the verification code for a profile on a date
//! - doctor: Diagnose configuration and snapshot files
//! - schema: Print input/output wire shapes

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{NaiveDate, Utc};
use tracing_subscriber::EnvFilter;

use devimpact::pipeline::{parse_stats_array, parse_stats_ndjson};
use devimpact::snapshot::InMemorySnapshotStore;
use devimpact::types::{ImpactResult, RawActivityStats};
use devimpact::{
    apply_ema, compute_impact_at, verification_hash, ComputeError, ImpactProcessor,
    ScoringConfig, ENGINE_NAME, ENGINE_VERSION,
};

/// devimpact - Developer impact profiles from aggregated GitHub activity
#[derive(Parser)]
#[command(name = "devimpact")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score developer impact from aggregated activity", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute impact profiles from raw activity stats
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Scoring configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Snapshot date (YYYY-MM-DD), defaults to today (UTC)
        #[arg(long)]
        date: Option<String>,

        /// Previous smoothed score to blend against
        #[arg(long, conflicts_with_all = ["load_snapshots", "save_snapshots"])]
        previous: Option<f64>,

        /// Load smoothing snapshots from file
        #[arg(long)]
        load_snapshots: Option<PathBuf>,

        /// Save smoothing snapshots to file after processing
        #[arg(long)]
        save_snapshots: Option<PathBuf>,

        /// Secret for verification codes
        #[arg(long, env = "DEVIMPACT_VERIFY_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Apply one EMA smoothing step
    Smooth {
        /// Current adjusted composite
        #[arg(long)]
        current: f64,

        /// Previous smoothed score (omit for the first computation)
        #[arg(long)]
        previous: Option<f64>,
    },

    /// Print the verification code for a profile
    Verify {
        /// Input file path with one raw stats record (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Date the code is issued for (YYYY-MM-DD), defaults to today (UTC)
        #[arg(long)]
        date: Option<String>,

        /// Scoring configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Secret for verification codes
        #[arg(long, env = "DEVIMPACT_VERIFY_SECRET", hide_env_values = true)]
        secret: String,
    },

    /// Diagnose configuration and snapshot files
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a snapshots file
        #[arg(long)]
        snapshots: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// A single JSON object or a JSON array of objects
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one result per line)
    Ndjson,
    /// JSON array of results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Raw activity stats
    Input,
    /// Impact result
    Output,
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
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), ImpactCliError> {
    match cli.command {
        Commands::Score {
            input,
            output,
            input_format,
            output_format,
            config,
            date,
            previous,
            load_snapshots,
            save_snapshots,
            secret,
        } => cmd_score(ScoreArgs {
            input: &input,
            output: &output,
            input_format,
            output_format,
            config: config.as_deref(),
            date: date.as_deref(),
            previous,
            load_snapshots: load_snapshots.as_deref(),
            save_snapshots: save_snapshots.as_deref(),
            secret: secret.as_deref(),
        }),

        Commands::Smooth { current, previous } => {
            println!("{}", apply_ema(current, previous));
            Ok(())
        }

        Commands::Verify {
            input,
            date,
            config,
            secret,
        } => cmd_verify(&input, date.as_deref(), config.as_deref(), &secret),

        Commands::Doctor {
            config,
            snapshots,
            json,
        } => cmd_doctor(config.as_deref(), snapshots.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

struct ScoreArgs<'a> {
    input: &'a Path,
    output: &'a Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&'a Path>,
    date: Option<&'a str>,
    previous: Option<f64>,
    load_snapshots: Option<&'a Path>,
    save_snapshots: Option<&'a Path>,
    secret: Option<&'a str>,
}

/// One scored record as written to the output
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreRecord {
    #[serde(flatten)]
    result: ImpactResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    verification_code: Option<String>,
}

fn cmd_score(args: ScoreArgs<'_>) -> Result<(), ImpactCliError> {
    let config = load_config(args.config)?;
    let date = resolve_date(args.date)?;

    let input_data = read_input(args.input)?;
    let records = match args.input_format {
        InputFormat::Json => parse_json_records(&input_data)?,
        InputFormat::Ndjson => parse_stats_ndjson(&input_data)?,
    };

    if records.is_empty() {
        return Err(ImpactCliError::NoRecords);
    }

    let use_store = args.load_snapshots.is_some() || args.save_snapshots.is_some();
    let mut processor = ImpactProcessor::with_config(config.clone())?;
    if let Some(path) = args.load_snapshots {
        processor.load_snapshots(&fs::read_to_string(path)?)?;
    }

    let mut scored = Vec::with_capacity(records.len());
    for raw in &records {
        let result = if use_store {
            processor.process(raw, date)?
        } else {
            let mut result = compute_impact_at(raw, &config, Utc::now());
            if let Some(previous) = args.previous {
                result.smoothed_score =
                    Some(apply_ema(result.adjusted_composite as f64, Some(previous)));
            }
            result
        };

        let verification_code = args
            .secret
            .map(|secret| verification_hash(secret.as_bytes(), raw, &result, date))
            .transpose()?;

        scored.push(ScoreRecord {
            result,
            verification_code,
        });
    }

    if let Some(path) = args.save_snapshots {
        fs::write(path, processor.save_snapshots()?)?;
    }

    write_output(args.output, &format_output(&scored, &args.output_format)?)
}

fn cmd_verify(
    input: &Path,
    date: Option<&str>,
    config: Option<&Path>,
    secret: &str,
) -> Result<(), ImpactCliError> {
    let config = load_config(config)?;
    let date = resolve_date(date)?;
    let raw = devimpact::pipeline::parse_stats(&read_input(input)?)?;

    let result = compute_impact_at(&raw, &config, Utc::now());
    println!("{}", verification_hash(secret.as_bytes(), &raw, &result, date)?);
    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    snapshots: Option<&Path>,
    json: bool,
) -> Result<(), ImpactCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", ENGINE_NAME, ENGINE_VERSION),
    });

    // Check configuration file if provided
    if let Some(path) = config {
        let check = match fs::read_to_string(path) {
            Ok(content) => match ScoringConfig::from_json(&content) {
                Ok(_) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: "Configuration valid".to_string(),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read config file: {}", e),
            },
        };
        checks.push(check);
    } else {
        checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using built-in defaults".to_string(),
        });
    }

    // Check snapshots file if provided
    if let Some(path) = snapshots {
        let check = if !path.exists() {
            DoctorCheck {
                name: "snapshots".to_string(),
                status: CheckStatus::Warning,
                message: "Snapshots file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(path) {
                Ok(content) => match InMemorySnapshotStore::from_json(&content) {
                    Ok(store) => DoctorCheck {
                        name: "snapshots".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Snapshots file valid ({} handles)",
                            store.handle_count()
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "snapshots".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid snapshots JSON: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "snapshots".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read snapshots file: {}", e),
                },
            }
        };
        checks.push(check);
    }

    // Check stdin is available (for piping records)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for records)".to_string(),
        }
    };
    checks.push(stdin_check);

    let secret_check = if std::env::var_os("DEVIMPACT_VERIFY_SECRET").is_some() {
        DoctorCheck {
            name: "verification_secret".to_string(),
            status: CheckStatus::Ok,
            message: "DEVIMPACT_VERIFY_SECRET is set".to_string(),
        }
    } else {
        DoctorCheck {
            name: "verification_secret".to_string(),
            status: CheckStatus::Warning,
            message: "DEVIMPACT_VERIFY_SECRET is not set; verification codes need --secret"
                .to_string(),
        }
    };
    checks.push(secret_check);

    let report = DoctorReport {
        engine: ENGINE_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("devimpact Doctor Report");
        println!("=======================");
        println!("Engine:  {}", report.engine);
        println!("Version: {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(ImpactCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), ImpactCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: raw activity stats (camelCase JSON)");
                println!();
                println!("- handle: GitHub login");
                println!("- commitsTotal, activeDays, prsMergedCount, prsMergedWeight");
                println!("- reviewsSubmittedCount, issuesClosedCount, linesAdded, linesDeleted");
                println!("- reposContributed, topRepoShare (0-1), maxCommitsIn10Min");
                println!("- totalStars, totalForks, totalWatchers, docsContributions");
                println!("- heatmapData: [{{ date: YYYY-MM-DD, count }}], oldest first");
                println!("- fetchedAt: RFC 3339 timestamp (optional)");
                println!();
                println!("Missing counters default to 0; negative values are clamped.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: impact result (camelCase JSON)");
                println!();
                println!("- handle, profileType: solo | collaborative");
                println!("- dimensions: {{ building, guarding, consistency, breadth }} (0-100)");
                println!("- archetype: Builder | Guardian | Marathoner | Polymath | Balanced | Emerging");
                println!("- classificationRule: {{ rule, dimension? }}");
                println!("- compositeScore, adjustedComposite (0-100)");
                println!("- confidence (50-100), confidencePenalties: [reason]");
                println!("- tier: Emerging | Solid | High | Elite");
                println!("- smoothedScore: 0-100 or null");
                println!("- computedAt: RFC 3339 timestamp");
                println!("- verificationCode: 8 hex chars (when a secret is supplied)");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, ImpactCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), ImpactCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn parse_json_records(input: &str) -> Result<Vec<RawActivityStats>, ComputeError> {
    if input.trim_start().starts_with('[') {
        parse_stats_array(input)
    } else {
        Ok(vec![devimpact::pipeline::parse_stats(input)?])
    }
}

fn load_config(path: Option<&Path>) -> Result<ScoringConfig, ImpactCliError> {
    match path {
        Some(path) => Ok(ScoringConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(ScoringConfig::default()),
    }
}

fn resolve_date(date: Option<&str>) -> Result<NaiveDate, ImpactCliError> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| ImpactCliError::Compute(ComputeError::DateParseError(e.to_string()))),
        None => Ok(Utc::now().date_naive()),
    }
}

fn format_output(records: &[ScoreRecord], format: &OutputFormat) -> Result<String, ImpactCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)? + "\n"),
    }
}

fn get_input_json_schema() -> String {
    let counter = serde_json::json!({ "type": "integer", "default": 0 });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "devimpact.raw_activity_stats.v1",
        "description": "Twelve months of aggregated GitHub activity",
        "type": "object",
        "required": ["handle"],
        "properties": {
            "handle": { "type": "string" },
            "displayName": { "type": "string" },
            "avatarUrl": { "type": "string" },
            "commitsTotal": counter,
            "activeDays": counter,
            "prsMergedCount": counter,
            "prsMergedWeight": { "type": "number", "default": 0 },
            "reviewsSubmittedCount": counter,
            "issuesClosedCount": counter,
            "linesAdded": counter,
            "linesDeleted": counter,
            "reposContributed": counter,
            "topRepoShare": { "type": "number", "minimum": 0, "maximum": 1, "default": 0 },
            "maxCommitsIn10Min": counter,
            "totalStars": counter,
            "totalForks": counter,
            "totalWatchers": counter,
            "docsContributions": counter,
            "heatmapData": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["date"],
                    "properties": {
                        "date": { "type": "string", "format": "date" },
                        "count": { "type": "integer" }
                    }
                }
            },
            "fetchedAt": { "type": "string", "format": "date-time" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let score = serde_json::json!({ "type": "integer", "minimum": 0, "maximum": 100 });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "devimpact.impact_result.v1",
        "description": "Developer impact profile",
        "type": "object",
        "required": [
            "handle", "profileType", "dimensions", "archetype", "compositeScore",
            "confidence", "confidencePenalties", "adjustedComposite", "tier", "computedAt"
        ],
        "properties": {
            "handle": { "type": "string" },
            "profileType": { "enum": ["solo", "collaborative"] },
            "dimensions": {
                "type": "object",
                "properties": {
                    "building": score,
                    "guarding": score,
                    "consistency": score,
                    "breadth": score
                }
            },
            "archetype": {
                "enum": ["Builder", "Guardian", "Marathoner", "Polymath", "Balanced", "Emerging"]
            },
            "classificationRule": { "type": "object" },
            "compositeScore": score,
            "confidence": { "type": "integer", "minimum": 50, "maximum": 100 },
            "confidencePenalties": { "type": "array", "items": { "type": "string" } },
            "adjustedComposite": score,
            "tier": { "enum": ["Emerging", "Solid", "High", "Elite"] },
            "smoothedScore": { "type": ["integer", "null"], "minimum": 0, "maximum": 100 },
            "computedAt": { "type": "string", "format": "date-time" },
            "verificationCode": { "type": "string", "pattern": "^[0-9a-f]{8}$" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum ImpactCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoRecords,
    DoctorFailed,
}

impl From<io::Error> for ImpactCliError {
    fn from(e: io::Error) -> Self {
        ImpactCliError::Io(e)
    }
}

impl From<ComputeError> for ImpactCliError {
    fn from(e: ComputeError) -> Self {
        ImpactCliError::Compute(e)
    }
}

impl From<serde_json::Error> for ImpactCliError {
    fn from(e: serde_json::Error) -> Self {
        ImpactCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ImpactCliError> for CliError {
    fn from(e: ImpactCliError) -> Self {
        match e {
            ImpactCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ImpactCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::ParseError(_) | ComputeError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Run 'devimpact schema input' for the expected shape",
                    ),
                    ComputeError::InvalidConfig(_) => {
                        ("CONFIG_ERROR", "Run 'devimpact doctor --config <file>'")
                    }
                    ComputeError::InvalidSecret(_) => {
                        ("SECRET_ERROR", "Set DEVIMPACT_VERIFY_SECRET or pass --secret")
                    }
                    ComputeError::DateParseError(_) => ("DATE_ERROR", "Use YYYY-MM-DD"),
                    ComputeError::EncodingError(_) => ("ENCODING_ERROR", "Retry the command"),
                    ComputeError::SnapshotError(_) => (
                        "SNAPSHOT_ERROR",
                        "Run 'devimpact doctor --snapshots <file>'",
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            ImpactCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            ImpactCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No activity records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            ImpactCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    engine: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
