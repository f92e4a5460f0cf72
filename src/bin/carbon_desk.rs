//! Carbon Desk Command Line Interface
//!
//! Drives the engine over exported JSON collections, for checking screen
//! configurations and vocabulary tables outside the dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Page 2 of NORMAL holdings, 10 per page
//! carbon_desk query --records holdings.json --kind quota_holding \
//!     --criteria criteria.yaml --page 2 --page-size 10
//!
//! # Validate a holding form draft
//! carbon_desk reconcile --draft draft.json
//!
//! # Classify status tokens
//! carbon_desk classify NORMAL 已签发 禁用 --strict
//! ```
//!
//! Exit codes: 0 success, 1 rejected draft or I/O failure, 2 configuration
//! error (unknown column, bad vocabulary, invalid settings).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use carbon_desk::{
    config::CONFIG_ENV_VAR, filter::SortDirection, reconcile, CriteriaSet, EngineConfig,
    EngineError, LedgerDraft, QueryController, Record, RecordKind, RecordSchema, SortSpec,
};

/// Exit status for a configuration defect
const EXIT_CONFIGURATION: u8 = 2;

#[derive(Parser)]
#[command(name = "carbon_desk")]
#[command(version = "0.1.0")]
#[command(about = "Filter, paginate, classify and reconcile carbon desk records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine settings file (YAML)
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "json", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter and paginate an exported record collection
    Query {
        /// JSON array of flat record objects
        #[arg(short, long)]
        records: PathBuf,

        /// Record variant: project, quota_holding, system_account, market_listing
        #[arg(short, long)]
        kind: RecordKind,

        /// YAML list of named criteria
        #[arg(short, long)]
        criteria: Option<PathBuf>,

        /// Sort column, optionally suffixed with :asc or :desc
        #[arg(long)]
        sort: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Rows per page (settings default when omitted)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Validate a quota holding draft and derive its valuation
    Reconcile {
        /// Draft JSON file (reads stdin if not provided)
        #[arg(short, long)]
        draft: Option<PathBuf>,
    },

    /// Map status tokens to canonical tiers
    Classify {
        tokens: Vec<String>,

        /// Fail on tokens outside every vocabulary
        #[arg(long)]
        strict: bool,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Query {
            records,
            kind,
            criteria,
            sort,
            page,
            page_size,
        } => cmd_query(
            &config,
            QueryArgs {
                records,
                kind,
                criteria,
                sort,
                page,
                page_size,
            },
            cli.format,
        ),
        Commands::Reconcile { draft } => cmd_reconcile(draft, cli.format),
        Commands::Classify { tokens, strict } => {
            cmd_classify(&config, &tokens, strict || config.strict_status, cli.format)
        }
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::from(exit_status(&e))
        }
    }
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::Configuration(_)) => EXIT_CONFIGURATION,
        Some(EngineError::Validation(_)) | None => 1,
    }
}

/// Tag engine failures so `main` can pick the exit status
fn engine<T, E: Into<EngineError>>(result: Result<T, E>) -> Result<T, EngineError> {
    result.map_err(Into::into)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => engine(EngineConfig::load_from_file(path))
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

struct QueryArgs {
    records: PathBuf,
    kind: RecordKind,
    criteria: Option<PathBuf>,
    sort: Option<String>,
    page: usize,
    page_size: Option<usize>,
}

fn cmd_query(config: &EngineConfig, args: QueryArgs, format: OutputFormat) -> Result<ExitCode> {
    let classifier = Arc::new(engine(config.build_classifier())?);
    let records = load_records(&args.records, args.kind)?;
    let page_size = engine(config.resolve_page_size(args.page_size))?;

    let criteria = match &args.criteria {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading criteria {}", path.display()))?;
            serde_yaml::from_str::<CriteriaSet>(&content)
                .with_context(|| format!("parsing criteria {}", path.display()))?
        }
        None => CriteriaSet::new(),
    };

    if config.strict_status {
        for record in records.iter() {
            engine(classifier.classify_strict(&record.status))
                .with_context(|| format!("record {}", record.id))?;
        }
    }

    let mut controller = engine(
        QueryController::new(args.kind, classifier, page_size, records).with_criteria(criteria),
    )?;
    if let Some(sort) = args.sort.as_deref() {
        engine(controller.on_sort_changed(Some(parse_sort(sort)?)))?;
    }
    let page = controller.on_page_requested(args.page);
    let summary = controller.summary();

    match format {
        OutputFormat::Json => {
            let rows = page.map(|record| record.to_flat_json());
            let output = serde_json::json!({ "page": rows, "summary": summary });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!(
                "{} page {}/{} ({} matching, {} per page)",
                "OK".green(),
                page.page_number,
                page.total_pages,
                page.total_count,
                page.page_size
            );
            for record in &page.items {
                println!("  {:<12} {:<10} {}", record.id, record.status, render_fields(record));
            }
            println!(
                "  total quantity: {}  valuation: {}",
                summary.total_quantity.normalize(),
                summary
                    .valuation
                    .map(|v| v.normalize().to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_reconcile(draft: Option<PathBuf>, format: OutputFormat) -> Result<ExitCode> {
    let source = read_input(draft)?;
    let draft: LedgerDraft = serde_json::from_str(&source).context("parsing draft JSON")?;

    match reconcile(&draft) {
        Ok(entry) => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entry)?),
                OutputFormat::Text => println!(
                    "{} {} total={} unallocated={}",
                    "OK".green(),
                    entry.id,
                    entry.total.normalize(),
                    entry.unallocated().normalize()
                ),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            match format {
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "field": err.field,
                        "reason": err.reason.code(),
                        "message": err.to_string(),
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => println!("{} {}", "REJECTED".red().bold(), err),
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_classify(
    config: &EngineConfig,
    tokens: &[String],
    strict: bool,
    format: OutputFormat,
) -> Result<ExitCode> {
    let classifier = engine(config.build_classifier())?;

    let mut rows = Vec::with_capacity(tokens.len());
    for token in tokens {
        let tier = if strict {
            engine(classifier.classify_strict(token))?
        } else {
            classifier.classify(token)
        };
        rows.push((token.as_str(), tier, classifier.vocabulary_of(token)));
    }

    match format {
        OutputFormat::Json => {
            let output: Vec<_> = rows
                .iter()
                .map(|(token, tier, vocabulary)| {
                    serde_json::json!({ "token": token, "tier": tier, "vocabulary": vocabulary })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            for (token, tier, vocabulary) in rows {
                println!("  {:<16} {:<9} {}", token, tier.as_str(), vocabulary.unwrap_or("-"));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// HELPERS
// =============================================================================

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn load_records(path: &Path, kind: RecordKind) -> Result<Arc<[Record]>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let rows: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

    let schema = RecordSchema::for_kind(kind);
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            schema
                .record_from_json(row)
                .with_context(|| format!("record #{} in {}", i, path.display()))
        })
        .collect()
}

fn parse_sort(raw: &str) -> Result<SortSpec> {
    let (field, direction) = match raw.split_once(':') {
        Some((field, "asc")) => (field, SortDirection::Asc),
        Some((field, "desc")) => (field, SortDirection::Desc),
        Some((_, other)) => bail!("unknown sort direction '{}'", other),
        None => (raw, SortDirection::Asc),
    };
    Ok(SortSpec {
        field: field.to_string(),
        direction,
    })
}

fn render_fields(record: &Record) -> String {
    record
        .fields
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbon_desk::{ConfigurationError, ValidationError, ValidationReason};

    #[test]
    fn configuration_errors_exit_with_their_own_status() {
        let err = anyhow::Error::from(EngineError::from(ConfigurationError::InvalidPageSize))
            .context("loading settings");
        assert_eq!(exit_status(&err), EXIT_CONFIGURATION);

        let rejected = anyhow::Error::from(EngineError::from(ValidationError {
            field: "total".to_string(),
            reason: ValidationReason::Negative,
        }));
        assert_eq!(exit_status(&rejected), 1);
        assert_eq!(exit_status(&anyhow::anyhow!("reading stdin")), 1);
    }

    #[test]
    fn sort_argument_accepts_direction_suffix() {
        let spec = parse_sort("total:desc").unwrap();
        assert_eq!(spec.field, "total");
        assert_eq!(spec.direction, SortDirection::Desc);
        assert_eq!(parse_sort("id").unwrap().direction, SortDirection::Asc);
        assert!(parse_sort("id:sideways").is_err());
    }
}
